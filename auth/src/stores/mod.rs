//! Storage implementations for the ticket table.
//!
//! - **Table store** - whole-table store over a [`TicketBackend`](crate::providers::TicketBackend),
//!   in memory or mirrored to a JSON file
//! - **Ticket store** (Redis) - one key per ticket with atomic claim and consumption

pub mod json_file;
pub mod table;
pub mod ticket_redis;

// Re-exports
pub use json_file::JsonFileBackend;
pub use table::{NoopBackend, TableTicketStore};
pub use ticket_redis::RedisTicketStore;
