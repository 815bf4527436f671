//! Ticket providers.
//!
//! This module defines traits for all external dependencies used by the
//! ticket service. These traits enable dependency injection and make the
//! lifecycle logic testable.
//!
//! # Architecture
//!
//! Providers are **interfaces**, not implementations. The service depends
//! on these traits, and the application wires concrete implementations.
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │ TicketService    │────▶│ TicketStore      │  Table (file / memory), Redis
//! └────────┬─────────┘     └────────┬─────────┘
//!          │                        │ (table store only)
//!          ▼                        ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │ QrRenderer       │     │ TicketBackend    │  JSON file, no-op
//! │ (HTTP layer)     │     └──────────────────┘
//! └──────────────────┘
//! ```
//!
//! This enables:
//! - **Testing**: Use mocks (in-memory, deterministic, failure injection)
//! - **Production**: Use real services (JSON file, Redis, PNG rendering)

pub mod qr_png;
pub mod renderer;
pub mod ticket_backend;
pub mod ticket_store;

// Re-export provider traits
pub use qr_png::PngQrRenderer;
pub use renderer::QrRenderer;
pub use ticket_backend::TicketBackend;
pub use ticket_store::{Assignment, Consumption, TicketStore};
