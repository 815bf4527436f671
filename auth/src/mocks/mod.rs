//! Mock provider implementations for testing.
//!
//! This module provides simple, in-memory implementations of the provider
//! traits for use in unit and integration tests.

pub mod renderer;
pub mod ticket_backend;

pub use renderer::MockQrRenderer;
pub use ticket_backend::MockTicketBackend;
