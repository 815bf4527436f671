//! Error types for ticket operations.
//!
//! Lifecycle outcomes such as "not found", "expired" or "not yet claimed"
//! are not errors: they are returned as [`ClaimOutcome`](crate::ClaimOutcome)
//! and [`PollOutcome`](crate::PollOutcome) values because clients hit them
//! on every polling round. `TicketError` is reserved for genuine failures.

use qrlogin_core::id::IdError;
use thiserror::Error;

/// Result type alias for ticket operations.
pub type Result<T> = std::result::Result<T, TicketError>;

/// Failures of the ticket subsystem.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TicketError {
    /// Request rejected before reaching the lifecycle (empty id, empty user).
    #[error("Invalid request: {0}")]
    Validation(String),

    /// No identifier could be generated; fatal for the issuing call.
    #[error("Failed to generate ticket id: {0}")]
    IdGeneration(#[from] IdError),

    /// The durable store is unreachable or rejected the operation.
    #[error("Ticket store error: {0}")]
    Persistence(String),

    /// A ticket could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The QR image could not be produced.
    #[error("Failed to render QR code: {0}")]
    Render(String),
}

impl TicketError {
    /// Returns `true` if this error is due to invalid client input.
    ///
    /// # Examples
    ///
    /// ```
    /// # use qrlogin_auth::TicketError;
    /// assert!(TicketError::Validation("uuid is required".into()).is_user_error());
    /// assert!(!TicketError::Persistence("down".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns `true` if retrying later may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

impl From<serde_json::Error> for TicketError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
