//! HTTP handlers for the scan-to-login endpoints.
//!
//! Lifecycle outcomes (`notfound`, `expired`, `notyet`, `claimed`) are
//! normal responses with status 200 and a `message` discriminant. Only
//! [`TicketError`]s become error statuses, through [`AppError`].

pub mod check;
pub mod login;
pub mod qrcode;

use crate::error::TicketError;
use crate::service::TicketService;
use qrlogin_web::AppError;
use std::sync::Arc;

/// State shared by the ticket handlers.
///
/// # Type Parameters
///
/// - `S`: Ticket store
/// - `G`: Ticket id generator
/// - `C`: Clock
/// - `R`: QR renderer
#[derive(Debug)]
pub struct QrLoginState<S, G, C, R> {
    /// Ticket lifecycle service, shared with the sweeper.
    pub service: Arc<TicketService<S, G, C>>,

    /// Renders the landing URL of a new ticket.
    pub renderer: R,
}

impl<S, G, C, R> QrLoginState<S, G, C, R> {
    /// Create handler state.
    #[must_use]
    pub const fn new(service: Arc<TicketService<S, G, C>>, renderer: R) -> Self {
        Self { service, renderer }
    }
}

impl From<TicketError> for AppError {
    fn from(err: TicketError) -> Self {
        match err {
            TicketError::Validation(message) => Self::bad_request(message),
            TicketError::Persistence(_) => {
                Self::unavailable("Ticket store unavailable").with_source(anyhow::Error::new(err))
            }
            TicketError::IdGeneration(_)
            | TicketError::Serialization(_)
            | TicketError::Render(_) => {
                Self::internal("An internal error occurred").with_source(anyhow::Error::new(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use qrlogin_core::id::IdError;

    #[test]
    fn test_ticket_error_statuses() {
        let cases = [
            (TicketError::Validation("uuid is required".into()), StatusCode::BAD_REQUEST),
            (TicketError::Persistence("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (TicketError::IdGeneration(IdError::Poisoned), StatusCode::INTERNAL_SERVER_ERROR),
            (TicketError::Render("too long".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_validation_message_reaches_client() {
        let err = AppError::from(TicketError::Validation("user_id is required".into()));
        assert_eq!(err.to_string(), "[BAD_REQUEST] user_id is required");
    }
}
