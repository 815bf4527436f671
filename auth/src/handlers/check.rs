//! Ticket polling handler (desktop side).

use super::QrLoginState;
use crate::outcome::PollOutcome;
use crate::providers::TicketStore;
use crate::state::TicketId;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use qrlogin_core::environment::Clock;
use qrlogin_core::id::IdGenerator;
use qrlogin_web::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request to poll a ticket.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CheckTicketRequest {
    /// Ticket id from the `uuid` header of `/getqrcode`.
    #[serde(default)]
    pub uuid: String,
}

/// Poll result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CheckTicketResponse {
    /// `true` once the ticket has been claimed (and is now consumed).
    pub success: bool,

    /// Claiming user, empty unless `success`.
    pub user_id: String,

    /// `success`, `notyet`, `notfound` or `expired`.
    pub message: String,
}

impl From<PollOutcome> for CheckTicketResponse {
    fn from(outcome: PollOutcome) -> Self {
        Self {
            success: outcome.is_success(),
            message: outcome.message().to_string(),
            user_id: match outcome {
                PollOutcome::Success(user) => user.0,
                _ => String::new(),
            },
        }
    }
}

/// Poll a ticket.
///
/// # Endpoint
///
/// ```text
/// POST /checkuuid
/// Content-Type: application/json
///
/// { "uuid": "1849362044583964672" }
/// ```
///
/// # Response
///
/// ```json
/// { "success": true, "user_id": "user42", "message": "success" }
/// ```
///
/// # Errors
///
/// Returns 400 for a malformed body or empty `uuid`, 503 if the ticket
/// store is unavailable.
pub async fn check_ticket<S, G, C, R>(
    State(state): State<Arc<QrLoginState<S, G, C, R>>>,
    payload: Result<Json<CheckTicketRequest>, JsonRejection>,
) -> Result<Json<CheckTicketResponse>, AppError>
where
    S: TicketStore + 'static,
    G: IdGenerator + 'static,
    C: Clock + 'static,
    R: Send + Sync + 'static,
{
    let Json(request) = payload?;

    let outcome = state.service.poll(&TicketId(request.uuid)).await?;

    Ok(Json(outcome.into()))
}
