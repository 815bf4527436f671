//! Ticket claim handler (phone side).

use super::QrLoginState;
use crate::outcome::ClaimOutcome;
use crate::providers::TicketStore;
use crate::state::{TicketId, UserId};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use qrlogin_core::environment::Clock;
use qrlogin_core::id::IdGenerator;
use qrlogin_web::{AppError, ClientIp};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request to claim a ticket.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClaimTicketRequest {
    /// Ticket id read from the QR code.
    #[serde(default)]
    pub uuid: String,

    /// User signed in on the phone.
    #[serde(default)]
    pub user_id: String,
}

/// Claim result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClaimTicketResponse {
    /// `true` if the ticket now belongs to the caller.
    pub success: bool,

    /// `success`, `notfound`, `expired` or `claimed`.
    pub message: String,
}

impl From<ClaimOutcome> for ClaimTicketResponse {
    fn from(outcome: ClaimOutcome) -> Self {
        Self {
            success: outcome.is_success(),
            message: outcome.message().to_string(),
        }
    }
}

/// Claim a ticket for the signed-in user.
///
/// # Endpoint
///
/// ```text
/// POST /login
/// Content-Type: application/json
///
/// { "uuid": "1849362044583964672", "user_id": "user42" }
/// ```
///
/// # Response
///
/// ```json
/// { "success": true, "message": "success" }
/// ```
///
/// # Errors
///
/// Returns 400 for a malformed body or an empty `uuid`/`user_id`, 503 if the
/// ticket store is unavailable.
pub async fn claim_ticket<S, G, C, R>(
    State(state): State<Arc<QrLoginState<S, G, C, R>>>,
    client_ip: ClientIp,
    payload: Result<Json<ClaimTicketRequest>, JsonRejection>,
) -> Result<Json<ClaimTicketResponse>, AppError>
where
    S: TicketStore + 'static,
    G: IdGenerator + 'static,
    C: Clock + 'static,
    R: Send + Sync + 'static,
{
    let Json(request) = payload?;

    tracing::debug!(
        ticket_id = %request.uuid,
        phone = %client_ip.0,
        "Claim requested"
    );

    let outcome = state
        .service
        .claim(&TicketId(request.uuid), &UserId(request.user_id))
        .await?;

    Ok(Json(outcome.into()))
}
