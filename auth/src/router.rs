//! Scan-to-login router composition.

use crate::handlers::{check, login, qrcode, QrLoginState};
use crate::providers::{QrRenderer, TicketStore};
use axum::{
    routing::{get, post},
    Router,
};
use qrlogin_core::environment::Clock;
use qrlogin_core::id::IdGenerator;
use std::sync::Arc;

/// Create the router with the three ticket endpoints.
///
/// # Routes
///
/// - `GET /getqrcode` - Issue a ticket, respond with its QR code
/// - `POST /checkuuid` - Poll a ticket (desktop)
/// - `POST /login` - Claim a ticket (phone)
///
/// # Example
///
/// ```rust,ignore
/// let state = Arc::new(QrLoginState::new(Arc::new(service), PngQrRenderer::new()));
///
/// let app = Router::new()
///     .merge(qr_login_router(state))
///     .layer(TraceLayer::new_for_http());
/// ```
pub fn qr_login_router<S, G, C, R>(state: Arc<QrLoginState<S, G, C, R>>) -> Router
where
    S: TicketStore + 'static,
    G: IdGenerator + 'static,
    C: Clock + 'static,
    R: QrRenderer + 'static,
{
    Router::new()
        .route("/getqrcode", get(qrcode::issue_qr_code::<S, G, C, R>))
        .route("/checkuuid", post(check::check_ticket::<S, G, C, R>))
        .route("/login", post(login::claim_ticket::<S, G, C, R>))
        .with_state(state)
}
