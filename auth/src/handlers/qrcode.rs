//! QR code issuing handler (desktop side).

use super::QrLoginState;
use crate::constants::TICKET_ID_HEADER;
use crate::providers::{QrRenderer, TicketStore};
use axum::{
    extract::State,
    http::{
        header::{ACCESS_CONTROL_EXPOSE_HEADERS, CACHE_CONTROL, CONTENT_TYPE},
        HeaderName, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use qrlogin_core::environment::Clock;
use qrlogin_core::id::IdGenerator;
use qrlogin_web::{AppError, ClientIp, CorrelationId};
use std::sync::Arc;

/// Issue a ticket and return its QR code.
///
/// # Endpoint
///
/// ```text
/// GET /getqrcode
/// ```
///
/// # Response
///
/// ```text
/// 200 OK
/// Content-Type: image/png
/// uuid: 1849362044583964672
/// Access-Control-Expose-Headers: uuid
///
/// <PNG bytes>
/// ```
///
/// The desktop reads the ticket id from the `uuid` header and starts
/// polling `/checkuuid` with it.
///
/// # Errors
///
/// Returns 500 if no id can be generated or the image cannot be rendered,
/// 503 if the ticket store rejects the new ticket.
pub async fn issue_qr_code<S, G, C, R>(
    State(state): State<Arc<QrLoginState<S, G, C, R>>>,
    correlation_id: CorrelationId,
    client_ip: ClientIp,
) -> Result<Response, AppError>
where
    S: TicketStore + 'static,
    G: IdGenerator + 'static,
    C: Clock + 'static,
    R: QrRenderer + 'static,
{
    let requester = client_ip.0.to_string();
    let issued = state.service.issue(&requester).await?;
    let image = state.renderer.render(&issued.url)?;

    tracing::debug!(
        correlation_id = %correlation_id.0,
        ticket_id = %issued.id,
        bytes = image.len(),
        "Rendered login QR code"
    );

    let ticket_header = HeaderValue::from_str(issued.id.as_str())
        .map_err(|e| AppError::internal(format!("Ticket id is not a valid header value: {e}")))?;

    let mut response = (StatusCode::OK, image).into_response();
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static(state.renderer.content_type()),
    );
    headers.insert(HeaderName::from_static(TICKET_ID_HEADER), ticket_header);
    headers.insert(
        ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(TICKET_ID_HEADER),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    Ok(response)
}
