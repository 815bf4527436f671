//! Custom Axum extractors.
//!
//! This module contains custom extractors for common HTTP patterns:
//! - `CorrelationId`: Extract or generate request correlation IDs
//! - `ClientIp`: Extract client IP address from headers or connection
//!
//! # Examples
//!
//! ```ignore
//! use qrlogin_web::extractors::{ClientIp, CorrelationId};
//!
//! async fn handler(correlation_id: CorrelationId, client_ip: ClientIp) -> String {
//!     tracing::info!(
//!         correlation_id = %correlation_id.0,
//!         client_ip = %client_ip.0,
//!         "Processing request"
//!     );
//!     client_ip.0.to_string()
//! }
//! ```

use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    async_trait,
    extract::{connect_info::ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Uses the ID assigned by [`correlation_id_layer`](crate::correlation_id_layer)
/// when it is installed, then the `X-Correlation-ID` header, and generates a
/// new UUID v4 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Uuid>() {
            return Ok(Self(*id));
        }

        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Client IP address.
///
/// # Priority
///
/// 1. `X-Forwarded-For` (first IP in the list)
/// 2. `X-Real-IP`
/// 3. Socket peer address, when the server runs with
///    `into_make_service_with_connect_info::<SocketAddr>()`
/// 4. `127.0.0.1`
///
/// # Example
///
/// ```ignore
/// async fn handler(client_ip: ClientIp) -> String {
///     format!("Client IP: {}", client_ip.0)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = extract_client_ip(&parts.headers, parts.extensions.get());

        Ok(Self(ip))
    }
}

/// Extract client IP from headers or connection info.
fn extract_client_ip(headers: &HeaderMap, connect_info: Option<&ConnectInfo<SocketAddr>>) -> IpAddr {
    // Try X-Forwarded-For (take first IP)
    let forwarded = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());
    if let Some(ip) = forwarded {
        return ip;
    }

    // Try X-Real-IP
    let real_ip = headers
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());
    if let Some(ip) = real_ip {
        return ip;
    }

    connect_info.map_or(IpAddr::V4(Ipv4Addr::LOCALHOST), |ConnectInfo(addr)| addr.ip())
}
