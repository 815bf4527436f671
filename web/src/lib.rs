//! Axum integration shared by the QR login services.
//!
//! This crate holds the HTTP plumbing that is independent of tickets:
//!
//! - [`AppError`]: error type that renders as a JSON response
//! - [`ClientIp`] and [`CorrelationId`] extractors
//! - The correlation-id middleware layer
//! - Liveness endpoint
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives; the correlation layer tags it
//! 2. **Extract data** from request (JSON, client address)
//! 3. **Call the service** with domain types
//! 4. **Map result** to HTTP response (outcomes → 200, failures → [`AppError`])
//!
//! # Example
//!
//! ```ignore
//! use qrlogin_web::{correlation_id_layer, handlers::health_check};
//! use axum::{Router, routing::get};
//!
//! let app = Router::new()
//!     .route("/health", get(health_check))
//!     .layer(correlation_id_layer());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ClientIp, CorrelationId};
pub use middleware::{correlation_id_layer, CorrelationIdExt, CORRELATION_ID_HEADER};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
