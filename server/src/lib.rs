//! # QR Login Server
//!
//! Wires the ticket service to HTTP: configuration from the environment,
//! store selection, the Prometheus exporter and the axum serve loop.
//!
//! The binary in `main.rs` is a thin shell around [`app::serve`]; everything
//! it uses lives here so the router can be exercised in tests without a
//! listening socket.

pub mod app;
pub mod config;
pub mod metrics;

pub use app::{build_router, cors_layer, serve};
pub use config::{Config, StoreKind};
pub use metrics::{install_prometheus, MetricsError};
