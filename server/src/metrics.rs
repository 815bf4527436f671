//! Prometheus exporter for the ticket counters.
//!
//! The ticket service records through the `metrics` facade. Installing the
//! recorder here makes those counters scrapeable on `/metrics`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

/// Errors from metrics setup.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// A recorder is already installed in this process
    #[error("Metrics recorder already installed")]
    AlreadyInstalled,
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Install the global Prometheus recorder and describe the ticket counters.
///
/// # Errors
///
/// Returns [`MetricsError::AlreadyInstalled`] if another recorder is
/// installed, [`MetricsError::Install`] for any other exporter failure.
pub fn install_prometheus() -> Result<PrometheusHandle, MetricsError> {
    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        let message = e.to_string();
        if message.contains("already initialized") {
            MetricsError::AlreadyInstalled
        } else {
            MetricsError::Install(message)
        }
    })?;

    // Descriptions only attach once a recorder exists.
    qrlogin_auth::metrics::register_metrics();

    tracing::info!("Prometheus recorder installed");
    Ok(handle)
}
