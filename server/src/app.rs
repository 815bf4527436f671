//! Router assembly and the serve loop.

use crate::config::Config;
use axum::{
    http::{header, HeaderName, Method},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use qrlogin_auth::constants::TICKET_ID_HEADER;
use qrlogin_auth::providers::{PngQrRenderer, QrRenderer, TicketStore};
use qrlogin_auth::{qr_login_router, spawn_sweeper, QrLoginState, TicketService};
use qrlogin_core::environment::{Clock, SystemClock};
use qrlogin_core::id::{IdGenerator, SnowflakeIdGenerator};
use qrlogin_web::{correlation_id_layer, handlers::health_check};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Production handler state.
pub type ServerState<S> = QrLoginState<S, SnowflakeIdGenerator, SystemClock, PngQrRenderer>;

/// CORS policy for the desktop and phone pages.
///
/// Any origin may call the API, and the `uuid` header of `/getqrcode` is
/// readable by browser scripts.
#[must_use]
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([HeaderName::from_static(TICKET_ID_HEADER)])
}

/// Build the complete application router.
///
/// # Routes
///
/// - `GET /getqrcode`, `POST /checkuuid`, `POST /login` - ticket endpoints
/// - `GET /health` - liveness probe
/// - `GET /metrics` - Prometheus scrape endpoint, only with a handle
pub fn build_router<S, G, C, R>(
    state: Arc<QrLoginState<S, G, C, R>>,
    metrics: Option<PrometheusHandle>,
) -> Router
where
    S: TicketStore + 'static,
    G: IdGenerator + 'static,
    C: Clock + 'static,
    R: QrRenderer + 'static,
{
    let mut app = Router::new()
        .merge(qr_login_router(state))
        .route("/health", get(health_check));

    if let Some(handle) = metrics {
        app = app.route("/metrics", get(move || async move { handle.render() }));
    }

    app.layer(correlation_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// Serve the ticket API over `store` until SIGINT or SIGTERM.
///
/// Also runs the expiry sweeper when the configuration enables it, and
/// stops it after the listener has drained.
///
/// # Errors
///
/// Returns an error if the node id is out of range, or the listener cannot
/// bind or fails while serving.
pub async fn serve<S>(
    config: Config,
    store: S,
    metrics: Option<PrometheusHandle>,
) -> anyhow::Result<()>
where
    S: TicketStore + 'static,
{
    let ids = SnowflakeIdGenerator::new(config.tickets.node_id, Arc::new(SystemClock))?;
    let service = Arc::new(TicketService::new(store, ids, SystemClock, config.ticket_config()));

    let (shutdown_tx, _) = broadcast::channel(1);
    let sweeper = config
        .sweep_interval()
        .map(|interval| spawn_sweeper(Arc::clone(&service), interval, shutdown_tx.subscribe()));

    let state: Arc<ServerState<S>> = Arc::new(QrLoginState::new(service, PngQrRenderer::new()));

    let app = build_router(state, metrics);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "QR login server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    let _ = shutdown_tx.send(());
    if let Some(handle) = sweeper {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Ticket sweeper did not stop cleanly");
        }
    }

    info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl+C (SIGINT) or SIGTERM.
///
/// A handler that cannot be installed is logged and treated as a signal
/// that never arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
