//! QR login HTTP server.

use qrlogin_auth::stores::{JsonFileBackend, RedisTicketStore, TableTicketStore};
use qrlogin_server::{install_prometheus, serve, Config, MetricsError, StoreKind};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal outside development.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,qrlogin=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let config = Config::from_env();
    info!(
        address = %config.bind_address(),
        store = ?config.store.kind,
        ttl_secs = config.tickets.ttl_secs,
        reclaim_policy = config.tickets.reclaim_policy.as_str(),
        "Configuration loaded"
    );

    let metrics = if config.metrics_enabled {
        match install_prometheus() {
            Ok(handle) => Some(handle),
            Err(MetricsError::AlreadyInstalled) => {
                warn!("Metrics recorder already installed, /metrics disabled");
                None
            }
            Err(e) => return Err(e.into()),
        }
    } else {
        None
    };

    match config.store.kind {
        StoreKind::File => {
            let backend = JsonFileBackend::new(&config.store.path);
            let store = TableTicketStore::open(backend)
                .await
                .with_reload_on_access(config.store.reload_on_access);
            serve(config, store, metrics).await
        }
        StoreKind::Memory => serve(config, TableTicketStore::in_memory(), metrics).await,
        StoreKind::Redis => {
            let store = RedisTicketStore::new(&config.store.redis_url).await?;
            info!("Connected to Redis ticket store");
            serve(config, store, metrics).await
        }
    }
}
