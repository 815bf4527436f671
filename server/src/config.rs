//! Configuration management for the QR login server.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unparseable values fall back to their default.

use qrlogin_auth::{ReclaimPolicy, TicketConfig};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Ticket lifecycle configuration
    pub tickets: TicketSettings,
    /// Ticket storage configuration
    pub store: StoreConfig,
    /// Expose Prometheus metrics on `/metrics`
    pub metrics_enabled: bool,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Ticket configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSettings {
    /// Origin of the frontend serving the phone landing page
    pub frontend_origin: String,
    /// Path of the phone landing page
    pub landing_path: String,
    /// Ticket TTL in seconds (default: 6000)
    pub ttl_secs: i64,
    /// Second-claim behaviour (default: reject)
    pub reclaim_policy: ReclaimPolicy,
    /// Snowflake node id of this process, 0..=1023 (default: 1)
    pub node_id: u16,
    /// Seconds between expiry sweeps, 0 disables sweeping (default: 60)
    pub sweep_interval_secs: u64,
}

/// Where tickets are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// JSON file, shared by processes on the same host
    #[default]
    File,
    /// Process memory only
    Memory,
    /// Redis, shared by any number of processes
    Redis,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown ticket store: {other}")),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store backend
    pub kind: StoreKind,
    /// Ticket file for the `file` store
    pub path: String,
    /// Re-read the ticket file on every request
    pub reload_on_access: bool,
    /// Redis connection URL for the `redis` store
    pub redis_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            server: ServerConfig {
                host: text("QRLOGIN_HOST", "0.0.0.0"),
                port: parse_var(&lookup, "QRLOGIN_PORT").unwrap_or(8099),
            },
            tickets: TicketSettings {
                frontend_origin: text("QRLOGIN_FRONTEND_ORIGIN", "http://localhost:3000"),
                landing_path: text("QRLOGIN_LANDING_PATH", "/phone"),
                ttl_secs: parse_var(&lookup, "QRLOGIN_TICKET_TTL")
                    .filter(|secs: &i64| TicketConfig::checked_ttl(*secs).is_some())
                    .unwrap_or(TicketConfig::DEFAULT_TTL_SECS),
                reclaim_policy: parse_var(&lookup, "QRLOGIN_RECLAIM_POLICY").unwrap_or_default(),
                node_id: parse_var(&lookup, "QRLOGIN_NODE_ID").unwrap_or(1),
                sweep_interval_secs: parse_var(&lookup, "QRLOGIN_SWEEP_INTERVAL").unwrap_or(60),
            },
            store: StoreConfig {
                kind: parse_var(&lookup, "QRLOGIN_STORE").unwrap_or_default(),
                path: text("QRLOGIN_STORE_PATH", "tickets.json"),
                reload_on_access: parse_var(&lookup, "QRLOGIN_RELOAD_ON_ACCESS").unwrap_or(true),
                redis_url: text("REDIS_URL", "redis://127.0.0.1:6379"),
            },
            metrics_enabled: parse_var(&lookup, "METRICS_ENABLED").unwrap_or(false),
        }
    }

    /// `host:port` to listen on.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Ticket service configuration.
    #[must_use]
    pub fn ticket_config(&self) -> TicketConfig {
        TicketConfig::new(self.tickets.frontend_origin.clone())
            .with_landing_path(self.tickets.landing_path.clone())
            .with_ttl_secs(self.tickets.ttl_secs)
            .with_reclaim_policy(self.tickets.reclaim_policy)
    }

    /// Sweep period, `None` when sweeping is disabled.
    #[must_use]
    pub const fn sweep_interval(&self) -> Option<Duration> {
        match self.tickets.sweep_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse().ok())
}
