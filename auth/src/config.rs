//! Ticket service configuration.
//!
//! Configuration values should be provided by the application, not hardcoded.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What a second claim on an already-claimed ticket does.
///
/// A repeated claim by the *same* user always succeeds without changing
/// anything; the policy only decides the case of a *different* user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReclaimPolicy {
    /// Keep the first claimant and report `claimed`.
    #[default]
    Reject,

    /// Replace the claimant (legacy behaviour).
    Overwrite,
}

impl ReclaimPolicy {
    /// Wire name of the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Overwrite => "overwrite",
        }
    }
}

impl FromStr for ReclaimPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(format!("unknown reclaim policy: {other}")),
        }
    }
}

/// Scan-to-login ticket configuration.
#[derive(Debug, Clone)]
pub struct TicketConfig {
    /// Origin of the frontend that serves the phone landing page
    /// (e.g., "http://192.168.100.100:3000").
    ///
    /// QR codes encode: `{frontend_origin}{landing_path}?uuid={id}&ip={address}`
    pub frontend_origin: String,

    /// Path of the phone landing page.
    ///
    /// Default: `/phone`
    pub landing_path: String,

    /// Ticket time-to-live.
    ///
    /// Default: 6000 seconds
    pub ttl: Duration,

    /// Second-claim behaviour.
    ///
    /// Default: [`ReclaimPolicy::Reject`]
    pub reclaim_policy: ReclaimPolicy,
}

impl TicketConfig {
    /// Default ticket time-to-live in seconds.
    pub const DEFAULT_TTL_SECS: i64 = 6000;

    /// Create new ticket configuration.
    ///
    /// # Arguments
    ///
    /// * `frontend_origin` - Origin of the phone landing page (e.g., "https://app.example.com")
    #[must_use]
    pub fn new(frontend_origin: String) -> Self {
        Self {
            frontend_origin,
            ..Self::default()
        }
    }

    /// Set ticket time-to-live.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set ticket time-to-live in whole seconds.
    ///
    /// Values beyond what [`Duration`] can hold saturate to its bounds.
    #[must_use]
    pub const fn with_ttl_secs(self, secs: i64) -> Self {
        let ttl = match Duration::try_seconds(secs) {
            Some(ttl) => ttl,
            None if secs < 0 => Duration::MIN,
            None => Duration::MAX,
        };
        self.with_ttl(ttl)
    }

    /// A usable TTL of `secs` seconds: positive and representable.
    #[must_use]
    pub const fn checked_ttl(secs: i64) -> Option<Duration> {
        if secs <= 0 {
            return None;
        }
        Duration::try_seconds(secs)
    }

    /// Set the landing page path.
    #[must_use]
    pub fn with_landing_path(mut self, path: impl Into<String>) -> Self {
        self.landing_path = path.into();
        self
    }

    /// Set the second-claim behaviour.
    #[must_use]
    pub const fn with_reclaim_policy(mut self, policy: ReclaimPolicy) -> Self {
        self.reclaim_policy = policy;
        self
    }

    /// URL encoded into the QR code for a ticket.
    ///
    /// ```
    /// # use qrlogin_auth::config::TicketConfig;
    /// let config = TicketConfig::new("http://192.168.1.5:3000/".to_string());
    /// assert_eq!(
    ///     config.landing_url("42", "10.0.0.7"),
    ///     "http://192.168.1.5:3000/phone?uuid=42&ip=10.0.0.7"
    /// );
    /// ```
    #[must_use]
    pub fn landing_url(&self, ticket_id: &str, requester_address: &str) -> String {
        let origin = self.frontend_origin.trim_end_matches('/');
        let path = self.landing_path.trim_start_matches('/');
        let query = serde_urlencoded::to_string([("uuid", ticket_id), ("ip", requester_address)])
            .unwrap_or_else(|_| format!("uuid={ticket_id}"));

        format!("{origin}/{path}?{query}")
    }
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            frontend_origin: "http://localhost:3000".to_string(),
            landing_path: "/phone".to_string(),
            ttl: Duration::seconds(Self::DEFAULT_TTL_SECS),
            reclaim_policy: ReclaimPolicy::Reject,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_config_builder() {
        let config = TicketConfig::new("https://example.com".to_string())
            .with_ttl_secs(10)
            .with_landing_path("/scan")
            .with_reclaim_policy(ReclaimPolicy::Overwrite);

        assert_eq!(config.frontend_origin, "https://example.com");
        assert_eq!(config.ttl, Duration::seconds(10));
        assert_eq!(config.landing_path, "/scan");
        assert_eq!(config.reclaim_policy, ReclaimPolicy::Overwrite);
    }

    #[test]
    fn test_ttl_secs_saturates_instead_of_panicking() {
        let huge = TicketConfig::default().with_ttl_secs(i64::MAX);
        let tiny = TicketConfig::default().with_ttl_secs(i64::MIN);

        assert_eq!(huge.ttl, Duration::MAX);
        assert_eq!(tiny.ttl, Duration::MIN);
    }

    #[test]
    fn test_checked_ttl() {
        assert_eq!(TicketConfig::checked_ttl(10), Some(Duration::seconds(10)));
        assert_eq!(TicketConfig::checked_ttl(0), None);
        assert_eq!(TicketConfig::checked_ttl(-5), None);
        assert_eq!(TicketConfig::checked_ttl(i64::MAX), None);
    }

    #[test]
    fn test_default_config() {
        let config = TicketConfig::default();
        assert_eq!(config.frontend_origin, "http://localhost:3000");
        assert_eq!(config.ttl.num_seconds(), 6000);
        assert_eq!(config.reclaim_policy, ReclaimPolicy::Reject);
    }

    #[test]
    fn test_landing_url_encodes_query() {
        let config = TicketConfig::default();
        assert_eq!(
            config.landing_url("7", "::1"),
            "http://localhost:3000/phone?uuid=7&ip=%3A%3A1"
        );
    }

    #[test]
    fn test_reclaim_policy_parse() {
        assert_eq!("Overwrite".parse::<ReclaimPolicy>().unwrap(), ReclaimPolicy::Overwrite);
        assert_eq!(" reject ".parse::<ReclaimPolicy>().unwrap(), ReclaimPolicy::Reject);
        assert!("maybe".parse::<ReclaimPolicy>().is_err());
    }
}
