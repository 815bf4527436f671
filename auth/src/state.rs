//! Ticket state types.
//!
//! A [`Ticket`] is the only entity in the system. Its lifecycle state
//! ([`TicketStatus`]) is never stored: it is derived from the ticket's fields
//! and the current time every time someone looks at it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Unique, time-ordered ticket identifier.
///
/// Generated by an [`IdGenerator`](qrlogin_core::id::IdGenerator); the QR
/// code and every request from the clients carry it as the `uuid` field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub String);

impl TicketId {
    /// Wrap an identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for the empty identifier, which never names a ticket.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TicketId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Opaque identifier of the user who claimed a ticket.
///
/// Supplied by the mobile client; this crate never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Wrap a user identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Ticket
// ═══════════════════════════════════════════════════════════════════════

/// Logical ticket state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStatus {
    /// Issued, waiting for a phone to claim it.
    Pending,

    /// Claimed by a user, waiting for the desktop to poll it.
    Claimed,

    /// Older than the TTL, whatever its user id.
    Expired,
}

/// A scan-to-login ticket.
///
/// The serialized form keeps the field names of the legacy `UUID.json`
/// table so existing files load unchanged:
///
/// ```json
/// { "uuid": "1849…", "ip": "10.0.0.7", "user_id": "", "generate_time": 1735689600 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket identifier.
    #[serde(rename = "uuid")]
    pub id: TicketId,

    /// Address of the desktop client that requested the ticket.
    #[serde(rename = "ip")]
    pub requester_address: String,

    /// User who claimed the ticket; `None` while pending.
    #[serde(default, with = "empty_user")]
    pub user_id: Option<UserId>,

    /// Issue time, whole seconds.
    #[serde(rename = "generate_time", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,
}

impl Ticket {
    /// Create a pending ticket issued at `now` (truncated to seconds).
    #[must_use]
    pub fn new(id: TicketId, requester_address: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            requester_address: requester_address.into(),
            user_id: None,
            issued_at: truncate_to_seconds(now),
        }
    }

    /// Whole seconds elapsed since issue.
    #[must_use]
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp() - self.issued_at.timestamp()
    }

    /// `true` once the age is strictly greater than `ttl`.
    ///
    /// A ticket issued at `T` with a 10 second TTL is still live at `T+10`
    /// and expired at `T+11`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age_secs(now) > ttl.num_seconds()
    }

    /// Derive the lifecycle state at `now`.
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>, ttl: Duration) -> TicketStatus {
        if self.is_expired(now, ttl) {
            TicketStatus::Expired
        } else if self.user_id.is_some() {
            TicketStatus::Claimed
        } else {
            TicketStatus::Pending
        }
    }
}

fn truncate_to_seconds(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at)
}

/// `Option<UserId>` encoded as a plain string, `""` meaning unclaimed.
mod empty_user {
    use super::UserId;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(user: &Option<UserId>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(user.as_ref().map_or("", UserId::as_str))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<UserId>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.filter(|s| !s.is_empty()).map(UserId))
    }
}
