//! Ticket constants.
//!
//! This module contains constant values shared by the service, the stores and
//! the HTTP layer.

/// `message` values reported to clients.
pub mod messages {
    /// The operation completed.
    pub const SUCCESS: &str = "success";

    /// No live ticket with that id.
    pub const NOT_FOUND: &str = "notfound";

    /// The ticket outlived its TTL and has been removed.
    pub const EXPIRED: &str = "expired";

    /// The ticket exists but nobody has claimed it yet.
    pub const NOT_YET: &str = "notyet";

    /// Another user already claimed the ticket.
    pub const CLAIMED: &str = "claimed";
}

/// Response header carrying the id of a freshly issued ticket.
pub const TICKET_ID_HEADER: &str = "uuid";

/// Redis key prefix for tickets.
///
/// Full key format: `qrlogin:ticket:{id}`.
pub const REDIS_KEY_PREFIX: &str = "qrlogin:ticket:";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constants() {
        assert_eq!(messages::SUCCESS, "success");
        assert_eq!(messages::NOT_FOUND, "notfound");
        assert_eq!(messages::EXPIRED, "expired");
        assert_eq!(messages::NOT_YET, "notyet");
    }

    #[test]
    fn test_redis_key_format() {
        let key = format!("{REDIS_KEY_PREFIX}{}", "42");
        assert_eq!(key, "qrlogin:ticket:42");
    }
}
