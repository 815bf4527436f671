//! Results of the ticket lifecycle operations.

use crate::constants::messages;
use crate::state::{TicketId, UserId};

/// A freshly issued ticket, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTicket {
    /// Ticket identifier.
    pub id: TicketId,

    /// URL to encode in the QR code.
    pub url: String,
}

/// Outcome of a claim (phone side).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The ticket now belongs to the caller.
    Success,

    /// No live ticket with that id.
    NotFound,

    /// The ticket outlived its TTL and was removed.
    Expired,

    /// Another user claimed the ticket first.
    AlreadyClaimed,
}

impl ClaimOutcome {
    /// `true` only for [`ClaimOutcome::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Client-facing discriminant.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Success => messages::SUCCESS,
            Self::NotFound => messages::NOT_FOUND,
            Self::Expired => messages::EXPIRED,
            Self::AlreadyClaimed => messages::CLAIMED,
        }
    }
}

/// Outcome of a poll (desktop side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The ticket was claimed; it has been consumed and is gone.
    Success(UserId),

    /// Still pending; poll again.
    NotYet,

    /// No live ticket with that id (never issued, consumed, or swept).
    NotFound,

    /// The ticket outlived its TTL and was removed.
    Expired,
}

impl PollOutcome {
    /// `true` only for [`PollOutcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Claimed user id, if the poll succeeded.
    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Success(user) => Some(user),
            _ => None,
        }
    }

    /// Client-facing discriminant.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Success(_) => messages::SUCCESS,
            Self::NotYet => messages::NOT_YET,
            Self::NotFound => messages::NOT_FOUND,
            Self::Expired => messages::EXPIRED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_messages() {
        assert_eq!(PollOutcome::Success("u".into()).message(), "success");
        assert_eq!(PollOutcome::NotYet.message(), "notyet");
        assert_eq!(PollOutcome::NotFound.user_id(), None);
    }

    #[test]
    fn test_claim_messages() {
        assert!(ClaimOutcome::Success.is_success());
        assert_eq!(ClaimOutcome::AlreadyClaimed.message(), "claimed");
        assert!(!ClaimOutcome::Expired.is_success());
    }
}
