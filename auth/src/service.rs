//! Scan-to-login ticket service.
//!
//! Drives the ticket lifecycle:
//!
//! ```text
//! issue ──► PENDING ──claim──► CLAIMED ──poll──► (consumed)
//!              │                  │
//!              └──── age > ttl ───┴──► expired (deleted on first look)
//! ```
//!
//! Expiry is evaluated lazily: whichever request first sees an expired
//! ticket deletes it and reports `expired`; later requests see `notfound`.

use crate::config::TicketConfig;
use crate::error::{Result, TicketError};
use crate::metrics::{CLAIMS, POLLS, TICKETS_ISSUED, TICKETS_SWEPT, counter};
use crate::outcome::{ClaimOutcome, IssuedTicket, PollOutcome};
use crate::providers::{Assignment, Consumption, TicketStore};
use crate::state::{Ticket, TicketId, UserId};
use qrlogin_core::environment::Clock;
use qrlogin_core::id::IdGenerator;

/// Ticket lifecycle service.
///
/// # Type Parameters
///
/// - `S`: Ticket store
/// - `G`: Ticket id generator
/// - `C`: Clock
///
/// # Example
///
/// ```
/// use qrlogin_auth::{ClaimOutcome, PollOutcome, TicketConfig, TicketService};
/// use qrlogin_auth::stores::TableTicketStore;
/// use qrlogin_core::environment::SystemClock;
/// use qrlogin_core::id::SnowflakeIdGenerator;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let service = TicketService::new(
///     TableTicketStore::in_memory(),
///     SnowflakeIdGenerator::new(1, Arc::new(SystemClock)).unwrap(),
///     SystemClock,
///     TicketConfig::default(),
/// );
///
/// let issued = service.issue("10.0.0.7").await.unwrap();
/// assert_eq!(service.poll(&issued.id).await.unwrap(), PollOutcome::NotYet);
///
/// let claim = service.claim(&issued.id, &"user42".into()).await.unwrap();
/// assert_eq!(claim, ClaimOutcome::Success);
/// assert_eq!(
///     service.poll(&issued.id).await.unwrap(),
///     PollOutcome::Success("user42".into())
/// );
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TicketService<S, G, C> {
    store: S,
    ids: G,
    clock: C,
    config: TicketConfig,
}

impl<S, G, C> TicketService<S, G, C>
where
    S: TicketStore,
    G: IdGenerator,
    C: Clock,
{
    /// Create a new ticket service.
    #[must_use]
    pub const fn new(store: S, ids: G, clock: C, config: TicketConfig) -> Self {
        Self {
            store,
            ids,
            clock,
            config,
        }
    }

    /// Service configuration.
    #[must_use]
    pub const fn config(&self) -> &TicketConfig {
        &self.config
    }

    /// Underlying ticket store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Issue a new ticket for the desktop at `requester_address`.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::IdGeneration`] if no id could be generated,
    /// or [`TicketError::Persistence`] if the store rejects the ticket.
    pub async fn issue(&self, requester_address: &str) -> Result<IssuedTicket> {
        let id = self.ids.next_id().map_err(|e| {
            tracing::error!(error = %e, "Failed to generate ticket id");
            TicketError::from(e)
        })?;
        let id = TicketId(id);

        let now = self.clock.now();
        let ticket = Ticket::new(id.clone(), requester_address, now);
        self.store.insert(ticket, now, self.config.ttl).await?;

        counter!(TICKETS_ISSUED).increment(1);
        tracing::info!(
            ticket_id = %id,
            requester = %requester_address,
            "Issued login ticket"
        );

        let url = self.config.landing_url(id.as_str(), requester_address);
        Ok(IssuedTicket { id, url })
    }

    /// Claim a ticket on behalf of `user_id` (phone side).
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Validation`] if either id is empty, or a
    /// store error.
    pub async fn claim(&self, id: &TicketId, user_id: &UserId) -> Result<ClaimOutcome> {
        if id.is_empty() {
            return Err(TicketError::Validation("uuid is required".to_string()));
        }
        if user_id.as_str().is_empty() {
            return Err(TicketError::Validation("user_id is required".to_string()));
        }

        let outcome = self.claim_live(id, user_id).await?;

        counter!(CLAIMS, "outcome" => outcome.message()).increment(1);
        tracing::info!(
            ticket_id = %id,
            user_id = %user_id,
            outcome = outcome.message(),
            "Claim processed"
        );

        Ok(outcome)
    }

    async fn claim_live(&self, id: &TicketId, user_id: &UserId) -> Result<ClaimOutcome> {
        // Expiry is decided inside the store's critical section.
        let assignment = self
            .store
            .assign_user(
                id,
                user_id,
                self.config.reclaim_policy,
                self.clock.now(),
                self.config.ttl,
            )
            .await?;

        Ok(match assignment {
            Assignment::Assigned | Assignment::AlreadyHeld => ClaimOutcome::Success,
            Assignment::Conflict => ClaimOutcome::AlreadyClaimed,
            Assignment::Expired => ClaimOutcome::Expired,
            Assignment::Missing => ClaimOutcome::NotFound,
        })
    }

    /// Poll a ticket (desktop side).
    ///
    /// A successful poll consumes the ticket: it reports the user id once
    /// and every later poll reports `notfound`.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Validation`] if `id` is empty, or a store
    /// error.
    pub async fn poll(&self, id: &TicketId) -> Result<PollOutcome> {
        if id.is_empty() {
            return Err(TicketError::Validation("uuid is required".to_string()));
        }

        let outcome = self.poll_live(id).await?;

        counter!(POLLS, "outcome" => outcome.message()).increment(1);
        if outcome.is_success() {
            tracing::info!(ticket_id = %id, "Ticket consumed by poll");
        } else {
            tracing::debug!(ticket_id = %id, outcome = outcome.message(), "Poll processed");
        }

        Ok(outcome)
    }

    async fn poll_live(&self, id: &TicketId) -> Result<PollOutcome> {
        let consumption = self
            .store
            .take_claimed(id, self.clock.now(), self.config.ttl)
            .await?;

        Ok(match consumption {
            Consumption::Taken(ticket) => ticket
                .user_id
                .map_or(PollOutcome::NotFound, PollOutcome::Success),
            Consumption::Pending => PollOutcome::NotYet,
            Consumption::Expired => PollOutcome::Expired,
            // Unknown, or another poller consumed it first.
            Consumption::Missing => PollOutcome::NotFound,
        })
    }

    /// Delete a ticket. Revoking an unknown id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn revoke(&self, id: &TicketId) -> Result<()> {
        self.store.delete(id).await?;
        tracing::debug!(ticket_id = %id, "Ticket revoked");
        Ok(())
    }

    /// Remove every expired ticket.
    ///
    /// # Returns
    ///
    /// Number of tickets removed.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn sweep(&self) -> Result<usize> {
        let removed = self
            .store
            .sweep_expired(self.clock.now(), self.config.ttl)
            .await?;

        if removed > 0 {
            counter!(TICKETS_SWEPT).increment(removed as u64);
            tracing::info!(removed, "Swept expired tickets");
        }

        Ok(removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ReclaimPolicy;
    use crate::stores::{NoopBackend, TableTicketStore};
    use qrlogin_testing::{FailingIdGenerator, ManualClock, SequentialIdGenerator, test_clock};

    type Service =
        TicketService<TableTicketStore<NoopBackend>, SequentialIdGenerator, ManualClock>;

    fn start() -> chrono::DateTime<chrono::Utc> {
        test_clock().now()
    }

    fn service(ttl_secs: i64) -> (Service, ManualClock) {
        let clock = ManualClock::new(start());
        let config =
            TicketConfig::new("http://192.168.1.5:3000".to_string()).with_ttl_secs(ttl_secs);
        let service = TicketService::new(
            TableTicketStore::in_memory(),
            SequentialIdGenerator::new(),
            clock.clone(),
            config,
        );
        (service, clock)
    }

    #[tokio::test]
    async fn test_issue_builds_landing_url() {
        let (service, _) = service(10);

        let issued = service.issue("10.0.0.7").await.unwrap();

        assert_eq!(issued.id.as_str(), "t-000001");
        assert_eq!(
            issued.url,
            "http://192.168.1.5:3000/phone?uuid=t-000001&ip=10.0.0.7"
        );
        assert_eq!(service.store().len().await, 1);
    }

    #[tokio::test]
    async fn test_issue_fails_without_id() {
        let service = TicketService::new(
            TableTicketStore::in_memory(),
            FailingIdGenerator::default(),
            ManualClock::new(start()),
            TicketConfig::default(),
        );

        let err = service.issue("10.0.0.7").await.unwrap_err();

        assert!(matches!(err, TicketError::IdGeneration(_)));
        assert!(service.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_claim_validates_input() {
        let (service, _) = service(10);

        let empty_id = service.claim(&"".into(), &"u".into()).await.unwrap_err();
        let issued = service.issue("10.0.0.7").await.unwrap();
        let empty_user = service.claim(&issued.id, &"".into()).await.unwrap_err();

        assert!(empty_id.is_user_error());
        assert!(empty_user.is_user_error());
        assert_eq!(service.poll(&issued.id).await.unwrap(), PollOutcome::NotYet);
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        let (service, clock) = service(10);
        let issued = service.issue("10.0.0.7").await.unwrap();

        clock.advance_secs(10);
        assert_eq!(service.poll(&issued.id).await.unwrap(), PollOutcome::NotYet);

        clock.advance_secs(1);
        assert_eq!(service.poll(&issued.id).await.unwrap(), PollOutcome::Expired);
        assert_eq!(service.poll(&issued.id).await.unwrap(), PollOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_claim_expiry_boundary() {
        let (service, clock) = service(10);
        let first = service.issue("10.0.0.7").await.unwrap();
        let second = service.issue("10.0.0.8").await.unwrap();

        clock.advance_secs(10);
        let on_time = service.claim(&first.id, &"u".into()).await.unwrap();
        assert_eq!(on_time, ClaimOutcome::Success);

        clock.advance_secs(1);
        let late = service.claim(&second.id, &"u".into()).await.unwrap();
        assert_eq!(late, ClaimOutcome::Expired);
        assert_eq!(
            service.claim(&second.id, &"u".into()).await.unwrap(),
            ClaimOutcome::NotFound
        );

        // Claimed in time, but polled too late.
        assert_eq!(service.poll(&first.id).await.unwrap(), PollOutcome::Expired);
        assert!(service.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_claim_expired_ticket() {
        let (service, clock) = service(10);
        let issued = service.issue("10.0.0.7").await.unwrap();

        clock.advance_secs(11);

        let outcome = service.claim(&issued.id, &"u".into()).await.unwrap();
        assert_eq!(outcome, ClaimOutcome::Expired);
        assert!(service.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_claimed_then_expired_reports_expired() {
        let (service, clock) = service(10);
        let issued = service.issue("10.0.0.7").await.unwrap();
        service.claim(&issued.id, &"u".into()).await.unwrap();

        clock.advance_secs(11);

        assert_eq!(service.poll(&issued.id).await.unwrap(), PollOutcome::Expired);
    }

    #[tokio::test]
    async fn test_reclaim_by_other_user() {
        let (service, _) = service(10);
        let issued = service.issue("10.0.0.7").await.unwrap();

        service.claim(&issued.id, &"alice".into()).await.unwrap();
        let again = service.claim(&issued.id, &"alice".into()).await.unwrap();
        let rival = service.claim(&issued.id, &"mallory".into()).await.unwrap();

        assert_eq!(again, ClaimOutcome::Success);
        assert_eq!(rival, ClaimOutcome::AlreadyClaimed);
        assert_eq!(
            service.poll(&issued.id).await.unwrap(),
            PollOutcome::Success("alice".into())
        );
    }

    #[tokio::test]
    async fn test_overwrite_policy_replaces_claimant() {
        let clock = ManualClock::new(start());
        let service = TicketService::new(
            TableTicketStore::in_memory(),
            SequentialIdGenerator::new(),
            clock,
            TicketConfig::default().with_reclaim_policy(ReclaimPolicy::Overwrite),
        );
        let issued = service.issue("10.0.0.7").await.unwrap();

        service.claim(&issued.id, &"alice".into()).await.unwrap();
        let second = service.claim(&issued.id, &"bob".into()).await.unwrap();

        assert_eq!(second, ClaimOutcome::Success);
        assert_eq!(
            service.poll(&issued.id).await.unwrap(),
            PollOutcome::Success("bob".into())
        );
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (service, _) = service(10);
        let issued = service.issue("10.0.0.7").await.unwrap();

        service.revoke(&issued.id).await.unwrap();
        service.revoke(&issued.id).await.unwrap();

        assert_eq!(service.poll(&issued.id).await.unwrap(), PollOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let (service, clock) = service(10);
        service.issue("10.0.0.1").await.unwrap();
        clock.advance_secs(6);
        let young = service.issue("10.0.0.2").await.unwrap();
        clock.advance_secs(5);

        assert_eq!(service.sweep().await.unwrap(), 1);
        assert_eq!(service.poll(&young.id).await.unwrap(), PollOutcome::NotYet);
    }
}
