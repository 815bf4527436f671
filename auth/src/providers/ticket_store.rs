//! Ticket store trait.
//!
//! This module defines the storage contract the ticket service is written
//! against. Implementations own their synchronization: the service never
//! holds a lock of its own.

use crate::config::ReclaimPolicy;
use crate::error::Result;
use crate::state::{Ticket, TicketId, UserId};
use chrono::{DateTime, Duration, Utc};

/// Result of [`TicketStore::assign_user`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// The user id was written.
    Assigned,

    /// The ticket already belonged to this user; nothing changed.
    AlreadyHeld,

    /// The ticket belongs to someone else and the policy forbids replacing them.
    Conflict,

    /// The ticket had outlived its TTL and has been removed.
    Expired,

    /// No ticket with that id.
    Missing,
}

/// Result of [`TicketStore::take_claimed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consumption {
    /// The ticket was claimed and is now gone.
    Taken(Ticket),

    /// Nobody has claimed the ticket yet; it was left untouched.
    Pending,

    /// The ticket had outlived its TTL and has been removed.
    Expired,

    /// No ticket with that id.
    Missing,
}

/// Ticket store.
///
/// Durable, process-wide table of tickets keyed by [`TicketId`].
///
/// # Implementation Notes
///
/// - Tickets are ephemeral (TTL of minutes to hours)
/// - **CRITICAL**: `insert`, `assign_user` and `take_claimed` MUST each be
///   atomic: a read of a ticket followed by a write of it must not interleave
///   with another writer, or concurrent requests lose each other's updates
/// - `delete` is idempotent
/// - Operations that change a ticket decide expiry themselves, inside the
///   same critical section as the change, from the `now` and `ttl` they are
///   given. An expired ticket is removed and reported, never claimed or
///   consumed
///
/// # Durability
///
/// Whether a persistence failure is reported or absorbed is up to the
/// implementation. The file-backed table logs and keeps serving from memory;
/// the Redis store has no memory to fall back on and returns
/// [`TicketError::Persistence`](crate::TicketError::Persistence).
pub trait TicketStore: Send + Sync {
    /// Rebuild the table from durable storage and return a snapshot of it.
    ///
    /// Fails soft where the implementation can: an unreadable backend leaves
    /// the current table in place.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot produce a snapshot at all.
    fn load(&self) -> impl std::future::Future<Output = Result<Vec<Ticket>>> + Send;

    /// Persist the whole table.
    ///
    /// # Errors
    ///
    /// Returns error if the implementation reports persistence failures.
    fn save(&self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Store a new ticket.
    ///
    /// Sweeps tickets older than `ttl` at `now`, appends `ticket` and
    /// persists, all in one critical section.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - A live ticket with the same id exists
    /// - Storage operation fails
    fn insert(
        &self,
        ticket: Ticket,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Look a ticket up by id.
    ///
    /// # Errors
    ///
    /// Returns error if storage operation fails.
    fn find(
        &self,
        id: &TicketId,
    ) -> impl std::future::Future<Output = Result<Option<Ticket>>> + Send;

    /// Compare-and-set the claimant of a live ticket.
    ///
    /// A ticket older than `ttl` at `now` is removed and reported as
    /// [`Assignment::Expired`]. Otherwise writes `user_id` if the ticket is
    /// unclaimed, or if it is claimed by someone else and `policy` is
    /// [`ReclaimPolicy::Overwrite`].
    ///
    /// # Errors
    ///
    /// Returns error if storage operation fails.
    fn assign_user(
        &self,
        id: &TicketId,
        user_id: &UserId,
        policy: ReclaimPolicy,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<Assignment>> + Send;

    /// Remove and return a ticket, but only if it is live and claimed.
    ///
    /// This is the single-use consumption primitive: of any number of
    /// concurrent callers, at most one receives [`Consumption::Taken`]; the
    /// rest see [`Consumption::Missing`]. A ticket older than `ttl` at `now`
    /// is removed and reported as [`Consumption::Expired`].
    ///
    /// # Errors
    ///
    /// Returns error if storage operation fails.
    fn take_claimed(
        &self,
        id: &TicketId,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<Consumption>> + Send;

    /// Delete a ticket. Deleting an absent id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns error if storage operation fails.
    fn delete(&self, id: &TicketId) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Remove every ticket older than `ttl` at `now`.
    ///
    /// # Returns
    ///
    /// Number of tickets removed.
    ///
    /// # Errors
    ///
    /// Returns error if storage operation fails.
    fn sweep_expired(
        &self,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<usize>> + Send;
}
