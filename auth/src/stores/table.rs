//! Whole-table ticket store.
//!
//! Keeps every ticket in one ordered in-memory table and mirrors it to a
//! [`TicketBackend`] that can only read or write the table as a whole.
//!
//! # Concurrency
//!
//! The backend has no transactional isolation: two requests that each read
//! the whole table, change one ticket and write the whole table back would
//! silently drop one of the changes. Every operation therefore runs
//! reload → modify → persist under a single `tokio::sync::Mutex`, held across
//! the backend I/O. This serializes all ticket traffic of the process, which
//! is the price of a file backend; use the Redis store when that matters.
//!
//! # Failure handling
//!
//! Backend failures never fail an operation:
//! - a failed reload logs a warning and keeps the in-memory table
//! - a failed save logs an error; the change lives in memory until the next
//!   successful save (or is lost if a later reload succeeds first)

use crate::config::ReclaimPolicy;
use crate::error::{Result, TicketError};
use crate::metrics::{PERSIST_FAILURES, counter};
use crate::providers::{Assignment, Consumption, TicketBackend, TicketStore};
use crate::state::{Ticket, TicketId, UserId};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

type Table = BTreeMap<TicketId, Ticket>;

/// Backend that stores nothing, for purely in-memory tables.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopBackend;

impl TicketBackend for NoopBackend {
    async fn load(&self) -> Result<Vec<Ticket>> {
        Ok(Vec::new())
    }

    async fn save(&self, _tickets: &[Ticket]) -> Result<()> {
        Ok(())
    }

    fn is_shared(&self) -> bool {
        false
    }
}

/// Ticket store over a whole-table backend.
///
/// # Thread Safety
///
/// This type is `Clone`; clones share the same table and lock.
#[derive(Debug)]
pub struct TableTicketStore<B> {
    backend: B,
    table: Arc<Mutex<Table>>,
    reload_on_access: bool,
}

impl TableTicketStore<NoopBackend> {
    /// Volatile store for tests and single-process development.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(NoopBackend)
    }
}

impl<B: TicketBackend> TableTicketStore<B> {
    /// Create a store with an empty table.
    ///
    /// Reload-on-access defaults to [`TicketBackend::is_shared`]. Call
    /// [`TicketStore::load`] (or use [`TableTicketStore::open`]) to pick up
    /// tickets that are already persisted.
    #[must_use]
    pub fn new(backend: B) -> Self {
        let reload_on_access = backend.is_shared();
        Self {
            backend,
            table: Arc::new(Mutex::new(Table::new())),
            reload_on_access,
        }
    }

    /// Create a store and load the persisted table.
    pub async fn open(backend: B) -> Self {
        let store = Self::new(backend);
        let tickets = store.reload_table().await;
        tracing::info!(tickets = tickets, "Ticket table opened");
        store
    }

    /// Re-read the backend at the start of every operation.
    ///
    /// Needed when other processes write the same backend. Without it the
    /// table is read once and the backend only receives writes.
    #[must_use]
    pub const fn with_reload_on_access(mut self, reload: bool) -> Self {
        self.reload_on_access = reload;
        self
    }

    /// The backend this store persists to.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of tickets currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.table.lock().await.len()
    }

    /// `true` if the table holds no tickets.
    pub async fn is_empty(&self) -> bool {
        self.table.lock().await.is_empty()
    }

    async fn reload_table(&self) -> usize {
        let mut table = self.table.lock().await;
        self.reload(&mut table).await;
        table.len()
    }

    /// Replace `table` with the backend's contents, keeping it on failure.
    async fn reload(&self, table: &mut Table) {
        match self.backend.load().await {
            Ok(tickets) => {
                *table = tickets
                    .into_iter()
                    .map(|ticket| (ticket.id.clone(), ticket))
                    .collect();
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    tickets = table.len(),
                    "Failed to load ticket table, serving from memory"
                );
            }
        }
    }

    async fn refresh(&self, table: &mut Table) {
        if self.reload_on_access {
            self.reload(table).await;
        }
    }

    async fn persist(&self, table: &Table) {
        let snapshot: Vec<Ticket> = table.values().cloned().collect();

        if let Err(e) = self.backend.save(&snapshot).await {
            counter!(PERSIST_FAILURES).increment(1);
            tracing::error!(
                error = %e,
                tickets = snapshot.len(),
                "Failed to save ticket table, change kept in memory only"
            );
        }
    }

    fn sweep(table: &mut Table, now: DateTime<Utc>, ttl: Duration) -> usize {
        let before = table.len();
        table.retain(|id, ticket| {
            let expired = ticket.is_expired(now, ttl);
            if expired {
                tracing::debug!(ticket_id = %id, "Sweeping expired ticket");
            }
            !expired
        });
        before - table.len()
    }
}

impl<B: Clone> Clone for TableTicketStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            table: Arc::clone(&self.table),
            reload_on_access: self.reload_on_access,
        }
    }
}

impl<B: TicketBackend> TicketStore for TableTicketStore<B> {
    async fn load(&self) -> Result<Vec<Ticket>> {
        let mut table = self.table.lock().await;
        if self.backend.is_shared() {
            self.reload(&mut table).await;
        }
        Ok(table.values().cloned().collect())
    }

    async fn save(&self) -> Result<()> {
        let table = self.table.lock().await;
        self.persist(&table).await;
        Ok(())
    }

    async fn insert(&self, ticket: Ticket, now: DateTime<Utc>, ttl: Duration) -> Result<()> {
        let mut table = self.table.lock().await;
        self.refresh(&mut table).await;

        let swept = Self::sweep(&mut table, now, ttl);
        if swept > 0 {
            tracing::info!(removed = swept, "Swept expired tickets before issuing");
        }

        if table.contains_key(&ticket.id) {
            if swept > 0 {
                self.persist(&table).await;
            }
            return Err(TicketError::Persistence(format!(
                "ticket id {} already exists",
                ticket.id
            )));
        }

        table.insert(ticket.id.clone(), ticket);
        self.persist(&table).await;
        Ok(())
    }

    async fn find(&self, id: &TicketId) -> Result<Option<Ticket>> {
        let mut table = self.table.lock().await;
        self.refresh(&mut table).await;
        Ok(table.get(id).cloned())
    }

    async fn assign_user(
        &self,
        id: &TicketId,
        user_id: &UserId,
        policy: ReclaimPolicy,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Assignment> {
        let mut table = self.table.lock().await;
        self.refresh(&mut table).await;

        let Some(ticket) = table.get_mut(id) else {
            return Ok(Assignment::Missing);
        };

        if ticket.is_expired(now, ttl) {
            table.remove(id);
            self.persist(&table).await;
            return Ok(Assignment::Expired);
        }

        let outcome = match &ticket.user_id {
            Some(current) if current == user_id => return Ok(Assignment::AlreadyHeld),
            Some(_) if policy == ReclaimPolicy::Reject => return Ok(Assignment::Conflict),
            Some(current) => {
                tracing::warn!(
                    ticket_id = %id,
                    previous = %current,
                    "Overwriting ticket claimant"
                );
                Assignment::Assigned
            }
            None => Assignment::Assigned,
        };

        ticket.user_id = Some(user_id.clone());
        self.persist(&table).await;
        Ok(outcome)
    }

    async fn take_claimed(
        &self,
        id: &TicketId,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Consumption> {
        let mut table = self.table.lock().await;
        self.refresh(&mut table).await;

        let Some(ticket) = table.get(id) else {
            return Ok(Consumption::Missing);
        };
        let expired = ticket.is_expired(now, ttl);
        if !expired && ticket.user_id.is_none() {
            return Ok(Consumption::Pending);
        }

        let Some(ticket) = table.remove(id) else {
            return Ok(Consumption::Missing);
        };
        self.persist(&table).await;

        Ok(if expired {
            Consumption::Expired
        } else {
            Consumption::Taken(ticket)
        })
    }

    async fn delete(&self, id: &TicketId) -> Result<()> {
        let mut table = self.table.lock().await;
        self.refresh(&mut table).await;

        if table.remove(id).is_some() {
            self.persist(&table).await;
        }
        Ok(())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>, ttl: Duration) -> Result<usize> {
        let mut table = self.table.lock().await;
        self.refresh(&mut table).await;

        let swept = Self::sweep(&mut table, now, ttl);
        if swept > 0 {
            self.persist(&table).await;
        }
        Ok(swept)
    }
}
