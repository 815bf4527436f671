//! Mock ticket backend for testing.

use crate::error::{Result, TicketError};
use crate::providers::TicketBackend;
use crate::state::Ticket;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock ticket backend.
///
/// In-memory stand-in for a file or database, with switches to make loads or
/// saves fail. Clones share state, so a test can keep one clone to inspect or
/// mutate "the disk" behind the store's back.
#[derive(Debug, Clone, Default)]
pub struct MockTicketBackend {
    tickets: Arc<Mutex<Vec<Ticket>>>,
    fail_loads: Arc<AtomicBool>,
    fail_saves: Arc<AtomicBool>,
    loads: Arc<AtomicUsize>,
    saves: Arc<AtomicUsize>,
}

impl MockTicketBackend {
    /// Create an empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock backend that already holds `tickets`.
    #[must_use]
    pub fn with_tickets(tickets: Vec<Ticket>) -> Self {
        let backend = Self::new();
        backend.replace(tickets);
        backend
    }

    /// Overwrite the stored table, as another process would.
    pub fn replace(&self, tickets: Vec<Ticket>) {
        if let Ok(mut guard) = self.tickets.lock() {
            *guard = tickets;
        }
    }

    /// Get the stored table (for testing).
    #[must_use]
    pub fn stored(&self) -> Vec<Ticket> {
        self.tickets.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// Make every subsequent load fail (or stop failing).
    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent save fail (or stop failing).
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of load calls so far, failed ones included.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of successful saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl TicketBackend for MockTicketBackend {
    async fn load(&self) -> Result<Vec<Ticket>> {
        self.loads.fetch_add(1, Ordering::SeqCst);

        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(TicketError::Persistence("injected load failure".to_string()));
        }

        let tickets = self
            .tickets
            .lock()
            .map_err(|_| TicketError::Persistence("Mutex lock failed".to_string()))?;
        Ok(tickets.clone())
    }

    async fn save(&self, tickets: &[Ticket]) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(TicketError::Persistence("injected save failure".to_string()));
        }

        let mut stored = self
            .tickets
            .lock()
            .map_err(|_| TicketError::Persistence("Mutex lock failed".to_string()))?;
        *stored = tickets.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_save_then_load() {
        let backend = MockTicketBackend::new();
        let ticket = Ticket::new("1".into(), "10.0.0.1", Utc::now());

        backend.save(std::slice::from_ref(&ticket)).await.unwrap();

        assert_eq!(backend.load().await.unwrap(), vec![ticket]);
        assert_eq!(backend.save_count(), 1);
        assert_eq!(backend.load_count(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let backend = MockTicketBackend::new();
        backend.fail_loads(true);
        backend.fail_saves(true);

        assert!(backend.load().await.is_err());
        assert!(backend.save(&[]).await.is_err());
        assert_eq!(backend.save_count(), 0);
    }
}
