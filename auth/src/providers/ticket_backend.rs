//! Durable backend for the ticket table.

use crate::error::Result;
use crate::state::Ticket;

/// Whole-table persistence.
///
/// A backend stores the complete list of tickets and replaces it wholesale on
/// every save. It has no transactional isolation of its own; callers
/// serialize load/save pairs themselves (see
/// [`TableTicketStore`](crate::stores::TableTicketStore)).
pub trait TicketBackend: Send + Sync {
    /// Read the full table.
    ///
    /// # Errors
    ///
    /// Returns error if the backing medium cannot be read or decoded.
    fn load(&self) -> impl std::future::Future<Output = Result<Vec<Ticket>>> + Send;

    /// Overwrite the full table.
    ///
    /// # Errors
    ///
    /// Returns error if the backing medium cannot be written.
    fn save(&self, tickets: &[Ticket]) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Whether `load` can observe writes made by other processes.
    ///
    /// Volatile backends return `false`, which lets the table skip reloading.
    fn is_shared(&self) -> bool {
        true
    }
}
