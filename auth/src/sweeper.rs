//! Periodic removal of abandoned tickets.
//!
//! Expiry is enforced lazily on every read, so a ticket that nobody ever
//! polls again would otherwise stay in the store until the next issue.

use crate::providers::TicketStore;
use crate::service::TicketService;
use qrlogin_core::environment::Clock;
use qrlogin_core::id::IdGenerator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Run [`TicketService::sweep`] every `interval` until `shutdown` fires.
///
/// The first sweep happens one full interval after spawning. A failed sweep
/// is logged and retried on the next tick.
pub fn spawn_sweeper<S, G, C>(
    service: Arc<TicketService<S, G, C>>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()>
where
    S: TicketStore + 'static,
    G: IdGenerator + 'static,
    C: Clock + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        tracing::info!(interval = ?interval, "Ticket sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = service.sweep().await {
                        tracing::warn!(error = %e, "Ticket sweep failed");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Ticket sweeper stopping");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::TicketConfig;
    use crate::stores::TableTicketStore;
    use qrlogin_testing::{ManualClock, SequentialIdGenerator, test_clock};

    #[tokio::test]
    async fn test_sweeper_removes_expired_and_stops() {
        let clock = ManualClock::new(test_clock().now());
        let service = Arc::new(TicketService::new(
            TableTicketStore::in_memory(),
            SequentialIdGenerator::new(),
            clock.clone(),
            TicketConfig::default().with_ttl_secs(10),
        ));
        service.issue("10.0.0.1").await.unwrap();
        clock.advance_secs(11);

        let (tx, rx) = broadcast::channel(1);
        let handle = spawn_sweeper(Arc::clone(&service), Duration::from_millis(10), rx);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(service.store().is_empty().await);

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
