//! # QR Login Testing
//!
//! Testing utilities for the QR login crates.
//!
//! This crate provides:
//! - Deterministic clocks (`FixedClock`, `ManualClock`)
//! - Predictable identifier generators (`SequentialIdGenerator`, `FailingIdGenerator`)
//! - A tracing initializer that routes logs through the test harness
//!
//! ## Example
//!
//! ```ignore
//! use qrlogin_testing::{test_clock, SequentialIdGenerator};
//!
//! #[tokio::test]
//! async fn test_ticket_expires() {
//!     let clock = ManualClock::new(test_clock().now());
//!     let service = TicketService::new(store, SequentialIdGenerator::new(), clock.clone(), config);
//!
//!     let issued = service.issue("10.0.0.1").await.unwrap();
//!     clock.advance_secs(11);
//!
//!     assert_eq!(service.poll(&issued.id).await.unwrap(), PollOutcome::Expired);
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use qrlogin_core::environment::Clock;
use qrlogin_core::id::{IdError, IdGenerator};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Duration, IdError, IdGenerator, Utc};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use qrlogin_testing::mocks::FixedClock;
    /// use qrlogin_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to.
    ///
    /// Clones share the same time, so a test can hand one clone to the code
    /// under test and advance the other.
    ///
    /// ```
    /// use qrlogin_testing::mocks::ManualClock;
    /// use qrlogin_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = ManualClock::new(Utc::now());
    /// let before = clock.now();
    /// clock.advance_secs(10);
    /// assert_eq!((clock.now() - before).num_seconds(), 10);
    /// ```
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock frozen at `time`.
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward by `by`.
        pub fn advance(&self, by: Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }

        /// Move the clock forward by whole seconds.
        pub fn advance_secs(&self, secs: i64) {
            self.advance(Duration::seconds(secs));
        }

        /// Jump to an absolute time.
        pub fn set(&self, to: DateTime<Utc>) {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner) = to;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Predictable identifiers: `prefix` followed by a zero-padded counter.
    ///
    /// Padding keeps lexical order equal to issue order.
    #[derive(Debug, Clone)]
    pub struct SequentialIdGenerator {
        prefix: String,
        next: Arc<AtomicU64>,
    }

    impl SequentialIdGenerator {
        /// Start at `t-000001`.
        #[must_use]
        pub fn new() -> Self {
            Self::with_prefix("t-")
        }

        /// Start at `{prefix}000001`.
        #[must_use]
        pub fn with_prefix(prefix: impl Into<String>) -> Self {
            Self {
                prefix: prefix.into(),
                next: Arc::new(AtomicU64::new(1)),
            }
        }

        /// Number of identifiers handed out so far.
        #[must_use]
        pub fn issued(&self) -> u64 {
            self.next.load(Ordering::SeqCst) - 1
        }
    }

    impl Default for SequentialIdGenerator {
        fn default() -> Self {
            Self::new()
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn next_id(&self) -> Result<String, IdError> {
            let n = self.next.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{}{n:06}", self.prefix))
        }
    }

    /// Generator that always fails, for exercising fatal id errors.
    #[derive(Debug, Clone)]
    pub struct FailingIdGenerator {
        error: IdError,
    }

    impl FailingIdGenerator {
        /// Fail every call with `error`.
        #[must_use]
        pub const fn new(error: IdError) -> Self {
            Self { error }
        }
    }

    impl Default for FailingIdGenerator {
        fn default() -> Self {
            Self::new(IdError::Poisoned)
        }
    }

    impl IdGenerator for FailingIdGenerator {
        fn next_id(&self) -> Result<String, IdError> {
            Err(self.error.clone())
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Route `tracing` output through the test harness.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qrlogin=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{
    FailingIdGenerator, FixedClock, ManualClock, SequentialIdGenerator, test_clock,
};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new(test_clock().now());
        let handle = clock.clone();

        handle.advance_secs(30);

        assert_eq!(clock.now(), test_clock().now() + Duration::seconds(30));
    }

    #[test]
    fn test_sequential_ids_sort_in_issue_order() {
        let ids = SequentialIdGenerator::new();
        let a = ids.next_id().unwrap();
        let b = ids.next_id().unwrap();

        assert_eq!(a, "t-000001");
        assert!(a < b);
        assert_eq!(ids.issued(), 2);
    }

    #[test]
    fn test_failing_generator() {
        let ids = FailingIdGenerator::default();
        assert_eq!(ids.next_id(), Err(IdError::Poisoned));
    }
}
