//! # QR Login Core
//!
//! Dependency traits shared by every QR login crate.
//!
//! The ticket lifecycle depends on two things it cannot control: the wall
//! clock and the source of fresh identifiers. Both are abstracted here so the
//! service can run against deterministic implementations in tests and real
//! ones in production.
//!
//! ## Example
//!
//! ```
//! use qrlogin_core::environment::{Clock, SystemClock};
//! use qrlogin_core::id::{IdGenerator, SnowflakeIdGenerator};
//! use std::sync::Arc;
//!
//! let ids = SnowflakeIdGenerator::new(1, Arc::new(SystemClock)).unwrap();
//! let first = ids.next_id().unwrap();
//! let second = ids.next_id().unwrap();
//! assert_ne!(first, second);
//! assert!(SystemClock.now().timestamp() > 0);
//! ```

pub mod id;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// into the services that need them.
pub mod environment {
    use chrono::{DateTime, Utc};
    use std::sync::Arc;

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Production - uses system clock
    /// let clock = SystemClock;
    ///
    /// // Test - manual time for deterministic expiry checks
    /// let clock = ManualClock::new(start);
    /// clock.advance(Duration::seconds(11));
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    impl<C: Clock + ?Sized> Clock for Arc<C> {
        fn now(&self) -> DateTime<Utc> {
            (**self).now()
        }
    }
}
