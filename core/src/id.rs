//! Time-ordered identifier generation.
//!
//! Tickets are keyed by snowflake identifiers: a 64-bit integer made of a
//! millisecond timestamp, a node number and a per-millisecond sequence,
//! rendered in decimal. Identifiers from one generator are strictly
//! increasing, and generators with distinct node numbers never collide.
//!
//! ```text
//!  63      22 21    12 11       0
//! ┌──────────┬────────┬──────────┐
//! │ millis   │ node   │ sequence │
//! │ (41 bit) │ (10)   │ (12)     │
//! └──────────┴────────┴──────────┘
//! ```

use crate::environment::Clock;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Milliseconds between the Unix epoch and the snowflake epoch
/// (2010-11-04T01:42:54.657Z).
pub const SNOWFLAKE_EPOCH_MS: i64 = 1_288_834_974_657;

const NODE_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;
const TIMESTAMP_BITS: u32 = 41;

/// Largest node number a generator may use.
pub const MAX_NODE_ID: u16 = (1 << NODE_BITS) - 1;

const SEQUENCE_MASK: u16 = (1 << SEQUENCE_BITS) - 1;
const MAX_TIMESTAMP: i64 = (1 << TIMESTAMP_BITS) - 1;

/// Identifier generation failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// Node number does not fit in the node field.
    #[error("node id {0} exceeds maximum of {MAX_NODE_ID}")]
    NodeOutOfRange(u16),

    /// The clock reports a time before the snowflake epoch.
    #[error("clock is {0}ms before the snowflake epoch")]
    BeforeEpoch(i64),

    /// The timestamp no longer fits in 41 bits.
    #[error("snowflake timestamp space exhausted")]
    TimestampOverflow,

    /// Generator state was poisoned by a panicking thread.
    #[error("id generator state poisoned")]
    Poisoned,
}

/// Source of unique, time-ordered identifiers.
pub trait IdGenerator: Send + Sync {
    /// Produce the next identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdError`] when no identifier can be produced; callers treat
    /// this as fatal for the operation in progress.
    fn next_id(&self) -> Result<String, IdError>;
}

impl<G: IdGenerator + ?Sized> IdGenerator for Arc<G> {
    fn next_id(&self) -> Result<String, IdError> {
        (**self).next_id()
    }
}

#[derive(Debug, Default)]
struct Cursor {
    last_ms: i64,
    sequence: u16,
}

/// Snowflake identifier generator.
///
/// When the sequence space of one millisecond is exhausted, or the clock
/// steps backwards, the generator borrows the next logical millisecond
/// instead of sleeping, so identifiers stay strictly increasing.
pub struct SnowflakeIdGenerator {
    node: u16,
    clock: Arc<dyn Clock>,
    cursor: Mutex<Cursor>,
}

impl SnowflakeIdGenerator {
    /// Create a generator for `node`.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::NodeOutOfRange`] if `node > MAX_NODE_ID`.
    pub fn new(node: u16, clock: Arc<dyn Clock>) -> Result<Self, IdError> {
        if node > MAX_NODE_ID {
            return Err(IdError::NodeOutOfRange(node));
        }

        Ok(Self {
            node,
            clock,
            cursor: Mutex::new(Cursor::default()),
        })
    }

    /// Node number baked into every identifier.
    #[must_use]
    pub const fn node(&self) -> u16 {
        self.node
    }

    /// Produce the next identifier as an integer.
    ///
    /// # Errors
    ///
    /// See [`IdGenerator::next_id`].
    pub fn next_raw(&self) -> Result<u64, IdError> {
        let elapsed = self.clock.now().timestamp_millis() - SNOWFLAKE_EPOCH_MS;
        if elapsed < 0 {
            return Err(IdError::BeforeEpoch(-elapsed));
        }

        let mut cursor = self.cursor.lock().map_err(|_| IdError::Poisoned)?;

        let mut ms = elapsed.max(cursor.last_ms);
        if ms == cursor.last_ms {
            cursor.sequence = (cursor.sequence + 1) & SEQUENCE_MASK;
            if cursor.sequence == 0 {
                ms += 1;
            }
        } else {
            cursor.sequence = 0;
        }

        if ms > MAX_TIMESTAMP {
            return Err(IdError::TimestampOverflow);
        }
        cursor.last_ms = ms;

        #[allow(clippy::cast_sign_loss)]
        let id = ((ms as u64) << (NODE_BITS + SEQUENCE_BITS))
            | (u64::from(self.node) << SEQUENCE_BITS)
            | u64::from(cursor.sequence);

        Ok(id)
    }
}

impl IdGenerator for SnowflakeIdGenerator {
    fn next_id(&self) -> Result<String, IdError> {
        self.next_raw().map(|id| id.to_string())
    }
}

impl std::fmt::Debug for SnowflakeIdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnowflakeIdGenerator")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}
