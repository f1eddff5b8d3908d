//! Durable state store abstraction.
//!
//! The processor keeps all of its per-subscription bookkeeping (watermarks,
//! interval tracking, out-of-order backlogs, scheduling flags) in a
//! key-value store with per-key expiry. Production deployments back this
//! with a shared cluster; tests and embedding use [`MemoryStore`].

pub mod keys;
pub mod memory;

pub use keys::*;
pub use memory::*;

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store unavailable: {0}")]
    Unavailable(String),
    #[error("wrong value type at key {key}")]
    WrongType { key: String },
}

/// Key-value store primitives the processor relies on.
///
/// All operations are synchronous and expected to complete in low
/// single-digit milliseconds; callers treat failures per the drop-and-log
/// policy rather than propagating them to the stream harness.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set a value, replacing any existing one, with a fresh TTL.
    fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Set a value only if the key is absent. Returns whether the write
    /// happened. Used for the schedule lock and the task-scheduled flag.
    fn set_nx_with_ttl(&self, key: &str, value: &str, ttl: Duration)
        -> Result<bool, StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Add a member to a sorted set under the given score.
    fn zadd(&self, key: &str, score: i64, member: &str) -> Result<(), StoreError>;

    /// All members of a sorted set in ascending score order.
    fn zrange(&self, key: &str) -> Result<Vec<(i64, String)>, StoreError>;

    fn zrem(&self, key: &str, member: &str) -> Result<(), StoreError>;

    /// Refresh the TTL on an existing key. No-op if the key is absent.
    fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;
}
