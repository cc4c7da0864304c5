//! Cache Entry Module
//!
//! Defines the unit of storage and the entry size estimator.

use std::time::Instant;

use crate::cache::lru::NodeHandle;
use crate::cache::Value;

/// Fixed per-entry overhead approximating the index node and recency node
/// allocations, in bytes.
pub const ENTRY_OVERHEAD: i64 = 64;

// == Cache Entry ==
/// A single cache entry.
///
/// Lives in exactly one shard, referenced from the shard's keyed index and,
/// through `node`, from the shard's recency list. All fields are mutated only
/// under the owning shard's write lock.
#[derive(Debug)]
pub(crate) struct Entry {
    /// The stored value
    pub value: Value,
    /// Estimated size in bytes, as accounted in the shard and global counters
    pub size: i64,
    /// Absolute expiration instant, None = never expires
    pub expires_at: Option<Instant>,
    /// Handle of this entry's node in the shard's recency list
    pub node: NodeHandle,
}

impl Entry {
    // == Is Expired ==
    /// Checks whether the entry has expired at `now`.
    ///
    /// Entries without an expiration never expire.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now > expires,
            None => false,
        }
    }
}

// == Size Estimation ==
/// Estimates the memory contribution of a key-value pair in bytes.
///
/// Key length plus the value's type-dispatched contribution plus a fixed
/// per-entry overhead. Conservative rather than exact; the estimate is the
/// authoritative accounting unit for the memory budget.
pub fn entry_size(key: &str, value: &Value) -> i64 {
    key.len() as i64 + value.estimated_size() + ENTRY_OVERHEAD
}
