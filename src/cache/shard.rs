//! Cache Shard Module
//!
//! One independently locked partition of the keyspace: a keyed index plus a
//! recency list under a single reader/writer lock, with shard-local size and
//! hit/miss counters.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::cache::entry::Entry;
use crate::cache::lru::RecencyList;
use crate::cache::Value;

// == Lookup Outcome ==
/// Result of a read-locked index probe.
pub(crate) enum Lookup {
    /// Key absent
    Miss,
    /// Key present but past its expiration
    Expired,
    /// Key present and live
    Hit(Value),
}

// == Shard State ==
/// Index and recency list, guarded together by the shard lock.
///
/// Invariant: every entry in `index` has exactly one node in `recency` (its
/// `node` handle), and `recency` holds no keys absent from `index`.
#[derive(Debug, Default)]
struct ShardState {
    index: FxHashMap<Arc<str>, Entry>,
    recency: RecencyList,
}

// == Shard ==
/// A single cache shard.
///
/// All structural mutation happens under the write lock. The size counter is
/// atomic so that statistics snapshots can read it without taking the lock;
/// it is only ever adjusted while the write lock is held.
#[derive(Debug)]
pub(crate) struct Shard {
    state: RwLock<ShardState>,
    pub size: AtomicI64,
    pub hits: AtomicU64,
    pub misses: AtomicU64,
}

impl Shard {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ShardState::default()),
            size: AtomicI64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    // == Insert ==
    /// Inserts or updates an entry, returning the size delta applied.
    ///
    /// On update the existing entry's value, size and expiry are replaced and
    /// its recency node moves to the front; on insert a fresh entry is pushed
    /// to the recency front. Both the shard size and `total_size` are adjusted
    /// by the delta before the lock is released.
    pub fn insert(
        &self,
        key: &str,
        value: Value,
        size: i64,
        expires_at: Option<Instant>,
        total_size: &AtomicI64,
    ) {
        let mut state = self.state.write();

        if let Some(existing) = state.index.get_mut(key) {
            let delta = size - existing.size;
            existing.value = value;
            existing.size = size;
            existing.expires_at = expires_at;
            let node = existing.node;
            state.recency.move_to_front(node);

            self.size.fetch_add(delta, Ordering::Relaxed);
            total_size.fetch_add(delta, Ordering::Relaxed);
            return;
        }

        let key: Arc<str> = Arc::from(key);
        let node = state.recency.push_front(key.clone());
        state.index.insert(
            key,
            Entry {
                value,
                size,
                expires_at,
                node,
            },
        );

        self.size.fetch_add(size, Ordering::Relaxed);
        total_size.fetch_add(size, Ordering::Relaxed);
    }

    // == Lookup ==
    /// Probes the index under the read lock.
    ///
    /// Returns a clone of the value on a live hit; recency is not updated
    /// here since that requires the write lock (see [`Shard::touch`]).
    pub fn lookup(&self, key: &str, now: Instant) -> Lookup {
        let state = self.state.read();
        match state.index.get(key) {
            None => Lookup::Miss,
            Some(entry) if entry.is_expired(now) => Lookup::Expired,
            Some(entry) => Lookup::Hit(entry.value.clone()),
        }
    }

    // == Touch ==
    /// Moves a key's recency node to the front, if the key is still present.
    ///
    /// The caller re-acquires the write lock after a read-locked hit, so the
    /// entry may have been deleted or replaced in between; the lookup here
    /// revalidates the handle.
    pub fn touch(&self, key: &str) {
        let mut state = self.state.write();
        if let Some(entry) = state.index.get(key) {
            let node = entry.node;
            state.recency.move_to_front(node);
        }
    }

    // == Remove ==
    /// Removes a key, returning true if it was present.
    pub fn remove(&self, key: &str, total_size: &AtomicI64) -> bool {
        let mut state = self.state.write();
        match state.index.remove(key) {
            Some(entry) => {
                state.recency.remove(entry.node);
                self.size.fetch_sub(entry.size, Ordering::Relaxed);
                total_size.fetch_sub(entry.size, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    // == Evict Tail ==
    /// Removes the least-recently-used entry, returning true if one existed.
    pub fn evict_tail(&self, total_size: &AtomicI64) -> bool {
        let mut state = self.state.write();
        let victim = match state.recency.tail() {
            Some(key) => key.clone(),
            None => return false,
        };

        if let Some(entry) = state.index.remove(&victim) {
            state.recency.remove(entry.node);
            self.size.fetch_sub(entry.size, Ordering::Relaxed);
            total_size.fetch_sub(entry.size, Ordering::Relaxed);
        }
        true
    }

    // == Sweep Expired ==
    /// Removes every entry expired at `now`, returning how many were removed.
    pub fn sweep_expired(&self, now: Instant, total_size: &AtomicI64) -> usize {
        let mut state = self.state.write();

        let expired: Vec<Arc<str>> = state
            .index
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            if let Some(entry) = state.index.remove(key) {
                state.recency.remove(entry.node);
                self.size.fetch_sub(entry.size, Ordering::Relaxed);
                total_size.fetch_sub(entry.size, Ordering::Relaxed);
            }
        }

        expired.len()
    }

    // == Clear ==
    /// Drops all entries and zeroes the shard size.
    ///
    /// The caller resets the global size counter after clearing every shard.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.index = FxHashMap::default();
        state.recency = RecencyList::new();
        self.size.store(0, Ordering::Relaxed);
    }

    // == Entry Count ==
    /// Number of entries currently in this shard.
    pub fn entry_count(&self) -> usize {
        self.state.read().index.len()
    }

    /// Recomputes the shard's size from its entries, for invariant checks.
    #[cfg(test)]
    pub fn recomputed_size(&self) -> i64 {
        self.state.read().index.values().map(|e| e.size).sum()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::entry_size;
    use std::time::Duration;

    fn insert(shard: &Shard, total: &AtomicI64, key: &str, value: &str) -> i64 {
        let value = Value::from(value);
        let size = entry_size(key, &value);
        shard.insert(key, value, size, None, total);
        size
    }

    #[test]
    fn test_insert_and_lookup() {
        let shard = Shard::new();
        let total = AtomicI64::new(0);

        let size = insert(&shard, &total, "key1", "value1");

        assert_eq!(shard.size.load(Ordering::Relaxed), size);
        assert_eq!(total.load(Ordering::Relaxed), size);
        assert_eq!(shard.entry_count(), 1);
        assert!(matches!(
            shard.lookup("key1", Instant::now()),
            Lookup::Hit(Value::Str(ref s)) if s == "value1"
        ));
    }

    #[test]
    fn test_update_applies_size_delta() {
        let shard = Shard::new();
        let total = AtomicI64::new(0);

        insert(&shard, &total, "key1", "a long initial value");
        let new_size = insert(&shard, &total, "key1", "short");

        // Counters reflect only the replacement entry
        assert_eq!(shard.size.load(Ordering::Relaxed), new_size);
        assert_eq!(total.load(Ordering::Relaxed), new_size);
        assert_eq!(shard.entry_count(), 1);
    }

    #[test]
    fn test_remove_releases_size() {
        let shard = Shard::new();
        let total = AtomicI64::new(0);

        insert(&shard, &total, "key1", "value1");
        assert!(shard.remove("key1", &total));
        assert!(!shard.remove("key1", &total));

        assert_eq!(shard.size.load(Ordering::Relaxed), 0);
        assert_eq!(total.load(Ordering::Relaxed), 0);
        assert_eq!(shard.entry_count(), 0);
    }

    #[test]
    fn test_lookup_expired() {
        let shard = Shard::new();
        let total = AtomicI64::new(0);
        let value = Value::from("v");
        let size = entry_size("k", &value);
        shard.insert("k", value, size, Some(Instant::now()), &total);

        let later = Instant::now() + Duration::from_millis(1);
        assert!(matches!(shard.lookup("k", later), Lookup::Expired));
    }

    #[test]
    fn test_evict_tail_takes_least_recently_used() {
        let shard = Shard::new();
        let total = AtomicI64::new(0);

        insert(&shard, &total, "old", "v");
        insert(&shard, &total, "mid", "v");
        insert(&shard, &total, "new", "v");

        // Touch "old" so "mid" becomes the LRU victim
        shard.touch("old");

        assert!(shard.evict_tail(&total));
        assert!(matches!(shard.lookup("mid", Instant::now()), Lookup::Miss));
        assert!(matches!(shard.lookup("old", Instant::now()), Lookup::Hit(_)));
        assert_eq!(shard.entry_count(), 2);
    }

    #[test]
    fn test_evict_tail_on_empty_shard() {
        let shard = Shard::new();
        let total = AtomicI64::new(0);
        assert!(!shard.evict_tail(&total));
    }

    #[test]
    fn test_sweep_expired_removes_only_expired() {
        let shard = Shard::new();
        let total = AtomicI64::new(0);
        let now = Instant::now();

        let v = Value::from("v");
        shard.insert("dead", v.clone(), entry_size("dead", &v), Some(now), &total);
        shard.insert("live", v.clone(), entry_size("live", &v), None, &total);

        let removed = shard.sweep_expired(now + Duration::from_millis(1), &total);

        assert_eq!(removed, 1);
        assert_eq!(shard.entry_count(), 1);
        assert!(matches!(shard.lookup("live", Instant::now()), Lookup::Hit(_)));
        assert_eq!(shard.size.load(Ordering::Relaxed), shard.recomputed_size());
    }

    #[test]
    fn test_clear_zeroes_shard_size() {
        let shard = Shard::new();
        let total = AtomicI64::new(0);

        insert(&shard, &total, "a", "v");
        insert(&shard, &total, "b", "v");
        shard.clear();

        assert_eq!(shard.entry_count(), 0);
        assert_eq!(shard.size.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_size_matches_recomputed_sum() {
        let shard = Shard::new();
        let total = AtomicI64::new(0);

        for i in 0..20 {
            insert(&shard, &total, &format!("key_{}", i), "some value");
        }
        shard.remove("key_3", &total);
        shard.evict_tail(&total);
        insert(&shard, &total, "key_5", "replacement with a different length");

        assert_eq!(shard.size.load(Ordering::Relaxed), shard.recomputed_size());
    }
}
