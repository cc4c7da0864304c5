//! Cache Store Module
//!
//! The top-level cache: a fixed array of shards, process-wide size and
//! hit/miss counters, memory-budget eviction and the reaper lifecycle.

use std::hash::Hasher;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fnv::FnvHasher;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::error;

use crate::cache::shard::{Lookup, Shard};
use crate::cache::{entry_size, Value};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_reaper;

// == Cache Inner ==
/// Shared cache state behind the [`Cache`] handle.
///
/// Owned jointly by every `Cache` clone, the reaper task and any in-flight
/// expired-entry removals.
#[derive(Debug)]
pub(crate) struct CacheInner {
    pub(crate) config: Config,
    pub(crate) shards: Box<[Shard]>,
    pub(crate) total_size: AtomicI64,
    pub(crate) total_hits: AtomicU64,
    pub(crate) total_miss: AtomicU64,
    closed: AtomicBool,
    stop_tx: watch::Sender<bool>,
    reaper: Mutex<Option<JoinHandle<()>>>,
    runtime: Handle,
}

// == Cache ==
/// Sharded in-memory key/value cache with TTL expiration and LRU eviction.
///
/// Cloning is cheap and every clone operates on the same underlying cache.
/// All operations are safe to call concurrently from any thread; `set`,
/// `get` and `delete` touch exactly one shard and never take a global lock.
///
/// Construction spawns the background reaper and therefore must happen inside
/// a Tokio runtime. [`Cache::close`] stops the reaper and rejects further
/// mutations.
#[derive(Debug, Clone)]
pub struct Cache {
    pub(crate) inner: Arc<CacheInner>,
}

impl Cache {
    // == Constructor ==
    /// Creates a new cache from a validated configuration.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfig`] naming the offending field if
    /// the configuration is invalid.
    pub fn new(config: Config) -> Result<Cache> {
        config.validate()?;

        let shards: Box<[Shard]> = (0..config.shard_count).map(|_| Shard::new()).collect();
        let cleanup_interval = config.cleanup_interval;
        let (stop_tx, stop_rx) = watch::channel(false);

        let inner = Arc::new(CacheInner {
            config,
            shards,
            total_size: AtomicI64::new(0),
            total_hits: AtomicU64::new(0),
            total_miss: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            stop_tx,
            reaper: Mutex::new(None),
            runtime: Handle::current(),
        });

        let reaper = spawn_reaper(inner.clone(), cleanup_interval, stop_rx);
        *inner.reaper.lock() = Some(reaper);

        Ok(Cache { inner })
    }

    // == Set ==
    /// Stores a key-value pair with an optional TTL.
    ///
    /// A TTL of zero (or none) falls back to the configured default TTL; a
    /// cache without a default TTL stores the entry without expiration.
    /// Overwriting an existing key replaces its value, size and expiry and
    /// refreshes its recency. The memory budget is checked after the shard
    /// lock is released; eviction is best-effort, so a write burst may
    /// transiently overshoot the configured limit.
    ///
    /// # Errors
    /// Returns [`CacheError::Closed`] after [`Cache::close`].
    pub fn set(&self, key: &str, value: impl Into<Value>, ttl: Option<Duration>) -> Result<()> {
        if self.inner.is_closed() {
            return Err(CacheError::Closed);
        }

        self.inner.set(key, value.into(), ttl);
        self.inner.evict_if_needed();
        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key, refreshing its recency on a hit.
    ///
    /// Returns `None` for missing and expired keys, and for any key once the
    /// cache is closed. An expired entry found here is removed by a
    /// fire-and-forget background task so the read path never blocks on the
    /// removal; the removal may race with the reaper, and both are safe.
    pub fn get(&self, key: &str) -> Option<Value> {
        if self.inner.is_closed() {
            return None;
        }

        let shard = self.inner.shard_for(key);

        match shard.lookup(key, Instant::now()) {
            Lookup::Miss => {
                shard.misses.fetch_add(1, Ordering::Relaxed);
                self.inner.total_miss.fetch_add(1, Ordering::Relaxed);
                None
            }
            Lookup::Expired => {
                let inner = self.inner.clone();
                let key = key.to_string();
                self.inner.runtime.spawn(async move {
                    inner.delete(&key);
                });

                shard.misses.fetch_add(1, Ordering::Relaxed);
                self.inner.total_miss.fetch_add(1, Ordering::Relaxed);
                None
            }
            Lookup::Hit(value) => {
                shard.touch(key);
                shard.hits.fetch_add(1, Ordering::Relaxed);
                self.inner.total_hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
        }
    }

    // == Delete ==
    /// Removes a key, returning true if it was present.
    ///
    /// Returns false on a closed cache.
    pub fn delete(&self, key: &str) -> bool {
        if self.inner.is_closed() {
            return false;
        }
        self.inner.delete(key)
    }

    // == Clear ==
    /// Removes all entries from every shard.
    ///
    /// Shards are cleared one at a time, so concurrent observers may see a
    /// partially cleared cache. Hit/miss counters are preserved; use
    /// [`Cache::reset_stats`] to zero them.
    pub fn clear(&self) {
        for shard in self.inner.shards.iter() {
            shard.clear();
        }
        self.inner.total_size.store(0, Ordering::Relaxed);
    }

    // == Close ==
    /// Gracefully shuts down the cache.
    ///
    /// Flips the closed flag, signals the reaper and waits for it to finish.
    /// After the first call every mutating operation fails with
    /// [`CacheError::Closed`] and reads return misses.
    ///
    /// # Errors
    /// Returns [`CacheError::Closed`] if the cache was already closed.
    pub async fn close(&self) -> Result<()> {
        if self
            .inner
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CacheError::Closed);
        }

        let _ = self.inner.stop_tx.send(true);

        let reaper = self.inner.reaper.lock().take();
        if let Some(handle) = reaper {
            if let Err(err) = handle.await {
                error!("Reaper task terminated abnormally: {}", err);
            }
        }

        Ok(())
    }

    /// Returns the configuration this cache was built with.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Recomputed per-shard sizes, for invariant checks.
    #[cfg(test)]
    pub(crate) fn recomputed_shard_sizes(&self) -> Vec<i64> {
        self.inner
            .shards
            .iter()
            .map(|shard| shard.recomputed_size())
            .collect()
    }
}

impl CacheInner {
    // == Hashing ==
    /// FNV-1a over the key bytes, reduced modulo the shard count.
    fn shard_for(&self, key: &str) -> &Shard {
        let mut hasher = FnvHasher::default();
        hasher.write(key.as_bytes());
        let idx = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[idx]
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) {
        let size = entry_size(key, &value);

        let expires_at = match ttl {
            Some(ttl) if ttl > Duration::ZERO => Some(Instant::now() + ttl),
            _ if self.config.default_ttl > Duration::ZERO => {
                Some(Instant::now() + self.config.default_ttl)
            }
            _ => None,
        };

        self.shard_for(key)
            .insert(key, value, size, expires_at, &self.total_size);
    }

    pub(crate) fn delete(&self, key: &str) -> bool {
        if self.is_closed() {
            return false;
        }
        self.shard_for(key).remove(key, &self.total_size)
    }

    // == Eviction ==
    /// Evicts one LRU entry from each of the first `max(1, N/4)` shards when
    /// the process-wide size exceeds the memory budget.
    ///
    /// Runs once per triggering set, not in a loop: sustained write bursts can
    /// transiently overshoot the budget by a small multiple before eviction
    /// catches up.
    fn evict_if_needed(&self) {
        if self.total_size.load(Ordering::Relaxed) <= self.config.max_memory_bytes {
            return;
        }

        let shards_to_evict = (self.shards.len() / 4).max(1);
        for shard in self.shards.iter().take(shards_to_evict) {
            shard.evict_tail(&self.total_size);
        }
    }

    // == Expiry Sweep ==
    /// Removes expired entries from every shard, one shard lock at a time.
    ///
    /// Returns the number of entries removed. Called by the reaper on each
    /// tick; `should_stop` is consulted between shards so cancellation does
    /// not have to wait out a full sweep. `get` additionally drops expired
    /// entries lazily, so the sweep only bounds worst-case stale-memory
    /// residency.
    pub(crate) fn remove_expired(&self, should_stop: impl Fn() -> bool) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        for shard in self.shards.iter() {
            if should_stop() {
                break;
            }
            removed += shard.sweep_expired(now, &self.total_size);
        }

        removed
    }
}
