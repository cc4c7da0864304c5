//! Cache Statistics Module
//!
//! Point-in-time snapshots of cache counters for observability. Each field is
//! an independent atomic read; snapshots are not a consistent cut across
//! counters.

use std::fmt;
use std::sync::atomic::Ordering;

use serde::Serialize;

use crate::cache::Cache;

// == Cache Stats ==
/// Aggregate cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Estimated total size of all entries in bytes
    pub total_size: i64,
    /// Number of entries across all shards
    pub total_entries: u64,
    /// Number of successful retrievals
    pub hit_count: u64,
    /// Number of failed retrievals (missing or expired)
    pub miss_count: u64,
    /// hit_count / (hit_count + miss_count), 0.0 with no operations
    pub hit_ratio: f64,
    /// Human-readable memory usage
    pub memory_usage: String,
    /// Configured shard count
    pub shard_count: usize,
    /// Configured memory budget in bytes
    pub max_memory: i64,
    /// Memory usage as a percentage of the budget
    pub memory_percent: f64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Entries: {}, Memory: {} ({:.1}%), Hit Ratio: {:.2}%, Operations: {}",
            self.total_entries,
            self.memory_usage,
            self.memory_percent,
            self.hit_ratio * 100.0,
            self.hit_count + self.miss_count
        )
    }
}

// == Shard Stats ==
/// Statistics for a single shard.
#[derive(Debug, Clone, Serialize)]
pub struct ShardStats {
    pub shard_id: usize,
    pub entry_count: usize,
    pub size: i64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_ratio: f64,
    pub memory_usage: String,
}

// == Memory Info ==
/// Detailed memory usage breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryInfo {
    pub used: i64,
    pub used_formatted: String,
    pub max: i64,
    pub max_formatted: String,
    /// Remaining budget, clamped at zero during transient overshoot
    pub available: i64,
    pub available_formatted: String,
    pub percent: f64,
    pub shard_sizes: Vec<i64>,
}

// == Performance Metrics ==
/// Derived performance figures, including shard load distribution.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetrics {
    pub total_operations: u64,
    pub hit_rate: f64,
    pub miss_rate: f64,
    pub avg_shard_load: f64,
    pub max_shard_load: usize,
    pub min_shard_load: usize,
    /// Variance of per-shard entry counts around the mean
    pub load_balance: f64,
}

fn ratio(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

// == Byte Formatting ==
/// Formats a byte count as a human-readable string.
pub fn format_bytes(bytes: i64) -> String {
    const UNIT: i64 = 1024;
    if bytes < UNIT {
        return format!("{} B", bytes);
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!("{:.1} {}B", bytes as f64 / div as f64, ['K', 'M', 'G', 'T', 'P', 'E'][exp])
}

// == Snapshot Accessors ==
impl Cache {
    /// Returns an aggregate statistics snapshot.
    ///
    /// The entry count sums the shard indexes under each shard's read lock in
    /// turn; the remaining fields are atomic loads.
    pub fn stats(&self) -> CacheStats {
        let inner = &self.inner;

        let total_entries: u64 = inner
            .shards
            .iter()
            .map(|shard| shard.entry_count() as u64)
            .sum();

        let hits = inner.total_hits.load(Ordering::Relaxed);
        let misses = inner.total_miss.load(Ordering::Relaxed);
        let size = inner.total_size.load(Ordering::Relaxed);
        let max_memory = inner.config.max_memory_bytes;

        CacheStats {
            total_size: size,
            total_entries,
            hit_count: hits,
            miss_count: misses,
            hit_ratio: ratio(hits, misses),
            memory_usage: format_bytes(size),
            shard_count: inner.config.shard_count,
            max_memory,
            memory_percent: size as f64 / max_memory as f64 * 100.0,
        }
    }

    /// Returns per-shard statistics.
    pub fn shard_stats(&self) -> Vec<ShardStats> {
        self.inner
            .shards
            .iter()
            .enumerate()
            .map(|(shard_id, shard)| {
                let entry_count = shard.entry_count();
                let size = shard.size.load(Ordering::Relaxed);
                let hits = shard.hits.load(Ordering::Relaxed);
                let misses = shard.misses.load(Ordering::Relaxed);

                ShardStats {
                    shard_id,
                    entry_count,
                    size,
                    hit_count: hits,
                    miss_count: misses,
                    hit_ratio: ratio(hits, misses),
                    memory_usage: format_bytes(size),
                }
            })
            .collect()
    }

    /// Returns a detailed memory usage snapshot.
    pub fn memory_info(&self) -> MemoryInfo {
        let inner = &self.inner;
        let used = inner.total_size.load(Ordering::Relaxed);
        let max = inner.config.max_memory_bytes;
        let available = (max - used).max(0);

        let shard_sizes = inner
            .shards
            .iter()
            .map(|shard| shard.size.load(Ordering::Relaxed))
            .collect();

        MemoryInfo {
            used,
            used_formatted: format_bytes(used),
            max,
            max_formatted: format_bytes(max),
            available,
            available_formatted: format_bytes(available),
            percent: used as f64 / max as f64 * 100.0,
            shard_sizes,
        }
    }

    /// Returns derived performance metrics.
    ///
    /// Shard loads are read one shard at a time and may not reflect a single
    /// moment; the variance is reported as the load-balance figure.
    pub fn performance_metrics(&self) -> PerformanceMetrics {
        let inner = &self.inner;
        let hits = inner.total_hits.load(Ordering::Relaxed);
        let misses = inner.total_miss.load(Ordering::Relaxed);
        let total = hits + misses;

        let loads: Vec<usize> = inner
            .shards
            .iter()
            .map(|shard| shard.entry_count())
            .collect();

        let total_entries: usize = loads.iter().sum();
        let max_load = loads.iter().copied().max().unwrap_or(0);
        let min_load = loads.iter().copied().min().unwrap_or(0);
        let avg_load = total_entries as f64 / loads.len() as f64;

        let variance = loads
            .iter()
            .map(|&load| {
                let diff = load as f64 - avg_load;
                diff * diff
            })
            .sum::<f64>()
            / loads.len() as f64;

        PerformanceMetrics {
            total_operations: total,
            hit_rate: ratio(hits, misses),
            miss_rate: if total == 0 {
                0.0
            } else {
                misses as f64 / total as f64
            },
            avg_shard_load: avg_load,
            max_shard_load: max_load,
            min_shard_load: min_load,
            load_balance: variance,
        }
    }

    /// Zeroes all hit/miss counters, global and per-shard.
    ///
    /// Sizes and entries are untouched.
    pub fn reset_stats(&self) {
        self.inner.total_hits.store(0, Ordering::Relaxed);
        self.inner.total_miss.store(0, Ordering::Relaxed);

        for shard in self.inner.shards.iter() {
            shard.hits.store(0, Ordering::Relaxed);
            shard.misses.store(0, Ordering::Relaxed);
        }
    }
}
