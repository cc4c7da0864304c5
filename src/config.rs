//! Configuration Module
//!
//! Cache configuration with validation and workload presets.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Cache configuration.
///
/// Validated at construction; see [`Config::validate`]. The shard count is
/// fixed for the cache's lifetime.
#[derive(Debug, Clone)]
pub struct Config {
    /// Memory budget in bytes before eviction starts
    pub max_memory_bytes: i64,
    /// Number of shards for concurrent access. Higher values reduce lock
    /// contention but increase memory overhead.
    pub shard_count: usize,
    /// Default TTL for entries stored without an explicit TTL.
    /// Zero means no default expiration.
    pub default_ttl: Duration,
    /// How often the reaper sweeps expired entries
    pub cleanup_interval: Duration,
}

impl Default for Config {
    /// Default configuration tuned for high-throughput workloads:
    /// 512 MiB budget, 1024 shards, 1 hour TTL, 1 minute cleanup.
    fn default() -> Self {
        Self {
            max_memory_bytes: 512 * 1024 * 1024,
            shard_count: 1024,
            default_ttl: Duration::from_secs(3600),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Preset for very high concurrency: 1 GiB budget, 2048 shards,
    /// 30 minute TTL, 30 second cleanup.
    pub fn high_concurrency() -> Self {
        Self {
            max_memory_bytes: 1024 * 1024 * 1024,
            shard_count: 2048,
            default_ttl: Duration::from_secs(30 * 60),
            cleanup_interval: Duration::from_secs(30),
        }
    }

    /// Preset for memory-constrained environments: 64 MiB budget, 256 shards,
    /// 15 minute TTL, 30 second cleanup.
    pub fn low_memory() -> Self {
        Self {
            max_memory_bytes: 64 * 1024 * 1024,
            shard_count: 256,
            default_ttl: Duration::from_secs(15 * 60),
            cleanup_interval: Duration::from_secs(30),
        }
    }

    /// Builds a configuration from custom parameters, with the default
    /// cleanup interval.
    pub fn custom(max_memory_mb: i64, shard_count: usize, default_ttl: Duration) -> Self {
        Self {
            max_memory_bytes: max_memory_mb * 1024 * 1024,
            shard_count,
            default_ttl,
            cleanup_interval: Duration::from_secs(60),
        }
    }

    /// Loads configuration from environment variables, falling back to the
    /// defaults for anything unset or unparsable.
    ///
    /// # Environment Variables
    /// - `MAX_MEMORY_MB` - Memory budget in MiB (default: 512)
    /// - `SHARD_COUNT` - Number of shards (default: 1024)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_memory_bytes: env::var("MAX_MEMORY_MB")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or(defaults.max_memory_bytes),
            shard_count: env::var("SHARD_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.shard_count),
            default_ttl: env::var("DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_ttl),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_interval),
        }
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfig`] naming the offending field:
    /// the memory budget and cleanup interval must be positive, and the
    /// shard count must be between 1 and 65536.
    pub fn validate(&self) -> Result<()> {
        if self.max_memory_bytes <= 0 {
            return Err(CacheError::invalid_config(
                "max_memory_bytes",
                "must be greater than 0",
            ));
        }

        if self.shard_count == 0 {
            return Err(CacheError::invalid_config(
                "shard_count",
                "must be greater than 0",
            ));
        }

        if self.shard_count > 65536 {
            return Err(CacheError::invalid_config(
                "shard_count",
                "must be at most 65536",
            ));
        }

        if self.cleanup_interval.is_zero() {
            return Err(CacheError::invalid_config(
                "cleanup_interval",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}
