//! Shardcache - A sharded in-memory key/value cache
//!
//! High-throughput cache with per-entry TTL expiration, per-shard LRU
//! eviction under a process-wide memory budget, and a background reaper for
//! expired entries. A demonstration HTTP server built on the cache lives in
//! the [`api`] module.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{Cache, CacheStats, MemoryInfo, PerformanceMetrics, ShardStats, Value};
pub use config::Config;
pub use error::{CacheError, Result};
