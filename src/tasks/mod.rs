//! Background Tasks Module
//!
//! Long-running tasks spawned alongside the cache.
//!
//! # Tasks
//! - Reaper: removes expired entries at the configured cleanup interval

mod reaper;

pub(crate) use reaper::spawn_reaper;
