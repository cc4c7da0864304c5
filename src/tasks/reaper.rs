//! Expiry Reaper Task
//!
//! Background task that periodically sweeps expired entries out of every
//! shard. Expired entries are also dropped lazily on `get`, so the reaper
//! only bounds how long stale entries can occupy memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheInner;

/// Spawns the reaper for a cache.
///
/// The task sleeps for `interval` between sweeps and exits promptly when the
/// stop signal fires; `Cache::close` sends the signal and awaits the returned
/// handle. Each sweep takes one shard write lock at a time, so readers and
/// writers on other shards are never stalled.
pub(crate) fn spawn_reaper(
    cache: Arc<CacheInner>,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("Reaper started with interval of {:?}", interval);

        loop {
            tokio::select! {
                _ = stop.changed() => {
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    let removed = cache.remove_expired(|| *stop.borrow());
                    if removed > 0 {
                        info!("Reaper removed {} expired entries", removed);
                    } else {
                        debug!("Reaper found no expired entries");
                    }
                }
            }
        }

        debug!("Reaper stopped");
    })
}
