//! Periodic GC Sweep Task
//!
//! Background task that sweeps the cache root at a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;

/// Spawns a background task that periodically sweeps expired shard files.
///
/// Sweeps walk the filesystem, so each one runs on the blocking pool. The
/// task loops until aborted.
///
/// # Arguments
/// * `cache` - shared reference to the cache store
/// * `sweep_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(CacheStore::open(&config)?);
/// let sweep_handle = spawn_sweep_task(cache.clone(), 60);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(cache: Arc<CacheStore>, sweep_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting GC sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let store = Arc::clone(&cache);
            match tokio::task::spawn_blocking(move || store.gc()).await {
                Ok(removed) if removed > 0 => {
                    info!("Periodic sweep: removed {} expired files", removed)
                }
                Ok(_) => debug!("Periodic sweep: nothing expired"),
                Err(err) => warn!("Periodic sweep failed to run: {}", err),
            }
        }
    })
}
