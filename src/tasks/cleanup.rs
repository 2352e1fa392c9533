//! TTL Purge Task
//!
//! Background task that periodically removes expired entries from an
//! in-memory TTL store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::TtlStore;
use crate::tasks::MIN_TASK_INTERVAL;

/// Spawns a background task that purges expired entries every `interval`.
///
/// Reads already skip expired entries; this task only reclaims their memory.
/// The returned handle is aborted during shutdown. An `interval` below
/// [`MIN_TASK_INTERVAL`] is raised to it.
///
/// # Example
/// ```ignore
/// let twins = TwinCache::new();
/// let handle = spawn_purge_task(twins.inner(), Duration::from_secs(900), "twin cache");
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_purge_task<V>(
    store: Arc<RwLock<TtlStore<V>>>,
    interval: Duration,
    name: &'static str,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    let interval = interval.max(MIN_TASK_INTERVAL);
    tokio::spawn(async move {
        info!(store = name, interval_secs = interval.as_secs(), "Starting TTL purge task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut guard = store.write().await;
                guard.purge_expired()
            };

            if removed > 0 {
                info!(store = name, removed, "TTL purge removed expired entries");
            } else {
                debug!(store = name, "TTL purge found no expired entries");
            }
        }
    })
}
