//! Fleet Warm Task
//!
//! Keeps the node cache populated ahead of read traffic by fetching every
//! node the directory knows about, once at start and then on a fixed
//! interval.
//!
//! Sweeps are strictly sequential, one node at a time. That keeps the load on
//! the fleet flat but makes sweep duration grow linearly with fleet size; with
//! every node timing out a sweep takes `fleet size × fetch timeout`. This is
//! the proxy's main scalability bound.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::cache::NodeCache;
use crate::directory::Directory;
use crate::tasks::MIN_TASK_INTERVAL;

// == Fleet Warmer ==
/// Best-effort, fire-and-forget cache warmer.
#[derive(Clone)]
pub struct FleetWarmer {
    directory: Arc<dyn Directory>,
    cache: NodeCache,
    interval: Duration,
}

impl FleetWarmer {
    /// An `interval` below [`MIN_TASK_INTERVAL`] is raised to it.
    pub fn new(directory: Arc<dyn Directory>, cache: NodeCache, interval: Duration) -> Self {
        Self {
            directory,
            cache,
            interval: interval.max(MIN_TASK_INTERVAL),
        }
    }

    // == Sweep ==
    /// Runs `get_or_fetch` for every node in the directory, one at a time.
    ///
    /// Failures, including a failed enumeration, are logged and never stop
    /// the sweep early. Nodes already cached are served from the cache and
    /// cost nothing.
    pub async fn sweep(&self) {
        let node_ids = match self.directory.node_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "Failed to query nodes");
                return;
            }
        };

        let total = node_ids.len();
        let mut failed = 0usize;
        for (i, node_id) in node_ids.into_iter().enumerate() {
            debug!(node_id, "{}/{}: fetching node", i + 1, total);
            if let Err(e) = self.cache.get_or_fetch(node_id).await {
                failed += 1;
                error!(node_id, error = %e, "Could not fetch node data");
            }
        }

        info!(
            attempted = total,
            failed,
            next_in_secs = self.interval.as_secs(),
            "Fetching nodes completed"
        );
    }

    // == Spawn ==
    /// Starts the warm loop on its own task: one sweep now, then one per
    /// interval. Ticks missed during a long sweep are skipped.
    pub fn spawn(self) -> WarmerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(interval_secs = self.interval.as_secs(), "Fleet warmer started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = stopped(&mut shutdown_rx) => break,
                }

                tokio::select! {
                    _ = self.sweep() => {}
                    _ = stopped(&mut shutdown_rx) => {
                        info!("Abandoning sweep in progress");
                        break;
                    }
                }
            }

            info!("Fleet warmer stopped");
        });

        WarmerHandle { shutdown_tx, join }
    }
}

/// Resolves once shutdown is requested or the handle is gone.
async fn stopped(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

// == Warmer Handle ==
/// Owner of a running warm loop.
///
/// Dropping the handle also stops the loop.
pub struct WarmerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl WarmerHandle {
    /// Signals the loop to stop and waits for it to finish.
    ///
    /// A sweep in progress is abandoned; payloads already written stay.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.join.await {
            warn!(error = %e, "Fleet warmer task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStore, TwinCache, TwinResolver};
    use crate::node::{FetchStep, NodeDataFetcher};
    use crate::testing::{ScriptedNodeClient, StaticDirectory};

    struct Fixture {
        warmer: FleetWarmer,
        directory: Arc<StaticDirectory>,
        client: Arc<ScriptedNodeClient>,
        store: MemoryStore,
        cache: NodeCache,
    }

    fn fixture(nodes: &[(u32, u32)], interval: Duration) -> Fixture {
        let directory = Arc::new(StaticDirectory::new(nodes.iter().copied()));
        let resolver = TwinResolver::new(
            directory.clone(),
            TwinCache::new(),
            Duration::from_secs(600),
        );
        let client = Arc::new(ScriptedNodeClient::new());
        let fetcher = NodeDataFetcher::new(resolver, client.clone(), Duration::from_secs(5));
        let store = MemoryStore::new(1000);
        let cache = NodeCache::new(Arc::new(store.clone()), fetcher, Duration::from_secs(1800));
        Fixture {
            warmer: FleetWarmer::new(directory.clone(), cache.clone(), interval),
            directory,
            client,
            store,
            cache,
        }
    }

    #[tokio::test]
    async fn test_sweep_continues_past_failures() {
        let f = fixture(
            &[(1, 101), (2, 102), (3, 103), (4, 104)],
            Duration::from_secs(1800),
        );
        f.client.fail_step(102, FetchStep::Hypervisor);
        f.client.fail_step(104, FetchStep::Capacity);
        // Known to enumeration but without a twin record
        f.directory.add_orphan(5);

        f.warmer.sweep().await;

        assert_eq!(f.store.len().await, 2);
        assert!(f.cache.contains(1).await.unwrap());
        assert!(!f.cache.contains(2).await.unwrap());
        assert!(f.cache.contains(3).await.unwrap());
        assert_eq!(f.cache.stats().misses, 5);
    }

    #[tokio::test]
    async fn test_sweep_survives_enumeration_failure() {
        let f = fixture(&[(1, 101)], Duration::from_secs(1800));
        f.directory.set_failing(true);

        f.warmer.sweep().await;

        assert!(f.store.is_empty().await);
        assert_eq!(f.client.calls(), 0);
    }

    #[tokio::test]
    async fn test_spawn_sweeps_immediately_and_shuts_down() {
        let f = fixture(&[(1, 101), (2, 102)], Duration::from_secs(3600));

        let handle = f.warmer.clone().spawn();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(f.store.len().await, 2);
        assert_eq!(f.directory.list_queries(), 1);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_spawn_repeats_on_interval() {
        let f = fixture(&[(1, 101)], Duration::from_millis(50));

        let handle = f.warmer.clone().spawn();
        tokio::time::sleep(Duration::from_millis(180)).await;
        handle.shutdown().await;

        assert!(f.directory.list_queries() >= 3);
    }

    #[tokio::test]
    async fn test_zero_interval_still_warms_at_start() {
        let f = fixture(&[(1, 101), (2, 102)], Duration::ZERO);

        let handle = f.warmer.clone().spawn();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(f.store.len().await, 2);
        assert!(f.directory.list_queries() >= 2);

        tokio::time::timeout(Duration::from_millis(500), handle.shutdown())
            .await
            .expect("warm loop should still be running");
    }

    #[tokio::test]
    async fn test_shutdown_abandons_running_sweep() {
        let f = fixture(&[(1, 101), (2, 102)], Duration::from_secs(3600));
        f.client.set_delay(Duration::from_secs(2));

        let handle = f.warmer.clone().spawn();
        tokio::time::sleep(Duration::from_millis(50)).await;

        tokio::time::timeout(Duration::from_millis(500), handle.shutdown())
            .await
            .expect("shutdown should not wait for the sweep");
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_loop() {
        let f = fixture(&[(1, 101)], Duration::from_millis(20));

        let handle = f.warmer.clone().spawn();
        let WarmerHandle { shutdown_tx, join } = handle;
        drop(shutdown_tx);

        tokio::time::timeout(Duration::from_millis(500), join)
            .await
            .expect("loop should stop once its handle is gone")
            .unwrap();
    }
}
