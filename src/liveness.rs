//! Liveness Module
//!
//! Node up/down state as reported by the proxy.
//!
//! This is NOT a health check. A node counts as up while the node cache holds
//! a payload for it: a node that just went offline stays up until its entry
//! expires, and a node whose entry just expired reads as down even if it is
//! reachable.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::cache::NodeCache;
use crate::node::NodeId;

// == Node Status ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Up,
    Down,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::Up => f.write_str("up"),
            NodeStatus::Down => f.write_str("down"),
        }
    }
}

// == Cache Presence Liveness ==
/// Classifies nodes by whether the node cache currently holds their payload.
#[derive(Clone)]
pub struct CachePresenceLiveness {
    cache: NodeCache,
}

impl CachePresenceLiveness {
    pub fn new(cache: NodeCache) -> Self {
        Self { cache }
    }

    /// `Up` iff a payload is cached for `node_id`. A failed lookup is `Down`.
    pub async fn status(&self, node_id: NodeId) -> NodeStatus {
        match self.cache.contains(node_id).await {
            Ok(true) => NodeStatus::Up,
            Ok(false) => NodeStatus::Down,
            Err(e) => {
                debug!(node_id, error = %e, "Cache lookup failed, reporting node down");
                NodeStatus::Down
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::cache::{MemoryStore, TwinCache, TwinResolver};
    use crate::node::NodeDataFetcher;
    use crate::testing::{FlakyStore, ScriptedNodeClient, StaticDirectory};

    fn liveness(ttl: Duration) -> (CachePresenceLiveness, NodeCache, Arc<FlakyStore>) {
        let directory = Arc::new(StaticDirectory::new([(1, 101)]));
        let resolver = TwinResolver::new(directory, TwinCache::new(), Duration::from_secs(600));
        let fetcher = NodeDataFetcher::new(
            resolver,
            Arc::new(ScriptedNodeClient::new()),
            Duration::from_secs(5),
        );
        let store = Arc::new(FlakyStore::new(MemoryStore::new(100)));
        let cache = NodeCache::new(store.clone(), fetcher, ttl);
        (CachePresenceLiveness::new(cache.clone()), cache, store)
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&NodeStatus::Up).unwrap(), r#""up""#);
        assert_eq!(NodeStatus::Down.to_string(), "down");
    }

    #[tokio::test]
    async fn test_never_fetched_is_down() {
        let (liveness, _, _) = liveness(Duration::from_secs(60));
        assert_eq!(liveness.status(1).await, NodeStatus::Down);
    }

    #[tokio::test]
    async fn test_up_after_fetch_down_after_expiry() {
        let (liveness, cache, _) = liveness(Duration::from_millis(40));

        cache.get_or_fetch(1).await.unwrap();
        assert_eq!(liveness.status(1).await, NodeStatus::Up);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(liveness.status(1).await, NodeStatus::Down);
    }

    #[tokio::test]
    async fn test_store_failure_is_down() {
        let (liveness, cache, store) = liveness(Duration::from_secs(60));
        cache.get_or_fetch(1).await.unwrap();

        store.fail_reads(true);
        assert_eq!(liveness.status(1).await, NodeStatus::Down);
    }
}
