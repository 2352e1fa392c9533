//! Node Cache Module
//!
//! Cache-aside access to node payloads kept in the durable store.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::cache::{CacheCounters, CacheStats, DurableStore};
use crate::error::{ProxyError, Result};
use crate::node::{NodeDataFetcher, NodeId};

/// Namespace of node payload keys in the durable store.
pub const NODE_KEY_PREFIX: &str = "GRID3NODE";

/// Durable store key of a node payload.
pub fn node_key(node_id: NodeId) -> String {
    format!("{NODE_KEY_PREFIX}:{node_id}")
}

// == Node Cache ==
/// Read-through cache of node payloads.
///
/// A stored payload is served verbatim until its TTL runs out; it is never
/// checked against the live node. Only complete, successful fetches are
/// written. Concurrent misses for one node may both fetch and both write; the
/// last write wins.
#[derive(Clone)]
pub struct NodeCache {
    store: Arc<dyn DurableStore>,
    fetcher: NodeDataFetcher,
    ttl: Duration,
    counters: Arc<CacheCounters>,
}

impl NodeCache {
    pub fn new(store: Arc<dyn DurableStore>, fetcher: NodeDataFetcher, ttl: Duration) -> Self {
        Self {
            store,
            fetcher,
            ttl,
            counters: Arc::new(CacheCounters::new()),
        }
    }

    // == Get Or Fetch ==
    /// Returns the JSON payload of `node_id`, fetching it from the node on miss.
    ///
    /// A failed store read counts as a miss. A failed store write after a
    /// successful fetch is logged and the fetched payload is still returned.
    ///
    /// # Errors
    /// - [`ProxyError::NotFound`] when the directory does not know the node
    /// - [`ProxyError::BadGateway`] for any other fetch failure
    /// - [`ProxyError::Serialization`] when the payload cannot be encoded
    pub async fn get_or_fetch(&self, node_id: NodeId) -> Result<String> {
        let key = node_key(node_id);

        match self.store.get(&key).await {
            Ok(Some(payload)) => {
                self.counters.record_hit();
                debug!(node_id, "Node cache hit");
                return Ok(payload);
            }
            Ok(None) => {}
            Err(e) => warn!(node_id, error = %e, "Could not read node cache, fetching"),
        }

        self.counters.record_miss();
        let info = match self.fetcher.fetch(node_id).await {
            Ok(info) => info,
            Err(e) if e.is_not_found() => {
                self.counters.record_fetch_failure();
                return Err(ProxyError::NotFound(node_id));
            }
            Err(e) => {
                self.counters.record_fetch_failure();
                warn!(node_id, error = %e, "Could not fetch node data");
                return Err(ProxyError::BadGateway(e.to_string()));
            }
        };

        let payload = serde_json::to_string(&info).map_err(|e| {
            error!(node_id, error = %e, "Could not marshal node info");
            ProxyError::from(e)
        })?;

        if let Err(e) = self.store.set(&key, payload.clone(), self.ttl).await {
            self.counters.record_store_failure();
            warn!(node_id, error = %e, "Could not cache node data");
        }

        Ok(payload)
    }

    // == Contains ==
    /// True when a payload for `node_id` is currently stored. Never fetches.
    pub async fn contains(&self, node_id: NodeId) -> Result<bool> {
        Ok(self.store.get(&node_key(node_id)).await?.is_some())
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}
