//! Response DTOs
//!
//! Bodies served by the proxy API, plus the remote store's GET reply.

use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::liveness::NodeStatus;
use crate::node::NodeId;

/// Liveness entry of a node (GET /nodes, GET /nodes/:node_id/status)
#[derive(Debug, Clone, Serialize)]
pub struct NodeStateResponse {
    pub node_id: NodeId,
    /// "up" while the node's payload is cached, "down" otherwise
    pub state: NodeStatus,
}

impl NodeStateResponse {
    pub fn new(node_id: NodeId, state: NodeStatus) -> Self {
        Self { node_id, state }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Reads served from the durable store
    pub hits: u64,
    /// Reads that went to the node
    pub misses: u64,
    /// Misses whose fetch failed
    pub fetch_failures: u64,
    /// Fetched payloads that could not be persisted
    pub store_failures: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            fetch_failures: stats.fetch_failures,
            store_failures: stats.store_failures,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Reply of the remote store to `GET /get/:key`
#[derive(Debug, Clone, Deserialize)]
pub struct StoredValue {
    pub key: String,
    pub value: String,
}
