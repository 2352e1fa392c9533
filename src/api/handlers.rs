//! API Handlers
//!
//! HTTP request handlers for each proxy endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::cache::NodeCache;
use crate::directory::Directory;
use crate::error::Result;
use crate::liveness::CachePresenceLiveness;
use crate::models::{HealthResponse, NodeStateResponse, StatsResponse};
use crate::node::NodeId;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Read-through node payload cache
    pub cache: NodeCache,
    /// Cache-presence node state
    pub liveness: CachePresenceLiveness,
    /// Node directory, for listing
    pub directory: Arc<dyn Directory>,
}

impl AppState {
    pub fn new(cache: NodeCache, directory: Arc<dyn Directory>) -> Self {
        Self {
            liveness: CachePresenceLiveness::new(cache.clone()),
            cache,
            directory,
        }
    }
}

/// Handler for GET /
pub async fn index_handler() -> &'static str {
    "welcome to grid proxy server, available endpoints [/nodes, /nodes/<node-id>, /nodes/<node-id>/status, /stats, /health]"
}

/// Handler for GET /nodes
///
/// Lists every node id in the directory with its cache-presence state.
pub async fn list_nodes_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<NodeStateResponse>>> {
    let node_ids = state.directory.node_ids().await?;

    let mut nodes = Vec::with_capacity(node_ids.len());
    for node_id in node_ids {
        let status = state.liveness.status(node_id).await;
        nodes.push(NodeStateResponse::new(node_id, status));
    }

    Ok(Json(nodes))
}

/// Handler for GET /nodes/:node_id
///
/// Returns the cached node payload, fetching it from the node on miss.
pub async fn get_node_handler(
    State(state): State<AppState>,
    Path(node_id): Path<NodeId>,
) -> Result<impl IntoResponse> {
    let payload = state.cache.get_or_fetch(node_id).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], payload))
}

/// Handler for GET /nodes/:node_id/status
pub async fn node_status_handler(
    State(state): State<AppState>,
    Path(node_id): Path<NodeId>,
) -> Json<NodeStateResponse> {
    let status = state.liveness.status(node_id).await;
    Json(NodeStateResponse::new(node_id, status))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().into())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::cache::{MemoryStore, TwinCache, TwinResolver};
    use crate::error::ProxyError;
    use crate::liveness::NodeStatus;
    use crate::node::NodeDataFetcher;
    use crate::testing::{ScriptedNodeClient, StaticDirectory};

    fn state() -> AppState {
        let directory = Arc::new(StaticDirectory::new([(1, 101), (2, 102)]));
        let resolver = TwinResolver::new(
            directory.clone(),
            TwinCache::new(),
            Duration::from_secs(600),
        );
        let fetcher = NodeDataFetcher::new(
            resolver,
            Arc::new(ScriptedNodeClient::new()),
            Duration::from_secs(5),
        );
        let cache = NodeCache::new(
            Arc::new(MemoryStore::new(100)),
            fetcher,
            Duration::from_secs(1800),
        );
        AppState::new(cache, directory)
    }

    #[tokio::test]
    async fn test_get_node_then_status_up() {
        let state = state();

        let result = get_node_handler(State(state.clone()), Path(1)).await;
        assert!(result.is_ok());

        let response = node_status_handler(State(state), Path(1)).await;
        assert_eq!(response.state, NodeStatus::Up);
    }

    #[tokio::test]
    async fn test_get_unknown_node() {
        let result = get_node_handler(State(state()), Path(9)).await;
        assert!(matches!(result, Err(ProxyError::NotFound(9))));
    }

    #[tokio::test]
    async fn test_list_nodes_annotates_state() {
        let state = state();
        state.cache.get_or_fetch(2).await.unwrap();

        let response = list_nodes_handler(State(state)).await.unwrap();

        let states: Vec<_> = response.iter().map(|n| (n.node_id, n.state)).collect();
        assert_eq!(states, vec![(1, NodeStatus::Down), (2, NodeStatus::Up)]);
    }

    #[tokio::test]
    async fn test_stats_handler_counts_miss_then_hit() {
        let state = state();
        state.cache.get_or_fetch(1).await.unwrap();
        state.cache.get_or_fetch(1).await.unwrap();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 1);
        assert_eq!(response.misses, 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
