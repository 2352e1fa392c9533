//! Twin Resolution Module
//!
//! Maps node ids to twin ids through the directory, keeping answers in a
//! short-lived in-memory cache.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::TtlStore;
use crate::directory::Directory;
use crate::error::{ProxyError, Result};
use crate::node::{NodeId, TwinId};

// == Twin Cache ==
/// In-memory node id → twin id cache.
///
/// Entries stop being served once their TTL elapses; the purge task spawned
/// over [`TwinCache::inner`] removes them on its own schedule.
#[derive(Debug, Clone, Default)]
pub struct TwinCache {
    inner: Arc<RwLock<TtlStore<TwinId>>>,
}

impl TwinCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the underlying map, for the purge task.
    pub fn inner(&self) -> Arc<RwLock<TtlStore<TwinId>>> {
        self.inner.clone()
    }

    pub async fn get(&self, node_id: NodeId) -> Option<TwinId> {
        self.inner.write().await.get(&node_id.to_string())
    }

    pub async fn insert(&self, node_id: NodeId, twin: TwinId, ttl: Duration) {
        self.inner.write().await.set(node_id.to_string(), twin, ttl);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

// == Twin Resolver ==
/// Resolves a node's twin id, cache first, directory on miss.
#[derive(Clone)]
pub struct TwinResolver {
    directory: Arc<dyn Directory>,
    cache: TwinCache,
    ttl: Duration,
}

impl TwinResolver {
    pub fn new(directory: Arc<dyn Directory>, cache: TwinCache, ttl: Duration) -> Self {
        Self {
            directory,
            cache,
            ttl,
        }
    }

    // == Resolve ==
    /// Returns the twin id of `node_id`.
    ///
    /// The first directory match wins. Nothing is cached when the directory
    /// fails or knows no such node.
    ///
    /// # Errors
    /// - [`ProxyError::NotFound`] when the directory has no record
    /// - [`ProxyError::Query`] when the directory call fails
    pub async fn resolve(&self, node_id: NodeId) -> Result<TwinId> {
        if let Some(twin) = self.cache.get(node_id).await {
            debug!(node_id, twin_id = twin, "Twin cache hit");
            return Ok(twin);
        }

        let records = self.directory.node_twins(node_id).await?;
        let twin = records
            .first()
            .map(|record| record.twin_id)
            .ok_or(ProxyError::NotFound(node_id))?;

        self.cache.insert(node_id, twin, self.ttl).await;
        debug!(node_id, twin_id = twin, "Twin resolved from directory");
        Ok(twin)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticDirectory;

    fn resolver(directory: Arc<StaticDirectory>, ttl: Duration) -> (TwinResolver, TwinCache) {
        let cache = TwinCache::new();
        (TwinResolver::new(directory, cache.clone(), ttl), cache)
    }

    #[tokio::test]
    async fn test_resolve_queries_directory_once_within_ttl() {
        let directory = Arc::new(StaticDirectory::new([(1, 101)]));
        let (resolver, _) = resolver(directory.clone(), Duration::from_secs(600));

        for _ in 0..5 {
            assert_eq!(resolver.resolve(1).await.unwrap(), 101);
        }

        assert_eq!(directory.twin_queries(), 1);
    }

    #[tokio::test]
    async fn test_resolve_unknown_node_caches_nothing() {
        let directory = Arc::new(StaticDirectory::new([(1, 101)]));
        let (resolver, cache) = resolver(directory.clone(), Duration::from_secs(600));

        let result = resolver.resolve(2).await;

        assert!(matches!(result, Err(ProxyError::NotFound(2))));
        assert!(cache.is_empty().await);

        // A second attempt goes back to the directory
        let _ = resolver.resolve(2).await;
        assert_eq!(directory.twin_queries(), 2);
    }

    #[tokio::test]
    async fn test_resolve_directory_failure_is_query_error() {
        let directory = Arc::new(StaticDirectory::new([(1, 101)]));
        directory.set_failing(true);
        let (resolver, cache) = resolver(directory, Duration::from_secs(600));

        let result = resolver.resolve(1).await;

        assert!(matches!(result, Err(ProxyError::Query(_))));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_resolve_requeries_after_expiry() {
        let directory = Arc::new(StaticDirectory::new([(1, 101)]));
        let (resolver, _) = resolver(directory.clone(), Duration::from_millis(30));

        resolver.resolve(1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        resolver.resolve(1).await.unwrap();

        assert_eq!(directory.twin_queries(), 2);
    }

    #[tokio::test]
    async fn test_resolve_takes_first_match() {
        let directory = Arc::new(StaticDirectory::new([(1, 101)]));
        directory.add_twin(1, 202);
        let (resolver, _) = resolver(directory, Duration::from_secs(600));

        assert_eq!(resolver.resolve(1).await.unwrap(), 101);
    }
}
