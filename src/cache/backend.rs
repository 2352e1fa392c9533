//! Durable Store Backends
//!
//! The node cache persists payloads through [`DurableStore`]. Two backends
//! ship with the crate: an in-process [`MemoryStore`] and [`HttpStore`], which
//! talks to a remote key/value server over its `PUT /set` and `GET /get/:key`
//! endpoints.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::RwLock;

use crate::cache::TtlStore;
use crate::error::{ProxyError, Result};
use crate::models::{SetRequest, StoredValue};

// == Durable Store Trait ==
/// Key/value store with per-key TTL.
///
/// Writes always replace a key as a whole; implementations must be safe to
/// share across tasks.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Returns the stored value, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;
}

// == Memory Store ==
/// Durable store kept in process memory.
///
/// Contents do not survive a restart. Expired entries are dropped lazily on
/// read and by the purge task spawned over [`MemoryStore::inner`].
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<TtlStore<String>>>,
}

impl MemoryStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(TtlStore::new(max_entries))),
        }
    }

    /// Shared handle to the underlying map, for the purge task.
    pub fn inner(&self) -> Arc<RwLock<TtlStore<String>>> {
        self.inner.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        // Write lock: expired entries are removed on read
        let mut store = self.inner.write().await;
        Ok(store.get(key))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut store = self.inner.write().await;
        store.set(key.to_string(), value, ttl);
        Ok(())
    }
}

// == HTTP Store ==
/// Durable store backed by a remote key/value server.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::Store(format!("failed to build store client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DurableStore for HttpStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let url = format!("{}/get/{}", self.base_url, key);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProxyError::Store(format!("GET {url}: {e}")))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let stored: StoredValue = response
                    .json()
                    .await
                    .map_err(|e| ProxyError::Store(format!("GET {url}: {e}")))?;
                Ok(Some(stored.value))
            }
            status => Err(ProxyError::Store(format!("GET {url}: status {status}"))),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let url = format!("{}/set", self.base_url);
        let body = SetRequest {
            key: key.to_string(),
            value,
            ttl: Some(ttl.as_secs().max(1)),
        };
        let response = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProxyError::Store(format!("PUT {url}: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProxyError::Store(format!(
                "PUT {url}: status {}",
                response.status()
            )))
        }
    }
}
