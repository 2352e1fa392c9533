//! Test doubles for the collaborator traits.
//!
//! In-process stand-ins for the directory, the node relay and the durable
//! store, with call counters and switchable failures. Used by the unit tests
//! and, through the `testing` feature, the integration tests under `tests/`.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::cache::{DurableStore, MemoryStore};
use crate::directory::{Directory, NodeTwin};
use crate::error::{ProxyError, RemoteError, Result};
use crate::node::{Capacity, FetchStep, NodeClient, NodeId, ResourceCapacity, TwinId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// == Static Directory ==
/// Directory answering from a fixed node → twin table.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    twins: Mutex<BTreeMap<NodeId, Vec<TwinId>>>,
    orphans: Mutex<Vec<NodeId>>,
    failing: AtomicBool,
    twin_queries: AtomicUsize,
    list_queries: AtomicUsize,
}

impl StaticDirectory {
    pub fn new(nodes: impl IntoIterator<Item = (NodeId, TwinId)>) -> Self {
        let directory = Self::default();
        for (node_id, twin) in nodes {
            directory.add_twin(node_id, twin);
        }
        directory
    }

    /// Adds a twin record for `node_id`, after any existing ones.
    pub fn add_twin(&self, node_id: NodeId, twin: TwinId) {
        lock(&self.twins).entry(node_id).or_default().push(twin);
    }

    /// Lists `node_id` during enumeration without any twin record for it.
    pub fn add_orphan(&self, node_id: NodeId) {
        lock(&self.orphans).push(node_id);
    }

    /// Makes every query fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of single-node lookups served.
    pub fn twin_queries(&self) -> usize {
        self.twin_queries.load(Ordering::SeqCst)
    }

    /// Number of enumerations served.
    pub fn list_queries(&self) -> usize {
        self.list_queries.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(ProxyError::Query("directory unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn node_twins(&self, node_id: NodeId) -> Result<Vec<NodeTwin>> {
        self.twin_queries.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let twins = lock(&self.twins).get(&node_id).cloned().unwrap_or_default();
        Ok(twins
            .into_iter()
            .map(|twin_id| NodeTwin { twin_id })
            .collect())
    }

    async fn node_ids(&self) -> Result<Vec<NodeId>> {
        self.list_queries.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut ids: Vec<NodeId> = lock(&self.twins).keys().copied().collect();
        ids.extend(lock(&self.orphans).iter().copied());
        ids.sort_unstable();
        Ok(ids)
    }
}

// == Scripted Node Client ==
/// Node client that answers every twin with generated data.
#[derive(Debug, Default)]
pub struct ScriptedNodeClient {
    failures: Mutex<HashMap<TwinId, FetchStep>>,
    used: Mutex<HashMap<TwinId, u64>>,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
}

impl ScriptedNodeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capacity reported by `twin` before any [`bump_used`](Self::bump_used).
    pub fn capacity_for(twin: TwinId) -> Capacity {
        Capacity {
            total: ResourceCapacity {
                cru: 8,
                sru: 512,
                hru: 4096,
                mru: 32,
                ipv4u: u64::from(twin),
            },
            used: ResourceCapacity::default(),
        }
    }

    /// Makes `step` fail for `twin`.
    pub fn fail_step(&self, twin: TwinId, step: FetchStep) {
        lock(&self.failures).insert(twin, step);
    }

    /// Simulates a workload change on the live node.
    pub fn bump_used(&self, twin: TwinId) {
        *lock(&self.used).entry(twin).or_default() += 1;
    }

    /// Delays every call by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = delay;
    }

    /// Total calls received, across all twins and steps.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self, twin: TwinId, step: FetchStep) -> std::result::Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if lock(&self.failures).get(&twin) == Some(&step) {
            return Err(RemoteError::Remote(format!("scripted {step} failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl NodeClient for ScriptedNodeClient {
    async fn counters(&self, twin: TwinId) -> std::result::Result<Capacity, RemoteError> {
        self.enter(twin, FetchStep::Capacity).await?;
        let mut capacity = Self::capacity_for(twin);
        capacity.used.cru = lock(&self.used).get(&twin).copied().unwrap_or_default();
        Ok(capacity)
    }

    async fn system_dmi(&self, twin: TwinId) -> std::result::Result<Value, RemoteError> {
        self.enter(twin, FetchStep::Dmi).await?;
        Ok(json!({ "tooling": { "twin": twin }, "sections": [] }))
    }

    async fn system_hypervisor(&self, twin: TwinId) -> std::result::Result<Value, RemoteError> {
        self.enter(twin, FetchStep::Hypervisor).await?;
        Ok(json!("kvm"))
    }
}

// == Flaky Store ==
/// Memory store whose reads and writes can be switched to fail.
#[derive(Debug)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DurableStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ProxyError::Store("read refused".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ProxyError::Store("write refused".to_string()));
        }
        self.inner.set(key, value, ttl).await
    }
}
