//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the TTL store and the node cache against
//! arbitrary operation sequences and fleet shapes.

use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{
    node_key, DurableStore, MemoryStore, NodeCache, TtlStore, TwinCache, TwinResolver,
};
use crate::error::ProxyError;
use crate::node::{FetchStep, NodeDataFetcher};
use crate::tasks::FleetWarmer;
use crate::testing::{ScriptedNodeClient, StaticDirectory};

const LONG: Duration = Duration::from_secs(300);

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}"
}

#[derive(Debug, Clone)]
enum StoreOp {
    Set { key: String, value: u32 },
    Get { key: String },
    Purge,
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        (key_strategy(), any::<u32>()).prop_map(|(key, value)| StoreOp::Set { key, value }),
        key_strategy().prop_map(|key| StoreOp::Get { key }),
        Just(StoreOp::Purge),
    ]
}

fn step_strategy() -> impl Strategy<Value = Option<FetchStep>> {
    prop_oneof![
        3 => Just(None),
        1 => Just(Some(FetchStep::Capacity)),
        1 => Just(Some(FetchStep::Dmi)),
        1 => Just(Some(FetchStep::Hypervisor)),
    ]
}

fn failing_step_strategy() -> impl Strategy<Value = FetchStep> {
    prop_oneof![
        Just(FetchStep::Capacity),
        Just(FetchStep::Dmi),
        Just(FetchStep::Hypervisor),
    ]
}

fn build_cache(
    directory: Arc<StaticDirectory>,
    client: Arc<ScriptedNodeClient>,
) -> (NodeCache, MemoryStore) {
    let resolver = TwinResolver::new(directory, TwinCache::new(), LONG);
    let fetcher = NodeDataFetcher::new(resolver, client, Duration::from_secs(5));
    let store = MemoryStore::new(10_000);
    (
        NodeCache::new(Arc::new(store.clone()), fetcher, LONG),
        store,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Without expiry the store behaves like a map where the last write wins.
    #[test]
    fn prop_store_matches_last_write(ops in prop::collection::vec(store_op_strategy(), 1..60)) {
        let mut store = TtlStore::unbounded();
        let mut model: HashMap<String, u32> = HashMap::new();

        for op in ops {
            match op {
                StoreOp::Set { key, value } => {
                    store.set(key.clone(), value, LONG);
                    model.insert(key, value);
                }
                StoreOp::Get { key } => {
                    prop_assert_eq!(store.get(&key), model.get(&key).copied());
                }
                StoreOp::Purge => {
                    prop_assert_eq!(store.purge_expired(), 0);
                }
            }
        }

        prop_assert_eq!(store.len(), model.len());
    }

    // A bounded store never exceeds its capacity.
    #[test]
    fn prop_store_respects_capacity(
        capacity in 1usize..16,
        keys in prop::collection::vec(key_strategy(), 1..64),
    ) {
        let mut store = TtlStore::new(capacity);
        for (i, key) in keys.into_iter().enumerate() {
            store.set(key, i as u32, LONG);
            prop_assert!(store.len() <= capacity);
        }
    }

    // A sweep over K nodes with M failures leaves exactly K - M payloads.
    #[test]
    fn prop_sweep_caches_exactly_successful_nodes(
        plan in prop::collection::vec(step_strategy(), 0..24),
    ) {
        let directory = Arc::new(StaticDirectory::new(
            (0..plan.len() as u32).map(|node_id| (node_id, node_id + 1000)),
        ));
        let client = Arc::new(ScriptedNodeClient::new());
        let mut expected = BTreeSet::new();
        for (node_id, failure) in plan.iter().enumerate() {
            let node_id = node_id as u32;
            match failure {
                Some(step) => client.fail_step(node_id + 1000, *step),
                None => {
                    expected.insert(node_id);
                }
            }
        }

        let (cache, store) = build_cache(directory.clone(), client);
        let warmer = FleetWarmer::new(directory, cache.clone(), LONG);

        tokio_test::block_on(async {
            warmer.sweep().await;

            assert_eq!(store.len().await, expected.len());
            assert_eq!(cache.stats().misses as usize, plan.len());
            for node_id in 0..plan.len() as u32 {
                let cached = store.get(&node_key(node_id)).await.unwrap().is_some();
                assert_eq!(cached, expected.contains(&node_id), "node {node_id}");
            }
        });
    }

    // Any single failing step keeps the node out of the cache.
    #[test]
    fn prop_failed_fetch_is_never_persisted(step in failing_step_strategy()) {
        let directory = Arc::new(StaticDirectory::new([(1, 101)]));
        let client = Arc::new(ScriptedNodeClient::new());
        client.fail_step(101, step);
        let (cache, store) = build_cache(directory, client);

        tokio_test::block_on(async {
            let result = cache.get_or_fetch(1).await;
            assert!(matches!(result, Err(ProxyError::BadGateway(_))));
            assert!(store.is_empty().await);
        });
    }
}
