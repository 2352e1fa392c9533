//! Node data fetcher.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::TwinResolver;
use crate::error::FetchError;
use crate::node::{FetchStep, NodeClient, NodeId, NodeInfo};

/// Reads a complete [`NodeInfo`] from a live node.
///
/// The three node calls run one after another inside a single session bounded
/// by `timeout`. The first failure ends the session; nothing is cached here.
#[derive(Clone)]
pub struct NodeDataFetcher {
    resolver: TwinResolver,
    client: Arc<dyn NodeClient>,
    timeout: Duration,
}

impl NodeDataFetcher {
    pub fn new(resolver: TwinResolver, client: Arc<dyn NodeClient>, timeout: Duration) -> Self {
        Self {
            resolver,
            client,
            timeout,
        }
    }

    // == Fetch ==
    /// Resolves the node's twin and reads capacity, DMI and hypervisor.
    ///
    /// # Errors
    /// - [`FetchError::Resolve`] when the twin cannot be resolved
    /// - [`FetchError::Call`] naming the first call that failed
    /// - [`FetchError::Timeout`] when the session outlives its deadline
    pub async fn fetch(&self, node_id: NodeId) -> Result<NodeInfo, FetchError> {
        let twin = self.resolver.resolve(node_id).await?;
        debug!(node_id, twin_id = twin, "Opening node session");

        let session = async {
            let capacity = self
                .client
                .counters(twin)
                .await
                .map_err(|source| FetchError::Call {
                    step: FetchStep::Capacity,
                    source,
                })?;

            let dmi = self
                .client
                .system_dmi(twin)
                .await
                .map_err(|source| FetchError::Call {
                    step: FetchStep::Dmi,
                    source,
                })?;

            let hypervisor = self
                .client
                .system_hypervisor(twin)
                .await
                .map_err(|source| FetchError::Call {
                    step: FetchStep::Hypervisor,
                    source,
                })?;

            Ok::<_, FetchError>(NodeInfo {
                capacity,
                dmi,
                hypervisor,
            })
        };

        tokio::time::timeout(self.timeout, session)
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
    }
}
