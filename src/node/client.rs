//! Remote node calls.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RemoteError;
use crate::node::{Capacity, TwinId};

/// The three calls a node answers over the message bus.
///
/// Each call is independent and may fail on its own. Implementations do not
/// retry and do not enforce deadlines; the fetcher bounds the whole session.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Total and used resource counters.
    async fn counters(&self, twin: TwinId) -> Result<Capacity, RemoteError>;

    /// System DMI tables.
    async fn system_dmi(&self, twin: TwinId) -> Result<Value, RemoteError>;

    /// Hypervisor the node runs under, if any.
    async fn system_hypervisor(&self, twin: TwinId) -> Result<Value, RemoteError>;
}
