//! Directory Module
//!
//! The directory service knows every node of the grid and the twin it is
//! reachable at. The proxy uses it for single-node twin lookups and for
//! enumerating the fleet before a warm sweep.

mod graphql;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::node::{NodeId, TwinId};

pub use graphql::GraphQlDirectory;

// == Node Twin Record ==
/// Directory record carrying a node's twin id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTwin {
    pub twin_id: TwinId,
}

// == Node Id Record ==
/// Directory record carrying only a node id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub node_id: NodeId,
}

// == Directory Trait ==
/// Query access to the node directory.
///
/// Transport and decode failures surface as [`crate::error::ProxyError::Query`].
#[async_trait]
pub trait Directory: Send + Sync {
    /// Records matching `node_id`; empty when the node is unknown.
    async fn node_twins(&self, node_id: NodeId) -> Result<Vec<NodeTwin>>;

    /// Every node id the directory knows about.
    async fn node_ids(&self) -> Result<Vec<NodeId>>;
}
