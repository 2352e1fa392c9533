//! Node Module
//!
//! Node data types and the fetch path that reads them off a live node.
//!
//! A fetch resolves the node's twin id, then reads capacity counters, DMI and
//! hypervisor information in one bounded session. The result is either a
//! complete [`NodeInfo`] or an error; partial data never leaves this module.

mod client;
mod fetcher;
mod relay;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use client::NodeClient;
pub use fetcher::NodeDataFetcher;
pub use relay::{Envelope, RelayNodeClient};

/// Directory identifier of a node.
pub type NodeId = u32;

/// Message-bus address of a node.
pub type TwinId = u32;

// == Resource Capacity ==
/// Resource counters reported by a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCapacity {
    /// CPU cores
    #[serde(default)]
    pub cru: u64,
    /// SSD bytes
    #[serde(default)]
    pub sru: u64,
    /// HDD bytes
    #[serde(default)]
    pub hru: u64,
    /// Memory bytes
    #[serde(default)]
    pub mru: u64,
    /// Public IPv4 addresses
    #[serde(default)]
    pub ipv4u: u64,
}

// == Capacity ==
/// Total and used resources of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    pub total: ResourceCapacity,
    pub used: ResourceCapacity,
}

// == Node Info ==
/// Cached snapshot of a node: capacity, DMI tables and hypervisor.
///
/// Serialized as `{"capacity": {"total", "used"}, "dmi", "hypervisor"}`.
/// DMI and hypervisor are passed through from the node untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub capacity: Capacity,
    pub dmi: Value,
    pub hypervisor: Value,
}

// == Fetch Step ==
/// The individual calls of a node session, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStep {
    Capacity,
    Dmi,
    Hypervisor,
}

impl fmt::Display for FetchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchStep::Capacity => "capacity",
            FetchStep::Dmi => "DMI info",
            FetchStep::Hypervisor => "hypervisor info",
        };
        f.write_str(name)
    }
}
