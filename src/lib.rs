//! Grid Proxy - read-through cache for live node data
//!
//! Serves node capacity, DMI and hypervisor data out of a durable cache,
//! fetching from the node over the message relay on miss, and keeps the cache
//! warm with a periodic sweep over the whole fleet.

pub mod api;
pub mod cache;
pub mod config;
pub mod directory;
pub mod error;
pub mod liveness;
pub mod models;
pub mod node;
pub mod tasks;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api::AppState;
pub use cache::{NodeCache, TwinCache, TwinResolver};
pub use config::Config;
pub use error::{FetchError, ProxyError};
pub use liveness::{CachePresenceLiveness, NodeStatus};
pub use node::{NodeDataFetcher, NodeInfo};
pub use tasks::{spawn_purge_task, FleetWarmer, WarmerHandle};
