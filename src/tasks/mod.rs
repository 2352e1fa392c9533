//! Background Tasks Module
//!
//! Contains background tasks that run periodically during proxy operation.
//!
//! # Tasks
//! - TTL Purge: Removes expired entries from in-memory stores
//! - Fleet Warm: Fetches every node into the node cache

use std::time::Duration;

mod cleanup;
mod warmer;

/// Shortest period a background loop runs at; shorter ones are raised to it.
pub(crate) const MIN_TASK_INTERVAL: Duration = Duration::from_millis(10);

pub use cleanup::spawn_purge_task;
pub use warmer::{FleetWarmer, WarmerHandle};
