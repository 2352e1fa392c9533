//! Cache Module
//!
//! In-memory TTL storage, twin id resolution, durable store backends and the
//! read-through node payload cache built on top of them.

mod backend;
mod entry;
mod node_cache;
mod stats;
mod store;
mod twin;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use backend::{DurableStore, HttpStore, MemoryStore};
pub use entry::CacheEntry;
pub use node_cache::{node_key, NodeCache, NODE_KEY_PREFIX};
pub use stats::{CacheCounters, CacheStats};
pub use store::TtlStore;
pub use twin::{TwinCache, TwinResolver};
