//! TTL Store Module
//!
//! In-memory key/value map where every entry carries its own expiry.
//! Backs both the twin id cache and the in-memory durable store.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::CacheEntry;

// == TTL Store ==
/// In-memory storage with per-entry TTL and an optional capacity bound.
#[derive(Debug)]
pub struct TtlStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl<V: Clone> TtlStore<V> {
    // == Constructor ==
    /// Creates a store holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Creates a store without a capacity bound.
    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    // == Set ==
    /// Stores a value, replacing any previous entry for the key as a whole.
    ///
    /// When full, expired entries are dropped first; if that frees nothing the
    /// entry closest to expiry is evicted.
    pub fn set(&mut self, key: String, value: V, ttl: Duration) {
        if !self.entries.contains_key(&key)
            && self.entries.len() >= self.max_entries
            && self.purge_expired() == 0
        {
            self.evict_soonest();
        }

        self.entries.insert(key, CacheEntry::new(value, ttl));
    }

    // == Get ==
    /// Returns the value if present and not expired.
    ///
    /// An expired entry found here is removed on the spot.
    pub fn get(&mut self, key: &str) -> Option<V> {
        if self.entries.get(key)?.is_expired() {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Contains ==
    /// True when a live entry exists for the key.
    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    // == Purge Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn purge_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before - self.entries.len()
    }

    fn evict_soonest(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.expires_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = victim {
            self.entries.remove(&key);
        }
    }

    // == Length ==
    /// Number of stored entries, expired ones not yet purged included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for TtlStore<V> {
    fn default() -> Self {
        Self::unbounded()
    }
}
