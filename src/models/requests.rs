//! Request DTOs sent to the remote key/value store
//!
//! Defines the body of outgoing `PUT /set` requests.

use serde::Serialize;

/// Request body for the remote store SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store
/// - `ttl`: TTL in seconds (the store's default applies when absent)
#[derive(Debug, Clone, Serialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// Optional TTL in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}
