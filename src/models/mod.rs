//! Request and Response models
//!
//! DTOs served by the proxy API and exchanged with the remote key/value store.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::SetRequest;
pub use responses::{HealthResponse, NodeStateResponse, StatsResponse, StoredValue};
