//! API Module
//!
//! HTTP handlers and routing for the proxy REST API.
//!
//! # Endpoints
//! - `GET /nodes` - Node ids with their cache-presence state
//! - `GET /nodes/:node_id` - Cached node payload
//! - `GET /nodes/:node_id/status` - Node state
//! - `GET /stats` - Node cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
