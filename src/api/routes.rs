//! API Routes
//!
//! Configures the Axum router with all proxy endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    get_node_handler, health_handler, index_handler, list_nodes_handler, node_status_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /` - Index text
/// - `GET /nodes` - Node ids with their state
/// - `GET /nodes/:node_id` - Node capacity, DMI and hypervisor
/// - `GET /nodes/:node_id/status` - Node state
/// - `GET /stats` - Node cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/nodes", get(list_nodes_handler))
        .route("/nodes/:node_id", get(get_node_handler))
        .route("/nodes/:node_id/status", get(node_status_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
