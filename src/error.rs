//! Error types for the grid proxy
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::node::{FetchStep, NodeId};

// == Proxy Error Enum ==
/// Unified error type for the grid proxy.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Node is unknown to the directory
    #[error("Node not found: {0}")]
    NotFound(NodeId),

    /// Remote node unreachable, timed out or returned malformed data
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// Directory transport or decode failure
    #[error("Directory query failed: {0}")]
    Query(String),

    /// Cached payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Durable store operation failed
    #[error("Store error: {0}")]
    Store(String),
}

// == Remote Error Enum ==
/// Failure of a single call against a remote node.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Relay could not be reached or answered with a non-success status
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The node answered with an error message
    #[error("node replied with error: {0}")]
    Remote(String),

    /// Reply payload could not be decoded
    #[error("malformed reply: {0}")]
    Decode(String),
}

// == Fetch Error Enum ==
/// Failure of a node data fetch. Never carries partial data.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Twin resolution failed
    #[error(transparent)]
    Resolve(#[from] ProxyError),

    /// One of the node calls failed
    #[error("could not get node {step}: {source}")]
    Call {
        step: FetchStep,
        #[source]
        source: RemoteError,
    },

    /// The node session exceeded its deadline
    #[error("node session timed out after {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    /// True when the node is unknown to the directory.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Resolve(ProxyError::NotFound(_)))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Query(_) | ProxyError::Serialization(_) | ProxyError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the grid proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;
