//! GraphQL directory client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tracing::debug;

use crate::directory::{Directory, NodeRecord, NodeTwin};
use crate::error::{ProxyError, Result};
use crate::node::NodeId;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct NodesData<T> {
    nodes: Vec<T>,
}

/// [`Directory`] backed by the grid's GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct GraphQlDirectory {
    client: reqwest::Client,
    endpoint: String,
}

impl GraphQlDirectory {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::Query(format!("failed to build directory client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    // == Query ==
    /// Posts a GraphQL query and decodes its `data` member.
    async fn query<T: DeserializeOwned>(&self, query: &str) -> Result<T> {
        debug!(endpoint = %self.endpoint, "Querying directory");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| ProxyError::Query(format!("failed to query explorer network: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::Query(format!(
                "explorer network answered with status {status}"
            )));
        }

        let body: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| ProxyError::Query(format!("invalid explorer response: {e}")))?;

        decode_response(body)
    }
}

fn decode_response<T>(body: GraphQlResponse<T>) -> Result<T> {
    match body.data {
        Some(data) => Ok(data),
        None => {
            let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
            Err(ProxyError::Query(format!(
                "explorer returned no data: {}",
                messages.join("; ")
            )))
        }
    }
}

fn node_twin_query(node_id: NodeId) -> String {
    format!("{{ nodes(where: {{nodeId_eq: {node_id}}}) {{ twinId }} }}")
}

const NODE_IDS_QUERY: &str = "{ nodes { nodeId } }";

#[async_trait]
impl Directory for GraphQlDirectory {
    async fn node_twins(&self, node_id: NodeId) -> Result<Vec<NodeTwin>> {
        let data: NodesData<NodeTwin> = self.query(&node_twin_query(node_id)).await?;
        Ok(data.nodes)
    }

    async fn node_ids(&self) -> Result<Vec<NodeId>> {
        let data: NodesData<NodeRecord> = self.query(NODE_IDS_QUERY).await?;
        Ok(data.nodes.into_iter().map(|record| record.node_id).collect())
    }
}
