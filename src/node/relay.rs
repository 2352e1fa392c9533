//! Message relay client.
//!
//! Nodes are addressed by twin id. Each call is wrapped in a message-bus
//! envelope and posted to the relay at `POST <relay>/twin/<twin_id>`; the relay
//! answers with the node's reply envelope. Payloads travel base64-encoded in
//! the `dat` field.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::RemoteError;
use crate::node::{Capacity, NodeClient, TwinId};

const CMD_STATISTICS: &str = "zos.statistics.get";
const CMD_DMI: &str = "zos.system.dmi";
const CMD_HYPERVISOR: &str = "zos.system.hypervisor";

// == Envelope ==
/// Message-bus envelope, request and reply alike.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "ver")]
    pub version: u32,
    #[serde(rename = "uid", default)]
    pub id: String,
    #[serde(rename = "cmd")]
    pub command: String,
    /// Seconds the message stays valid
    #[serde(rename = "exp", default)]
    pub expiration: u64,
    /// Base64 encoded JSON payload
    #[serde(rename = "dat", default)]
    pub data: String,
    #[serde(rename = "dst", default)]
    pub destination: Vec<TwinId>,
    #[serde(rename = "ret", default)]
    pub reply_to: String,
    #[serde(rename = "try", default)]
    pub retry: u32,
    #[serde(rename = "shm", default)]
    pub schema: String,
    /// Unix seconds at send time
    #[serde(rename = "now", default)]
    pub epoch: i64,
    #[serde(rename = "err", default)]
    pub error: String,
}

impl Envelope {
    /// Builds a request envelope with an empty payload.
    pub fn request(command: &str, twin: TwinId, expiration: Duration) -> Self {
        Self {
            version: 1,
            command: command.to_string(),
            expiration: expiration.as_secs(),
            destination: vec![twin],
            schema: "application/json".to_string(),
            epoch: chrono::Utc::now().timestamp(),
            ..Default::default()
        }
    }

    /// Decodes the payload of a reply envelope.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, RemoteError> {
        if !self.error.is_empty() {
            return Err(RemoteError::Remote(self.error.clone()));
        }
        let raw = STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| RemoteError::Decode(format!("invalid base64 payload: {e}")))?;
        serde_json::from_slice(&raw).map_err(|e| RemoteError::Decode(e.to_string()))
    }

    /// Encodes `payload` into the `dat` field.
    #[cfg(test)]
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Result<Self, RemoteError> {
        let raw = serde_json::to_vec(payload).map_err(|e| RemoteError::Decode(e.to_string()))?;
        self.data = STANDARD.encode(raw);
        Ok(self)
    }
}

// == Relay Node Client ==
/// [`NodeClient`] that reaches nodes through an HTTP message relay.
#[derive(Debug, Clone)]
pub struct RelayNodeClient {
    client: reqwest::Client,
    relay_url: String,
    expiration: Duration,
}

impl RelayNodeClient {
    /// `expiration` is stamped on every envelope as its validity window.
    pub fn new(relay_url: impl Into<String>, expiration: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            relay_url: relay_url.into().trim_end_matches('/').to_string(),
            expiration,
        }
    }

    async fn call<T: DeserializeOwned>(&self, twin: TwinId, command: &str) -> Result<T, RemoteError> {
        let url = format!("{}/twin/{}", self.relay_url, twin);
        let request = Envelope::request(command, twin, self.expiration);
        debug!(twin_id = twin, command, "Sending node request");

        let reply: Envelope = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        reply.decode()
    }
}

#[async_trait]
impl NodeClient for RelayNodeClient {
    async fn counters(&self, twin: TwinId) -> Result<Capacity, RemoteError> {
        self.call(twin, CMD_STATISTICS).await
    }

    async fn system_dmi(&self, twin: TwinId) -> Result<Value, RemoteError> {
        self.call(twin, CMD_DMI).await
    }

    async fn system_hypervisor(&self, twin: TwinId) -> Result<Value, RemoteError> {
        self.call(twin, CMD_HYPERVISOR).await
    }
}
