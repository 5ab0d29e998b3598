//! Reference HTTP transport for the standard beacon node REST API.

use super::{
    capability::{Capability, CapabilitySet},
    errors::BackendError,
    node::{BeaconNode, RawSpec},
};
use crate::types::{Fork, Genesis, StateId, SyncState};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::Semaphore;

/// Error bodies longer than this are truncated before being stored in an error.
const MAX_ERROR_BODY_LEN: usize = 256;

/// Configuration for one HTTP beacon node connection.
#[derive(Debug, Clone)]
pub struct HttpNodeConfig {
    /// Base URL, e.g. `http://localhost:5052`.
    pub address: String,
    /// Per-request timeout, including permit acquisition.
    pub timeout: Duration,
    /// Maximum number of concurrent requests to this node.
    pub concurrent_limit: usize,
    /// Query kinds this node is declared to serve.
    pub capabilities: CapabilitySet,
}

impl HttpNodeConfig {
    /// Creates a configuration with default limits and every capability enabled.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            timeout: Duration::from_secs(10),
            concurrent_limit: 64,
            capabilities: CapabilitySet::all(),
        }
    }
}

/// `{ "data": ... }` envelope wrapping every beacon API response.
#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct VersionData {
    version: String,
}

/// Beacon node reached over the standard REST API.
///
/// Requests are bounded by a per-node semaphore and the configured timeout. No retries are
/// performed here; failover is the dispatch engine's job.
pub struct HttpNode {
    base_url: String,
    client: Client,
    concurrent_limit: Arc<Semaphore>,
    config: HttpNodeConfig,
}

impl HttpNode {
    /// Creates a new HTTP node.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::ConnectionFailed`] if the underlying reqwest client fails to
    /// build.
    pub fn new(config: HttpNodeConfig) -> Result<Self, BackendError> {
        let client = ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.timeout)
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("beacon-mux/", env!("CARGO_PKG_VERSION")))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build http client");
                BackendError::ConnectionFailed(format!("HTTP client build failed: {e}"))
            })?;

        Ok(Self {
            base_url: config.address.trim_end_matches('/').to_string(),
            client,
            concurrent_limit: Arc::new(Semaphore::new(config.concurrent_limit.max(1))),
            config,
        })
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.base_url
    }

    /// Issues a GET request and decodes the `data` field of the response.
    ///
    /// Returns `Ok(None)` on HTTP 404.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, BackendError> {
        let url = format!("{}{path}", self.base_url);

        let _permit = tokio::time::timeout(
            self.config.timeout,
            Arc::clone(&self.concurrent_limit).acquire_owned(),
        )
        .await
        .map_err(|_| {
            tracing::warn!(
                node = %self.base_url,
                available_permits = self.concurrent_limit.available_permits(),
                "http node permit acquisition timeout"
            );
            BackendError::Timeout
        })?
        .map_err(|_| BackendError::ConnectionFailed("node is shutting down".to_string()))?;

        tracing::trace!(url = %url, "http request started");

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| BackendError::from_reqwest(&e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let raw_text = response.text().await.unwrap_or_default();
            let sanitized_text = if raw_text.len() > MAX_ERROR_BODY_LEN {
                let cut = (0..=MAX_ERROR_BODY_LEN)
                    .rev()
                    .find(|i| raw_text.is_char_boundary(*i))
                    .unwrap_or(0);
                format!("{}... (truncated)", &raw_text[..cut])
            } else {
                raw_text
            };
            tracing::trace!(url = %url, status = status.as_u16(), "http request failed");
            return Err(BackendError::Http(status.as_u16(), sanitized_text));
        }

        let body = response.bytes().await.map_err(|e| BackendError::from_reqwest(&e))?;
        let envelope: DataEnvelope<T> = serde_json::from_slice(&body)
            .map_err(|e| BackendError::InvalidResponse(format!("failed to parse {path}: {e}")))?;

        Ok(Some(envelope.data))
    }

    /// Like [`get`](Self::get) but treats 404 as an error.
    async fn get_required<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        self.get(path).await?.ok_or_else(|| BackendError::Http(404, format!("{path} not found")))
    }
}

/// Flattens a spec payload to strings.
///
/// Non-string values (numbers, nested objects such as blob schedules) are kept as their
/// JSON text so a single unexpected entry never fails the whole payload.
fn flatten_spec(data: HashMap<String, serde_json::Value>) -> RawSpec {
    data.into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect()
}

#[async_trait]
impl BeaconNode for HttpNode {
    fn supports(&self, capability: Capability) -> bool {
        self.config.capabilities.supports(capability)
    }

    async fn fork(&self, state_id: StateId) -> Result<Option<Fork>, BackendError> {
        self.get(&format!("/eth/v1/beacon/states/{state_id}/fork")).await
    }

    async fn spec(&self) -> Result<RawSpec, BackendError> {
        let data: HashMap<String, serde_json::Value> =
            self.get_required("/eth/v1/config/spec").await?;
        Ok(flatten_spec(data))
    }

    async fn genesis(&self) -> Result<Option<Genesis>, BackendError> {
        self.get("/eth/v1/beacon/genesis").await
    }

    async fn node_version(&self) -> Result<String, BackendError> {
        let data: VersionData = self.get_required("/eth/v1/node/version").await?;
        Ok(data.version)
    }

    async fn node_syncing(&self) -> Result<SyncState, BackendError> {
        self.get_required("/eth/v1/node/syncing").await
    }
}
