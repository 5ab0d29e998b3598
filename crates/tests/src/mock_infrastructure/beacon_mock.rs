//! Beacon API Mock Builder
//!
//! Wraps mockito to serve the standard beacon REST endpoints the HTTP node talks to.

use mockito::{Mock, Server, ServerGuard};
use serde_json::Value;

use super::test_helpers::envelope;

/// Builder for mock beacon node endpoints.
///
/// Every successful response is wrapped in the `{"data": ...}` envelope.
pub struct BeaconApiMock {
    server: ServerGuard,
    mocks: Vec<Mock>,
}

impl BeaconApiMock {
    /// Creates a new mock with a fresh mockito server.
    pub async fn new() -> Self {
        Self { server: Server::new_async().await, mocks: Vec::new() }
    }

    /// Returns the URL of the mock server.
    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Serves `data` inside the response envelope on `GET path`.
    pub fn mock_data(&mut self, path: &str, data: Value) -> &mut Self {
        self.mock_raw(path, 200, &envelope(data).to_string())
    }

    /// Serves `GET /eth/v1/beacon/states/{state_id}/fork`.
    pub fn mock_fork(&mut self, state_id: &str, fork: Value) -> &mut Self {
        self.mock_data(&format!("/eth/v1/beacon/states/{state_id}/fork"), fork)
    }

    /// Serves `GET /eth/v1/config/spec`.
    pub fn mock_spec(&mut self, spec: Value) -> &mut Self {
        self.mock_data("/eth/v1/config/spec", spec)
    }

    /// Serves `GET /eth/v1/beacon/genesis`.
    pub fn mock_genesis(&mut self, genesis: Value) -> &mut Self {
        self.mock_data("/eth/v1/beacon/genesis", genesis)
    }

    /// Serves `GET /eth/v1/node/version`.
    pub fn mock_version(&mut self, version: &str) -> &mut Self {
        self.mock_data("/eth/v1/node/version", serde_json::json!({ "version": version }))
    }

    /// Serves `GET /eth/v1/node/syncing`.
    pub fn mock_syncing(&mut self, syncing: Value) -> &mut Self {
        self.mock_data("/eth/v1/node/syncing", syncing)
    }

    /// Answers `GET path` with a bare status code and body.
    pub fn mock_status(&mut self, path: &str, status: usize, body: &str) -> &mut Self {
        let mock = self.server.mock("GET", path).with_status(status).with_body(body).create();

        self.mocks.push(mock);
        self
    }

    /// Answers `GET path` with `body` as JSON, without adding the envelope.
    pub fn mock_raw(&mut self, path: &str, status: usize, body: &str) -> &mut Self {
        let mock = self
            .server
            .mock("GET", path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create();

        self.mocks.push(mock);
        self
    }

    /// Verifies all mocks were called.
    #[must_use]
    pub fn verify_all_called(&self) -> bool {
        self.mocks.iter().all(Mock::matched)
    }
}
