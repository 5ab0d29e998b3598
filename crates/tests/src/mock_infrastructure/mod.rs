//! Mock Infrastructure for Testing beacon-core
//!
//! Reusable backends for exercising the client and dispatch engine without a live beacon
//! node.
//!
//! ## Components
//!
//! - `MockNode`: scripted in-process backend with call counters, delays and injected failures
//! - `BeaconApiMock`: wraps mockito to serve beacon REST endpoints for `HttpNode`
//! - Test helpers for typed fixtures and their JSON wire forms
//!
//! ## Usage
//!
//! ```ignore
//! use tests::mock_infrastructure::{create_fork_json, BeaconApiMock};
//!
//! let mut mock = BeaconApiMock::new().await;
//! mock.mock_fork("head", create_fork_json(100, 1));
//!
//! // Use mock.url() as the node address
//! ```

pub mod beacon_mock;
pub mod test_helpers;

pub use beacon_mock::BeaconApiMock;
pub use mock_node::MockNode;
pub use test_helpers::*;
