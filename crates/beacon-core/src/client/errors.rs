use crate::{
    backend::{BackendError, Capability},
    dispatch::DispatchError,
};
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by [`BeaconClient`](super::BeaconClient) queries.
///
/// `Clone` so a single failed shared computation can be handed to every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A backend answered "nothing here" for a query that always has an answer.
    #[error("backend {backend} returned no {capability}")]
    EmptyResponse { capability: Capability, backend: Arc<str> },
}

impl ClientError {
    /// Returns the dispatch error, if this is one.
    #[must_use]
    pub fn as_dispatch(&self) -> Option<&DispatchError> {
        match self {
            Self::Dispatch(e) => Some(e),
            Self::EmptyResponse { .. } => None,
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Dispatch(DispatchError::Cancelled { .. }))
    }
}

/// Errors that can occur during client construction.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configured backend could not be initialized
    #[error("Failed to initialize backend {identity}: {source}")]
    Backend {
        identity: String,
        #[source]
        source: BackendError,
    },
}
