use super::{
    capability::{Capability, CapabilitySet},
    errors::BackendError,
};
use crate::types::{Fork, Genesis, StateId, SyncState};
use async_trait::async_trait;
use std::{collections::HashMap, fmt, sync::Arc};

/// Flat key/value chain configuration as transmitted by a backend.
pub type RawSpec = HashMap<String, String>;

/// Transport-facing interface of one beacon node connection.
///
/// Implementations declare the query kinds they serve through [`supports`](Self::supports);
/// every query method defaults to [`BackendError::Unsupported`] so a transport only
/// implements what it declares. `Ok(None)` is an explicit "nothing here" answer and is
/// distinct from an error.
#[async_trait]
pub trait BeaconNode: Send + Sync {
    /// Returns `true` if this node implements `capability`.
    fn supports(&self, capability: Capability) -> bool;

    /// Fetches fork information for the given state.
    async fn fork(&self, _state_id: StateId) -> Result<Option<Fork>, BackendError> {
        Err(BackendError::Unsupported(Capability::Fork))
    }

    /// Fetches the raw chain configuration.
    async fn spec(&self) -> Result<RawSpec, BackendError> {
        Err(BackendError::Unsupported(Capability::Spec))
    }

    /// Fetches genesis information, `None` if the chain has not started.
    async fn genesis(&self) -> Result<Option<Genesis>, BackendError> {
        Err(BackendError::Unsupported(Capability::Genesis))
    }

    /// Fetches the node software version.
    async fn node_version(&self) -> Result<String, BackendError> {
        Err(BackendError::Unsupported(Capability::NodeVersion))
    }

    /// Fetches the node synchronization state.
    async fn node_syncing(&self) -> Result<SyncState, BackendError> {
        Err(BackendError::Unsupported(Capability::NodeSyncing))
    }
}

/// A registered backend: identity, connection and the capabilities probed at registration.
///
/// The capability set is fixed for the handle's lifetime; re-registering the identity
/// produces a new handle.
pub struct BackendHandle {
    identity: Arc<str>,
    node: Arc<dyn BeaconNode>,
    capabilities: CapabilitySet,
}

impl BackendHandle {
    /// Creates a handle, probing `node` for every known capability.
    #[must_use]
    pub fn probe(identity: impl Into<Arc<str>>, node: Arc<dyn BeaconNode>) -> Self {
        let capabilities =
            Capability::ALL.into_iter().filter(|capability| node.supports(*capability)).collect();
        Self { identity: identity.into(), node, capabilities }
    }

    #[must_use]
    pub fn identity(&self) -> &Arc<str> {
        &self.identity
    }

    #[must_use]
    pub fn node(&self) -> &Arc<dyn BeaconNode> {
        &self.node
    }

    #[must_use]
    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    #[must_use]
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.supports(capability)
    }
}

impl fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendHandle")
            .field("identity", &self.identity)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}
