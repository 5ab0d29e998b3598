//! Capability-indexed registry of active backends.
//!
//! The registry is read on every dispatch and written only when a backend comes online or
//! goes away, so the whole table lives behind an `ArcSwap`: lookups are a lock-free load and
//! writes build a new snapshot with read-copy-update.

use crate::backend::{BackendHandle, BeaconNode, Capability};
use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::{debug, info};

/// Immutable view of the registry at one point in time.
#[derive(Default)]
struct Snapshot {
    /// Handles in registration order.
    handles: Vec<Arc<BackendHandle>>,
    /// Per-capability handles in registration order, indexed by `Capability as usize`.
    by_capability: [Vec<Arc<BackendHandle>>; Capability::COUNT],
}

impl Snapshot {
    fn build(handles: Vec<Arc<BackendHandle>>) -> Self {
        let mut by_capability: [Vec<Arc<BackendHandle>>; Capability::COUNT] =
            Default::default();
        for handle in &handles {
            for capability in handle.capabilities().capabilities() {
                by_capability[capability as usize].push(Arc::clone(handle));
            }
        }
        Self { handles, by_capability }
    }
}

/// Process-wide table of active backends, indexed by capability.
///
/// Membership changes only through [`register`](Self::register) and
/// [`remove`](Self::remove); a failed call never evicts a backend.
pub struct CapabilityRegistry {
    snapshot: ArcSwap<Snapshot>,
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { snapshot: ArcSwap::from_pointee(Snapshot::default()) }
    }

    /// Probes `node` for every known capability and records the result.
    ///
    /// Registering an identity that is already present replaces the previous handle while
    /// keeping its position in the priority order.
    pub fn register(
        &self,
        identity: impl Into<Arc<str>>,
        node: Arc<dyn BeaconNode>,
    ) -> Arc<BackendHandle> {
        let handle = Arc::new(BackendHandle::probe(identity, node));

        self.snapshot.rcu(|current| {
            let mut handles = current.handles.clone();
            match handles.iter().position(|h| h.identity() == handle.identity()) {
                Some(index) => handles[index] = Arc::clone(&handle),
                None => handles.push(Arc::clone(&handle)),
            }
            Snapshot::build(handles)
        });

        info!(
            backend = %handle.identity(),
            capabilities = %handle.capabilities(),
            "registered backend"
        );
        handle
    }

    /// Removes every capability membership of `identity`.
    ///
    /// Returns `true` if the identity was registered.
    pub fn remove(&self, identity: &str) -> bool {
        let previous = self.snapshot.rcu(|current| {
            let handles: Vec<_> = current
                .handles
                .iter()
                .filter(|h| h.identity().as_ref() != identity)
                .cloned()
                .collect();
            Snapshot::build(handles)
        });

        let removed = previous.handles.iter().any(|h| h.identity().as_ref() == identity);
        if removed {
            info!(backend = %identity, "removed backend");
        } else {
            debug!(backend = %identity, "remove requested for unknown backend");
        }
        removed
    }

    /// Returns the handles currently believed to support `capability`, in registration order.
    ///
    /// An empty vector means no backend supports it.
    #[must_use]
    pub fn handles_for(&self, capability: Capability) -> Vec<Arc<BackendHandle>> {
        self.snapshot.load().by_capability[capability as usize].clone()
    }

    /// Returns the handle registered under `identity`.
    #[must_use]
    pub fn get(&self, identity: &str) -> Option<Arc<BackendHandle>> {
        self.snapshot.load().handles.iter().find(|h| h.identity().as_ref() == identity).cloned()
    }

    /// Returns every registered identity in registration order.
    #[must_use]
    pub fn identities(&self) -> Vec<Arc<str>> {
        self.snapshot.load().handles.iter().map(|h| Arc::clone(h.identity())).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.load().handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
