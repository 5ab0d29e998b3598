//! Typed query surface over the registered backends.
//!
//! [`BeaconClient`] owns the registry, the dispatch engine and the single-flight caches for
//! values that never change during the process lifetime (chain configuration and genesis).
//!
//! # Strategy Selection
//!
//! With exactly one registered backend every query is a pass-through. Otherwise queries use
//! the configured default strategy, except [`node_syncing`](BeaconClient::node_syncing),
//! which always fans out and picks the backend closest to the chain head.

pub mod builder;
pub mod errors;

pub use builder::BeaconClientBuilder;
pub use errors::{BuilderError, ClientError};

use crate::{
    backend::{BackendHandle, BeaconNode, Capability},
    cache::SingleFlight,
    dispatch::{
        DispatchEngine, DispatchError, Dispatched, LowestBy, Majority, Strategy, StrategyKind,
    },
    metrics,
    normalize::{normalize, ChainSpec},
    registry::CapabilityRegistry,
    types::{Fork, Genesis, StateId, SyncState},
};
use std::{future::Future, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

const CHAIN_SPEC_KEY: &str = "chain configuration";
const GENESIS_KEY: &str = "genesis";

/// Strongly-typed beacon API client backed by one or more nodes.
pub struct BeaconClient {
    registry: Arc<CapabilityRegistry>,
    engine: Arc<DispatchEngine>,
    spec_cache: SingleFlight<&'static str, Arc<ChainSpec>, ClientError>,
    genesis_cache: SingleFlight<&'static str, Arc<Genesis>, ClientError>,
}

impl BeaconClient {
    #[must_use]
    pub fn builder() -> BeaconClientBuilder {
        BeaconClientBuilder::new()
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<DispatchEngine> {
        &self.engine
    }

    /// Registers (or re-registers) a backend; see [`CapabilityRegistry::register`].
    pub fn register_backend(
        &self,
        identity: impl Into<Arc<str>>,
        node: Arc<dyn BeaconNode>,
    ) -> Arc<BackendHandle> {
        self.registry.register(identity, node)
    }

    /// Removes a backend. Returns `true` if it was registered.
    pub fn remove_backend(&self, identity: &str) -> bool {
        self.registry.remove(identity)
    }

    /// Returns the strategy for queries without a fixed ranking.
    fn default_strategy<T: PartialEq + 'static>(&self) -> Strategy<T> {
        if self.registry.len() == 1 {
            return Strategy::PassThrough;
        }
        let config = self.engine.get_config();
        match config.strategy {
            StrategyKind::PassThrough => Strategy::PassThrough,
            StrategyKind::FirstSuccess => Strategy::FirstSuccess,
            StrategyKind::BestOfN => Strategy::best_of(config.best_of_limit, Majority),
        }
    }

    /// Fetches fork information for `state_id`.
    ///
    /// Returns `Ok(None)` if the answering backend does not know the state.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Dispatch`] if no backend could answer.
    pub async fn fork(
        &self,
        cancel: &CancellationToken,
        state_id: StateId,
    ) -> Result<Option<Fork>, ClientError> {
        let strategy = self.default_strategy();
        let dispatched = self
            .engine
            .execute(Capability::Fork, &strategy, cancel, |handle| async move {
                handle.node().fork(state_id).await
            })
            .await?;
        Ok(dispatched.value)
    }

    /// Returns the normalized chain configuration, fetched once per client.
    ///
    /// Concurrent callers share one fetch. A failed fetch is not cached. An empty payload is
    /// a valid answer and normalizes to the well-known constants alone.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Dispatch`] if every backend failed, or `Cancelled` if `cancel`
    /// fired before the shared fetch completed.
    pub async fn spec(&self, cancel: &CancellationToken) -> Result<Arc<ChainSpec>, ClientError> {
        let engine = Arc::clone(&self.engine);
        let strategy = self.default_strategy();

        let compute = move || async move {
            let detached = CancellationToken::new();
            let result = engine
                .execute(Capability::Spec, &strategy, &detached, |handle| async move {
                    let raw = handle.node().spec().await?;
                    Ok(Some(Arc::new(normalize(&raw))))
                })
                .await;
            result.map_err(ClientError::from).and_then(|d| required(Capability::Spec, d))
        };

        self.cached(&self.spec_cache, CHAIN_SPEC_KEY, Capability::Spec, cancel, compute).await
    }

    /// Returns genesis information, fetched once per client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::EmptyResponse`] if the chain has not started, otherwise as
    /// [`spec`](Self::spec).
    pub async fn genesis(&self, cancel: &CancellationToken) -> Result<Arc<Genesis>, ClientError> {
        let engine = Arc::clone(&self.engine);
        let strategy = self.default_strategy();

        let compute = move || async move {
            let detached = CancellationToken::new();
            let result = engine
                .execute(Capability::Genesis, &strategy, &detached, |handle| async move {
                    handle.node().genesis().await.map(|genesis| genesis.map(Arc::new))
                })
                .await;
            result.map_err(ClientError::from).and_then(|d| required(Capability::Genesis, d))
        };

        self.cached(&self.genesis_cache, GENESIS_KEY, Capability::Genesis, cancel, compute).await
    }

    /// Fetches the node software version.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Dispatch`] if no backend could answer.
    pub async fn node_version(&self, cancel: &CancellationToken) -> Result<String, ClientError> {
        let strategy = self.default_strategy();
        let dispatched = self
            .engine
            .execute(Capability::NodeVersion, &strategy, cancel, |handle| async move {
                handle.node().node_version().await.map(Some)
            })
            .await?;
        required(Capability::NodeVersion, dispatched)
    }

    /// Fetches the synchronization state of the backend closest to the chain head.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Dispatch`] if no backend could answer.
    pub async fn node_syncing(&self, cancel: &CancellationToken) -> Result<SyncState, ClientError> {
        let strategy = if self.registry.len() == 1 {
            Strategy::PassThrough
        } else {
            let limit = self.engine.get_config().best_of_limit;
            Strategy::best_of(limit, LowestBy(|state: &SyncState| state.sync_distance))
        };

        let dispatched = self
            .engine
            .execute(Capability::NodeSyncing, &strategy, cancel, |handle| async move {
                handle.node().node_syncing().await.map(Some)
            })
            .await?;
        required(Capability::NodeSyncing, dispatched)
    }

    /// Returns the cached chain configuration without fetching.
    #[must_use]
    pub fn cached_spec(&self) -> Option<Arc<ChainSpec>> {
        self.spec_cache.get(&CHAIN_SPEC_KEY)
    }

    /// Returns the cached genesis without fetching.
    #[must_use]
    pub fn cached_genesis(&self) -> Option<Arc<Genesis>> {
        self.genesis_cache.get(&GENESIS_KEY)
    }

    /// Joins or starts the shared computation for `key`.
    ///
    /// The shared computation is not tied to any caller's token; each caller stops waiting
    /// when its own `cancel` fires. The computation runs on its own task until it completes
    /// or the backend timeout abandons it, so a cancelled caller never strands a backend.
    async fn cached<V, F, Fut>(
        &self,
        cache: &SingleFlight<&'static str, V, ClientError>,
        key: &'static str,
        capability: Capability,
        cancel: &CancellationToken,
        compute: F,
    ) -> Result<V, ClientError>
    where
        V: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, ClientError>> + Send + 'static,
    {
        if let Some(value) = cache.get(&key) {
            metrics::record_cache_lookup(key, true);
            return Ok(value);
        }
        metrics::record_cache_lookup(key, false);

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(key, "caller stopped waiting for shared computation");
                Err(DispatchError::Cancelled { capability }.into())
            }
            result = cache.get_or_compute(key, compute) => result,
        }
    }
}

/// Unwraps a mandatory answer.
fn required<T>(capability: Capability, dispatched: Dispatched<T>) -> Result<T, ClientError> {
    dispatched
        .value
        .ok_or(ClientError::EmptyResponse { capability, backend: dispatched.backend })
}
