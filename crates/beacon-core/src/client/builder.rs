//! Builder pattern for constructing `BeaconClient` with flexible configuration.

use super::{errors::BuilderError, BeaconClient};
use crate::{
    backend::{BeaconNode, HttpNode},
    cache::SingleFlight,
    config::AppConfig,
    dispatch::{DispatchConfig, DispatchEngine},
    registry::CapabilityRegistry,
};
use std::sync::Arc;

/// Builder for constructing a [`BeaconClient`].
///
/// # Examples
///
/// ```no_run
/// # use beacon_core::{client::BeaconClientBuilder, config::AppConfig};
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AppConfig::load()?;
/// let client = BeaconClientBuilder::from_config(&config)?.build();
/// # Ok(())
/// # }
/// ```
pub struct BeaconClientBuilder {
    dispatch_config: DispatchConfig,
    registry: Option<Arc<CapabilityRegistry>>,
    backends: Vec<(Arc<str>, Arc<dyn BeaconNode>)>,
}

impl BeaconClientBuilder {
    /// Creates a new builder with default settings and no backends.
    #[must_use]
    pub fn new() -> Self {
        Self { dispatch_config: DispatchConfig::default(), registry: None, backends: Vec::new() }
    }

    /// Creates a builder with one [`HttpNode`] per configured backend, in configuration order.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::InvalidConfig` if the configuration fails validation.
    /// Returns `BuilderError::Backend` if an HTTP node cannot be initialized.
    pub fn from_config(config: &AppConfig) -> Result<Self, BuilderError> {
        config.validate().map_err(BuilderError::InvalidConfig)?;

        let mut builder = Self::new().dispatch_config(config.dispatch.clone());
        for backend in &config.backends {
            let node = HttpNode::new(backend.to_http_config()).map_err(|source| {
                BuilderError::Backend { identity: backend.identity().to_string(), source }
            })?;
            builder = builder.backend(backend.identity(), Arc::new(node));
        }
        Ok(builder)
    }

    #[must_use]
    pub fn dispatch_config(mut self, config: DispatchConfig) -> Self {
        self.dispatch_config = config;
        self
    }

    /// Uses an existing registry instead of creating a new one.
    #[must_use]
    pub fn registry(mut self, registry: Arc<CapabilityRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Adds a backend, registered in call order when the client is built.
    #[must_use]
    pub fn backend(mut self, identity: impl Into<Arc<str>>, node: Arc<dyn BeaconNode>) -> Self {
        self.backends.push((identity.into(), node));
        self
    }

    /// Builds the `BeaconClient`, registering every added backend.
    #[must_use]
    pub fn build(self) -> BeaconClient {
        let registry = self.registry.unwrap_or_default();
        for (identity, node) in self.backends {
            registry.register(identity, node);
        }

        let engine = Arc::new(DispatchEngine::new(Arc::clone(&registry), self.dispatch_config));

        BeaconClient {
            registry,
            engine,
            spec_cache: SingleFlight::new(),
            genesis_cache: SingleFlight::new(),
        }
    }
}

impl Default for BeaconClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
