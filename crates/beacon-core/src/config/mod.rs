//! Application configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: Hardcoded in struct `Default` implementations
//! 2. **Config file**: TOML file specified by `BEACON_CONFIG` env var
//! 3. **Environment variables**: `BEACON__SECTION__FIELD` env vars override specific fields
//!
//! # Configuration Sections
//!
//! - [`BackendConfig`]: beacon node endpoints, timeouts and declared capabilities
//! - [`DispatchConfig`]: default strategy, best-of-N fan-out and per-backend timeout
//! - [`LoggingConfig`]: Log level and format
//!
//! # Example
//!
//! ```toml
//! [dispatch]
//! strategy = "first_success"
//! backend_timeout_ms = 5000
//!
//! [[backends]]
//! address = "http://localhost:5052"
//! name = "lighthouse"
//! capabilities = ["fork", "spec", "genesis"]
//! ```

use crate::{
    backend::{Capability, CapabilitySet, HttpNodeConfig},
    dispatch::DispatchConfig,
};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::Path, time::Duration};

/// One beacon node endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the node's REST API. Must start with `http` or `https`.
    pub address: String,

    /// Identity override. Defaults to the address.
    #[serde(default)]
    pub name: Option<String>,

    /// Request timeout in seconds. Defaults to `10`.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Maximum concurrent requests to this node. Defaults to `64`.
    #[serde(default = "default_concurrent_limit")]
    pub concurrent_limit: usize,

    /// Query kinds served by this node. Defaults to all of them.
    #[serde(default)]
    pub capabilities: Option<Vec<Capability>>,
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_concurrent_limit() -> usize {
    64
}

impl BackendConfig {
    /// Creates an endpoint with default limits and every capability.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
            timeout_seconds: default_timeout_seconds(),
            concurrent_limit: default_concurrent_limit(),
            capabilities: None,
        }
    }

    /// Identity the backend is registered under.
    #[must_use]
    pub fn identity(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }

    #[must_use]
    pub fn capability_set(&self) -> CapabilitySet {
        match &self.capabilities {
            Some(capabilities) => capabilities.iter().copied().collect(),
            None => CapabilitySet::all(),
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Converts this endpoint to an [`HttpNodeConfig`].
    #[must_use]
    pub fn to_http_config(&self) -> HttpNodeConfig {
        HttpNodeConfig {
            address: self.address.clone(),
            timeout: self.timeout(),
            concurrent_limit: self.concurrent_limit,
            capabilities: self.capability_set(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (`trace`, `debug`, `info`, `warn`, `error`), overridden by `RUST_LOG`.
    pub level: String,

    /// Output format: `pretty` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Beacon node endpoints in priority order.
    #[serde(default)]
    pub backends: Vec<BackendConfig>,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backends: vec![BackendConfig::new("http://localhost:5052")],
            dispatch: DispatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// Environment variables with the `BEACON__` prefix can override any configuration value.
    /// Use `__` as a separator for nested fields (e.g., `BEACON__DISPATCH__STRATEGY=best_of_n`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_builder = Config::builder()
            .set_default("dispatch.strategy", "first_success")?
            .set_default("dispatch.best_of_limit", 3)?
            .set_default("dispatch.backend_timeout_ms", 5000)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("BEACON").separator("__"))
            .build()?;

        config_builder.try_deserialize()
    }

    /// Loads configuration from `config/config.toml`.
    ///
    /// The config file path can be overridden using the `BEACON_CONFIG` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("BEACON_CONFIG").unwrap_or_else(|_| "config/config.toml".to_string());
        Self::from_file(&config_path)
    }

    /// Validates the configuration for correctness and consistency.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.backends.is_empty() {
            return Err("No beacon node backends configured".to_string());
        }

        let mut identities = HashSet::new();
        for backend in &self.backends {
            if !backend.address.starts_with("http") {
                return Err(format!(
                    "Invalid address for backend {}: {}",
                    backend.identity(),
                    backend.address
                ));
            }
            if !identities.insert(backend.identity()) {
                return Err(format!("Duplicate backend identity: {}", backend.identity()));
            }
            if backend.timeout_seconds == 0 {
                return Err(format!(
                    "Timeout must be greater than 0 for backend {}",
                    backend.identity()
                ));
            }
            if backend.concurrent_limit == 0 {
                return Err(format!(
                    "Concurrent limit must be greater than 0 for backend {}",
                    backend.identity()
                ));
            }
        }

        if self.dispatch.backend_timeout_ms == 0 {
            return Err("Dispatch backend timeout must be greater than 0".to_string());
        }

        if self.dispatch.best_of_limit == 0 {
            return Err("Best-of limit must be greater than 0".to_string());
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err("Logging format must be 'json' or 'pretty'".to_string());
        }

        Ok(())
    }
}
