use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default dispatch strategy used by the typed client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Single backend, outcome returned unchanged.
    PassThrough,
    /// Backends in priority order until one answers.
    #[default]
    FirstSuccess,
    /// Concurrent fan-out to several backends, best answer wins.
    BestOfN,
}

impl StrategyKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PassThrough => "pass_through",
            Self::FirstSuccess => "first_success",
            Self::BestOfN => "best_of_n",
        }
    }
}

/// Configuration for the dispatch engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Strategy used for queries without a fixed strategy (default: `first_success`)
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Number of backends consulted by best-of-N queries (default: 3)
    #[serde(default = "default_best_of_limit")]
    pub best_of_limit: usize,

    /// Upper bound on a single backend invocation in milliseconds (default: 5000)
    #[serde(default = "default_backend_timeout_ms")]
    pub backend_timeout_ms: u64,
}

fn default_best_of_limit() -> usize {
    3
}

fn default_backend_timeout_ms() -> u64 {
    5000
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            best_of_limit: default_best_of_limit(),
            backend_timeout_ms: default_backend_timeout_ms(),
        }
    }
}

impl DispatchConfig {
    #[must_use]
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }
}
