use crate::backend::{BackendError, Capability};
use std::{fmt, sync::Arc};
use thiserror::Error;

/// One backend's failure during a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub backend: Arc<str>,
    pub error: BackendError,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.backend, self.error)
    }
}

fn join_attempts(attempts: &[Attempt]) -> String {
    attempts.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Errors returned by [`DispatchEngine::execute`](super::DispatchEngine::execute).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No registered backend supports the capability; no backend was called.
    #[error("no backend supports {capability}")]
    Unsupported { capability: Capability },

    /// Pass-through failure, returned exactly as the backend reported it.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Every attempted backend failed. Attempts are listed in call order.
    #[error("all backends failed for {capability}: {}", join_attempts(.attempts))]
    AllFailed { capability: Capability, attempts: Vec<Attempt> },

    /// The caller cancelled the request before a backend answered.
    #[error("{capability} request cancelled")]
    Cancelled { capability: Capability },
}

impl DispatchError {
    /// Per-backend failures carried by this error, empty unless every backend failed.
    #[must_use]
    pub fn attempts(&self) -> &[Attempt] {
        match self {
            Self::AllFailed { attempts, .. } => attempts,
            _ => &[],
        }
    }

    /// Label used for the failure metric.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Unsupported { .. } => "unsupported",
            Self::Backend(_) => "backend",
            Self::AllFailed { .. } => "all_failed",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}

/// Successful dispatch outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched<T> {
    /// The winning answer; `None` when the backend answered "nothing here".
    pub value: Option<T>,
    /// Identity of the backend that produced `value`.
    pub backend: Arc<str>,
    /// Failures swallowed before or beside the winning answer.
    pub failures: Vec<Attempt>,
}

impl<T> Dispatched<T> {
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Dispatched<U> {
        Dispatched { value: self.value.map(f), backend: self.backend, failures: self.failures }
    }
}
