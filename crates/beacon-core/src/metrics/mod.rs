//! Dispatch counters and histograms.
//!
//! Recorded through the `metrics` facade; installing an exporter is left to the embedding
//! process. Capability names are static; backend identities are interned once so label
//! construction does not allocate per attempt.

use crate::backend::{BackendError, Capability};
use metrics::{counter, histogram};
use std::{borrow::Cow, sync::OnceLock, time::Duration};

static BACKEND_NAME_POOL: OnceLock<dashmap::DashMap<String, &'static str>> = OnceLock::new();

// Backend identities come from configuration and are bounded, so the leak is bounded too.
#[inline]
fn backend_to_static(backend: &str) -> Cow<'static, str> {
    let pool = BACKEND_NAME_POOL.get_or_init(dashmap::DashMap::new);

    if let Some(interned) = pool.get(backend) {
        return Cow::Borrowed(*interned);
    }

    let interned = *pool
        .entry(backend.to_string())
        .or_insert_with(|| &*Box::leak(backend.to_string().into_boxed_str()));
    Cow::Borrowed(interned)
}

/// Outcome label of a single backend invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Empty,
    Failure,
}

impl AttemptOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Empty => "empty",
            Self::Failure => "failure",
        }
    }
}

/// Records one backend invocation and its latency.
pub fn record_attempt(
    capability: Capability,
    backend: &str,
    outcome: AttemptOutcome,
    latency: Duration,
) {
    let backend = backend_to_static(backend);
    counter!(
        "beacon_dispatch_attempts_total",
        "capability" => capability.as_str(),
        "backend" => backend.clone(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!(
        "beacon_backend_latency_seconds",
        "capability" => capability.as_str(),
        "backend" => backend
    )
    .record(latency.as_secs_f64());
}

/// Records a per-backend failure that dispatch swallowed or surfaced.
pub fn record_failure(capability: Capability, error: &BackendError) {
    counter!(
        "beacon_dispatch_failures_total",
        "capability" => capability.as_str(),
        "reason" => error.kind().as_str()
    )
    .increment(1);
}

/// Records a dispatch that returned no value, labelled by the reason it failed.
pub fn record_dispatch_error(capability: Capability, reason: &'static str) {
    counter!(
        "beacon_dispatch_errors_total",
        "capability" => capability.as_str(),
        "reason" => reason
    )
    .increment(1);
}

/// Records a single-flight cache lookup.
pub fn record_cache_lookup(key: &'static str, hit: bool) {
    if hit {
        counter!("beacon_cache_hits_total", "key" => key).increment(1);
    } else {
        counter!("beacon_cache_misses_total", "key" => key).increment(1);
    }
}
