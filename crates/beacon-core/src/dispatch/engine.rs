//! Capability-aware dispatch across registered backends.

use super::{
    config::DispatchConfig,
    errors::{Attempt, DispatchError, Dispatched},
    strategy::{Ranking, Strategy},
};
use crate::{
    backend::{BackendError, BackendHandle, Capability},
    metrics::{self, AttemptOutcome},
    registry::CapabilityRegistry,
};
use arc_swap::ArcSwap;
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::{
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Executes one logical query against the backends registered for its capability.
///
/// The engine never mutates the registry: a failing backend stays registered and is tried
/// again on the next call.
///
/// # Lock-Free Config Access
///
/// Configuration is stored in an `ArcSwap` and loaded once per call.
pub struct DispatchEngine {
    registry: Arc<CapabilityRegistry>,
    config: ArcSwap<DispatchConfig>,
}

impl DispatchEngine {
    #[must_use]
    pub fn new(registry: Arc<CapabilityRegistry>, config: DispatchConfig) -> Self {
        Self { registry, config: ArcSwap::from_pointee(config) }
    }

    /// Updates the configuration at runtime.
    pub fn update_config(&self, config: DispatchConfig) {
        self.config.store(Arc::new(config));
        info!("dispatch engine configuration updated");
    }

    #[must_use]
    pub fn get_config(&self) -> DispatchConfig {
        (**self.config.load()).clone()
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Runs `operation` against the backends supporting `capability` under `strategy`.
    ///
    /// `operation` maps one backend handle to a future yielding `Ok(Some(value))`, an explicit
    /// empty answer `Ok(None)`, or a [`BackendError`]. Every invocation is bounded by the
    /// configured backend timeout and abandoned when `cancel` fires.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Unsupported`] if no backend supports `capability`; nothing is called
    /// - [`DispatchError::Backend`] with the verbatim error under pass-through
    /// - [`DispatchError::AllFailed`] if every attempted backend failed
    /// - [`DispatchError::Cancelled`] if `cancel` fired first
    pub async fn execute<T, F, Fut>(
        &self,
        capability: Capability,
        strategy: &Strategy<T>,
        cancel: &CancellationToken,
        operation: F,
    ) -> Result<Dispatched<T>, DispatchError>
    where
        F: Fn(Arc<BackendHandle>) -> Fut,
        Fut: Future<Output = Result<Option<T>, BackendError>>,
    {
        let handles = self.registry.handles_for(capability);
        if handles.is_empty() {
            debug!(capability = %capability, "no backend supports capability");
            metrics::record_dispatch_error(capability, "unsupported");
            return Err(DispatchError::Unsupported { capability });
        }

        let timeout = self.config.load().backend_timeout();
        let start = Instant::now();

        debug!(
            capability = %capability,
            strategy = strategy.name(),
            eligible = handles.len(),
            "dispatching request"
        );

        let run = async {
            match strategy {
                Strategy::PassThrough => {
                    Self::pass_through(capability, &handles[0], timeout, &operation).await
                }
                Strategy::FirstSuccess => {
                    Self::first_success(capability, &handles, timeout, &operation).await
                }
                Strategy::BestOfN { limit, ranking } => {
                    Self::best_of_n(
                        capability,
                        &handles,
                        *limit,
                        ranking.as_ref(),
                        timeout,
                        &operation,
                    )
                    .await
                }
            }
        };

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(DispatchError::Cancelled { capability }),
            result = run => result,
        };

        match &result {
            Ok(dispatched) => debug!(
                capability = %capability,
                backend = %dispatched.backend,
                empty = dispatched.value.is_none(),
                swallowed_failures = dispatched.failures.len(),
                elapsed_ms = start.elapsed().as_millis(),
                "dispatch completed"
            ),
            Err(e) => {
                metrics::record_dispatch_error(capability, e.reason());
                warn!(
                    capability = %capability,
                    strategy = strategy.name(),
                    error = %e,
                    elapsed_ms = start.elapsed().as_millis(),
                    "dispatch failed"
                );
            }
        }

        result
    }

    /// Invokes `operation` once against `handle`, bounded by `timeout`.
    async fn invoke<T, F, Fut>(
        capability: Capability,
        handle: &Arc<BackendHandle>,
        timeout: Duration,
        operation: &F,
    ) -> Result<Option<T>, BackendError>
    where
        F: Fn(Arc<BackendHandle>) -> Fut,
        Fut: Future<Output = Result<Option<T>, BackendError>>,
    {
        let start = Instant::now();
        let result = tokio::time::timeout(timeout, operation(Arc::clone(handle)))
            .await
            .unwrap_or_else(|_| Err(BackendError::Timeout));
        let latency = start.elapsed();

        let outcome = match &result {
            Ok(Some(_)) => AttemptOutcome::Success,
            Ok(None) => AttemptOutcome::Empty,
            Err(_) => AttemptOutcome::Failure,
        };
        metrics::record_attempt(capability, handle.identity(), outcome, latency);

        match &result {
            Ok(_) => debug!(
                capability = %capability,
                backend = %handle.identity(),
                outcome = outcome.as_str(),
                latency_ms = latency.as_millis(),
                "backend attempt completed"
            ),
            Err(e) => {
                metrics::record_failure(capability, e);
                debug!(
                    capability = %capability,
                    backend = %handle.identity(),
                    error = %e,
                    kind = e.kind().as_str(),
                    transient = e.is_transient(),
                    latency_ms = latency.as_millis(),
                    "backend attempt failed"
                );
            }
        }

        result
    }

    async fn pass_through<T, F, Fut>(
        capability: Capability,
        handle: &Arc<BackendHandle>,
        timeout: Duration,
        operation: &F,
    ) -> Result<Dispatched<T>, DispatchError>
    where
        F: Fn(Arc<BackendHandle>) -> Fut,
        Fut: Future<Output = Result<Option<T>, BackendError>>,
    {
        let value = Self::invoke(capability, handle, timeout, operation).await?;
        Ok(Dispatched { value, backend: Arc::clone(handle.identity()), failures: Vec::new() })
    }

    async fn first_success<T, F, Fut>(
        capability: Capability,
        handles: &[Arc<BackendHandle>],
        timeout: Duration,
        operation: &F,
    ) -> Result<Dispatched<T>, DispatchError>
    where
        F: Fn(Arc<BackendHandle>) -> Fut,
        Fut: Future<Output = Result<Option<T>, BackendError>>,
    {
        let mut failures = Vec::new();

        for handle in handles {
            match Self::invoke(capability, handle, timeout, operation).await {
                Ok(value) => {
                    return Ok(Dispatched {
                        value,
                        backend: Arc::clone(handle.identity()),
                        failures,
                    });
                }
                Err(error) => {
                    warn!(
                        capability = %capability,
                        backend = %handle.identity(),
                        error = %error,
                        transient = error.is_transient(),
                        "backend failed, trying next"
                    );
                    failures.push(Attempt { backend: Arc::clone(handle.identity()), error });
                }
            }
        }

        Err(DispatchError::AllFailed { capability, attempts: failures })
    }

    /// Fans out to the first `limit` handles and ranks the answers.
    ///
    /// Waits for every invocation to finish or time out. Answers are ranked in registration
    /// order regardless of completion order. When every successful answer is empty the
    /// earliest empty answer wins.
    async fn best_of_n<T, F, Fut>(
        capability: Capability,
        handles: &[Arc<BackendHandle>],
        limit: usize,
        ranking: &dyn Ranking<T>,
        timeout: Duration,
        operation: &F,
    ) -> Result<Dispatched<T>, DispatchError>
    where
        F: Fn(Arc<BackendHandle>) -> Fut,
        Fut: Future<Output = Result<Option<T>, BackendError>>,
    {
        let selected = &handles[..limit.clamp(1, handles.len())];

        let mut pending: FuturesUnordered<_> = selected
            .iter()
            .enumerate()
            .map(|(index, handle)| async move {
                (index, Self::invoke(capability, handle, timeout, operation).await)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(selected.len());
        while let Some(outcome) = pending.next().await {
            outcomes.push(outcome);
        }
        drop(pending);
        outcomes.sort_by_key(|(index, _)| *index);

        let mut answers: Vec<(usize, Option<T>)> = Vec::new();
        let mut failures = Vec::new();
        for (index, outcome) in outcomes {
            match outcome {
                Ok(value) => answers.push((index, value)),
                Err(error) => {
                    warn!(
                        capability = %capability,
                        backend = %selected[index].identity(),
                        error = %error,
                        transient = error.is_transient(),
                        "backend failed during fan-out"
                    );
                    let backend = Arc::clone(selected[index].identity());
                    failures.push(Attempt { backend, error });
                }
            }
        }

        if answers.is_empty() {
            return Err(DispatchError::AllFailed { capability, attempts: failures });
        }

        let winner = {
            let present: Vec<(usize, &T)> = answers
                .iter()
                .enumerate()
                .filter_map(|(position, (_, value))| value.as_ref().map(|v| (position, v)))
                .collect();
            if present.is_empty() {
                0
            } else {
                let candidates: Vec<&T> = present.iter().map(|(_, value)| *value).collect();
                present[ranking.pick(&candidates).min(present.len() - 1)].0
            }
        };

        let (index, value) = answers.swap_remove(winner);
        debug!(
            capability = %capability,
            backend = %selected[index].identity(),
            answers = answers.len() + 1,
            failures = failures.len(),
            "selected best answer"
        );

        Ok(Dispatched { value, backend: Arc::clone(selected[index].identity()), failures })
    }
}
