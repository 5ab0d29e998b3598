//! Compute-once cache with request coalescing.

use dashmap::{mapref::entry::Entry, DashMap};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::{future::Future, hash::Hash, sync::Arc};
use tracing::{debug, trace};

type Flight<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

/// Per-key compute-once cache.
///
/// The first caller for a key starts the computation; concurrent callers for the same key
/// await that same flight and all receive its outcome. A successful value is stored for the
/// lifetime of the cache. A failure is handed to every waiter of the flight that produced it
/// and is never stored, so a later call computes again.
///
/// Every flight is driven by its own task. Dropping all waiters does not pause it: it runs
/// to completion (or to whatever timeout bounds `compute`), publishes a success and retires.
///
/// # Lock discipline
///
/// `DashMap` entry references are never held across an await point. The values map is only
/// ever locked while the in-flight shard lock is held, never the other way around.
pub struct SingleFlight<K, V, E> {
    values: Arc<DashMap<K, V>>,
    inflight: Arc<DashMap<K, Flight<V, E>>>,
}

impl<K, V, E> Default for SingleFlight<K, V, E>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self { values: Arc::new(DashMap::new()), inflight: Arc::new(DashMap::new()) }
    }
}

impl<K, V, E> SingleFlight<K, V, E>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored value for `key`, running `compute` if this is the first caller.
    ///
    /// `compute` is only invoked when no value is stored and no flight is in progress; it
    /// runs on a spawned task, outside every map lock. Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the error produced by the flight this caller joined.
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        if let Some(value) = self.get(&key) {
            trace!(key = ?key, "single-flight hit");
            return Ok(value);
        }

        let (flight, started) = match self.inflight.entry(key.clone()) {
            Entry::Occupied(entry) => {
                debug!(key = ?key, "joining in-flight computation");
                (entry.get().clone(), false)
            }
            Entry::Vacant(entry) => {
                // A flight may have published and retired between the fast path and the lock.
                if let Some(value) = self.get(&key) {
                    return Ok(value);
                }
                debug!(key = ?key, "starting computation");
                let flight = async move { compute().await }.boxed().shared();
                entry.insert(flight.clone());
                (flight, true)
            }
        };

        if started {
            let driver = flight.clone();
            let values = Arc::clone(&self.values);
            let inflight = Arc::clone(&self.inflight);
            let key = key.clone();
            tokio::spawn(async move {
                let result = driver.clone().await;
                settle(&values, &inflight, &key, &result, &driver);
            });
        }

        let result = flight.clone().await;
        // The driver settles too; whichever side gets here first publishes.
        settle(&self.values, &self.inflight, &key, &result, &flight);
        result
    }

    /// Returns the stored value for `key` without computing.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.values.get(key).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of computations currently in progress.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }
}

/// Publishes a successful result, then retires `flight` if it is still the current one.
///
/// Publishing first means a new caller always finds either the value or the flight.
fn settle<K, V, E>(
    values: &DashMap<K, V>,
    inflight: &DashMap<K, Flight<V, E>>,
    key: &K,
    result: &Result<V, E>,
    flight: &Flight<V, E>,
) where
    K: Eq + Hash + Clone,
    V: Clone,
{
    if let Ok(value) = result {
        values.entry(key.clone()).or_insert_with(|| value.clone());
    }
    inflight.remove_if(key, |_, current| current.ptr_eq(flight));
}
