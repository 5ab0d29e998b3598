//! Dispatch strategies and result rankings.

use std::{fmt, sync::Arc};

/// Chooses the winner among the successful answers of a best-of-N dispatch.
///
/// Candidates are presented in registration order; `pick` returns an index into the slice,
/// which is never empty.
pub trait Ranking<T>: Send + Sync {
    fn pick(&self, candidates: &[&T]) -> usize;
}

/// Picks the candidate with the greatest key; ties go to the earliest backend.
pub struct HighestBy<F>(pub F);

/// Picks the candidate with the smallest key; ties go to the earliest backend.
pub struct LowestBy<F>(pub F);

/// Picks the value reported by the most backends; ties go to the earliest backend.
pub struct Majority;

impl<T, K, F> Ranking<T> for HighestBy<F>
where
    F: Fn(&T) -> K + Send + Sync,
    K: Ord,
{
    fn pick(&self, candidates: &[&T]) -> usize {
        let mut best = 0;
        for (index, candidate) in candidates.iter().enumerate().skip(1) {
            if (self.0)(*candidate) > (self.0)(candidates[best]) {
                best = index;
            }
        }
        best
    }
}

impl<T, K, F> Ranking<T> for LowestBy<F>
where
    F: Fn(&T) -> K + Send + Sync,
    K: Ord,
{
    fn pick(&self, candidates: &[&T]) -> usize {
        let mut best = 0;
        for (index, candidate) in candidates.iter().enumerate().skip(1) {
            if (self.0)(*candidate) < (self.0)(candidates[best]) {
                best = index;
            }
        }
        best
    }
}

impl<T: PartialEq> Ranking<T> for Majority {
    fn pick(&self, candidates: &[&T]) -> usize {
        let votes = |value: &T| candidates.iter().filter(|other| **other == value).count();

        let mut best = 0;
        let mut best_votes = 0;
        for (index, candidate) in candidates.iter().enumerate() {
            let count = votes(*candidate);
            if count > best_votes {
                best = index;
                best_votes = count;
            }
        }
        best
    }
}

/// How many backends are consulted for one query and how the answer is chosen.
pub enum Strategy<T> {
    /// Invoke the first eligible backend once and return its outcome unchanged.
    PassThrough,
    /// Walk eligible backends in priority order; the first non-error answer wins.
    FirstSuccess,
    /// Invoke the first `limit` eligible backends concurrently and rank the answers.
    BestOfN { limit: usize, ranking: Arc<dyn Ranking<T>> },
}

impl<T> Strategy<T> {
    /// Creates a best-of-N strategy.
    pub fn best_of(limit: usize, ranking: impl Ranking<T> + 'static) -> Self {
        Self::BestOfN { limit, ranking: Arc::new(ranking) }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PassThrough => "pass_through",
            Self::FirstSuccess => "first_success",
            Self::BestOfN { .. } => "best_of_n",
        }
    }
}

impl<T> Clone for Strategy<T> {
    fn clone(&self) -> Self {
        match self {
            Self::PassThrough => Self::PassThrough,
            Self::FirstSuccess => Self::FirstSuccess,
            Self::BestOfN { limit, ranking } => {
                Self::BestOfN { limit: *limit, ranking: Arc::clone(ranking) }
            }
        }
    }
}

impl<T> fmt::Debug for Strategy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BestOfN { limit, .. } => {
                f.debug_struct("BestOfN").field("limit", limit).finish_non_exhaustive()
            }
            other => f.write_str(other.name()),
        }
    }
}
