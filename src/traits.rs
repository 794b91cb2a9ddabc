//! Seams between the planner and its collaborators.
//!
//! The planner consumes distances through [`DistanceMatrixProvider`] and tours
//! through [`TourEngine`]. Both are deliberately narrow so that a different
//! distance source or search engine can be dropped in without touching the
//! orchestration code.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crate::model::Coordinate;
use crate::strategy::EngineParameters;

/// Provides a distance matrix for a set of locations.
///
/// The matrix is indexed by the provided location order and holds whole
/// meters.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[Coordinate]) -> Vec<Vec<i64>>;
}

/// Read-only input for a tour engine: integral edge weights. Node 0 is the
/// depot.
#[derive(Debug, Clone)]
pub struct EngineProblem {
    size: usize,
    weights: Vec<i64>,
}

impl EngineProblem {
    /// `weights` is row-major `size * size`.
    pub fn new(size: usize, weights: Vec<i64>) -> Self {
        debug_assert_eq!(weights.len(), size * size);
        Self { size, weights }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn depot(&self) -> usize {
        0
    }

    #[inline]
    pub fn cost(&self, from: usize, to: usize) -> i64 {
        self.weights[from * self.size + to]
    }

    /// Row-major weights.
    pub fn weights(&self) -> &[i64] {
        &self.weights
    }

    /// Cost of a closed walk given as `[0, a, b, ..., 0]`.
    pub fn walk_cost(&self, walk: &[usize]) -> i64 {
        walk.windows(2).map(|w| self.cost(w[0], w[1])).sum()
    }
}

/// How an engine run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// The search finished on its own before the deadline.
    Completed,
    /// The deadline or a cancellation cut the search short.
    LimitReached,
    /// No closed tour exists under the requested configuration.
    Infeasible,
    /// The deadline passed before any tour was found.
    NoSolution,
    /// The engine could not run; `EngineOutcome::detail` says why.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOutcome {
    /// Closed walk `[0, ..., 0]` over every node, if one was found.
    pub tour: Option<Vec<usize>>,
    pub status: EngineStatus,
    pub detail: Option<String>,
}

impl EngineOutcome {
    pub fn found(tour: Vec<usize>, status: EngineStatus) -> Self {
        Self {
            tour: Some(tour),
            status,
            detail: None,
        }
    }

    pub fn infeasible() -> Self {
        Self {
            tour: None,
            status: EngineStatus::Infeasible,
            detail: None,
        }
    }

    pub fn no_solution() -> Self {
        Self {
            tour: None,
            status: EngineStatus::NoSolution,
            detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            tour: None,
            status: EngineStatus::Failed,
            detail: Some(detail.into()),
        }
    }
}

/// Deadline, cancellation flag and best-so-far slot shared between the
/// adapter and a running engine.
///
/// Engines are expected to poll [`SolveContext::should_stop`] and to
/// [`publish`](SolveContext::publish) every improving tour, so the adapter can
/// still return something useful if the engine never comes back.
#[derive(Debug, Clone)]
pub struct SolveContext {
    deadline: Instant,
    cancelled: Arc<AtomicBool>,
    incumbent: Arc<Mutex<Option<(Vec<usize>, i64)>>>,
}

impl SolveContext {
    pub fn new(deadline: Instant) -> Self {
        Self {
            deadline,
            cancelled: Arc::new(AtomicBool::new(false)),
            incumbent: Arc::new(Mutex::new(None)),
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn should_stop(&self) -> bool {
        self.is_cancelled() || Instant::now() >= self.deadline
    }

    /// Record `walk` as the best tour so far if it beats the current one.
    pub fn publish(&self, walk: &[usize], cost: i64) {
        let mut slot = self.incumbent.lock().unwrap_or_else(PoisonError::into_inner);
        let better = slot.as_ref().is_none_or(|(_, best)| cost < *best);
        if better {
            *slot = Some((walk.to_vec(), cost));
        }
    }

    pub fn incumbent(&self) -> Option<(Vec<usize>, i64)> {
        self.incumbent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// An external tour-solving capability.
///
/// Given a problem and parameters, return the best closed tour found before
/// `ctx` says to stop. Implementations may use as many threads as they like
/// internally; the adapter only observes wall-clock time and the outcome.
pub trait TourEngine: Send + Sync {
    fn name(&self) -> &str;

    fn solve(
        &self,
        problem: &EngineProblem,
        params: &EngineParameters,
        ctx: &SolveContext,
    ) -> EngineOutcome;
}
