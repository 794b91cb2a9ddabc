//! Runs a [`TourEngine`] under a hard wall-clock bound.
//!
//! The engine runs on its own thread. The adapter waits at most
//! `time_limit + grace`; if the engine has not answered by then it is told to
//! stop and the adapter falls back to the best tour the engine published, or
//! fails with a timeout. The adapter never blocks past that bound, even if the
//! engine ignores cancellation.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{PlannerError, Result};
use crate::matrix::DistanceMatrix;
use crate::model::SolverStatus;
use crate::strategy::EngineParameters;
use crate::traits::{EngineOutcome, EngineProblem, EngineStatus, SolveContext, TourEngine};

/// A closed walk over matrix indices, `[0, ..., 0]`, visiting every index once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TourSolution {
    pub order: Vec<usize>,
    pub status: SolverStatus,
}

#[derive(Clone)]
pub struct TourSolverAdapter {
    engine: Arc<dyn TourEngine>,
    grace: Duration,
}

impl std::fmt::Debug for TourSolverAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TourSolverAdapter")
            .field("engine", &self.engine.name())
            .field("grace", &self.grace)
            .finish()
    }
}

impl TourSolverAdapter {
    pub fn new(engine: Arc<dyn TourEngine>, grace: Duration) -> Self {
        Self { engine, grace }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn solve(&self, matrix: DistanceMatrix, params: &EngineParameters) -> Result<TourSolution> {
        self.solve_holding(matrix, params, ())
    }

    /// Same as [`solve`](Self::solve), but `guard` moves onto the engine
    /// thread and is dropped only when the engine returns, even after the
    /// adapter has stopped waiting for it.
    pub fn solve_holding<G>(
        &self,
        matrix: DistanceMatrix,
        params: &EngineParameters,
        guard: G,
    ) -> Result<TourSolution>
    where
        G: Send + 'static,
    {
        let size = matrix.size();
        match size {
            0 | 1 => {
                return Err(PlannerError::input(format!(
                    "need at least 2 locations to build a tour, got {size}"
                )));
            }
            2 => {
                tracing::debug!("two locations; skipping the engine");
                return Ok(TourSolution {
                    order: vec![0, 1, 0],
                    status: SolverStatus::Optimal,
                });
            }
            _ => {}
        }

        let problem = Arc::new(matrix.into_engine_problem());
        let started = Instant::now();
        let (deadline, hard_deadline) = deadlines(started, params.time_limit, self.grace)?;
        let ctx = SolveContext::new(deadline);

        tracing::info!(
            engine = self.engine.name(),
            n = size,
            time_limit_s = params.time_limit.as_secs_f64(),
            "solver: start"
        );

        let (tx, rx) = mpsc::channel();
        let engine = Arc::clone(&self.engine);
        let worker_problem = Arc::clone(&problem);
        let worker_params = params.clone();
        let worker_ctx = ctx.clone();
        thread::Builder::new()
            .name("tour-engine".to_string())
            .spawn(move || {
                let outcome = engine.solve(&worker_problem, &worker_params, &worker_ctx);
                drop(guard);
                // the receiver is gone if the adapter already gave up
                let _ = tx.send(outcome);
            })
            .map_err(|e| PlannerError::engine(format!("failed to start engine thread: {e}")))?;

        let wait = hard_deadline.saturating_duration_since(Instant::now());
        let solution = match rx.recv_timeout(wait) {
            Ok(outcome) => self.finish(&problem, outcome, params),
            Err(RecvTimeoutError::Timeout) => {
                ctx.cancel();
                tracing::warn!(
                    engine = self.engine.name(),
                    waited_ms = started.elapsed().as_millis() as u64,
                    "engine did not return before the hard deadline; using best published tour"
                );
                match ctx.incumbent() {
                    Some((order, _)) => {
                        validate_tour(&order, problem.size())?;
                        Ok(TourSolution {
                            order,
                            status: SolverStatus::FeasibleWithinTimeLimit,
                        })
                    }
                    None => Err(PlannerError::SolverTimeout(params.time_limit)),
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                ctx.cancel();
                Err(PlannerError::engine(format!(
                    "engine '{}' stopped without a result",
                    self.engine.name()
                )))
            }
        };

        match &solution {
            Ok(tour) => tracing::info!(
                status = tour.status.as_str(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "solver: complete"
            ),
            Err(err) => tracing::warn!(error = %err, "solver: failed"),
        }
        solution
    }

    fn finish(
        &self,
        problem: &EngineProblem,
        outcome: EngineOutcome,
        params: &EngineParameters,
    ) -> Result<TourSolution> {
        let status = match outcome.status {
            EngineStatus::Completed => SolverStatus::Optimal,
            EngineStatus::LimitReached => SolverStatus::FeasibleWithinTimeLimit,
            EngineStatus::Infeasible => return Err(PlannerError::SolverInfeasible),
            EngineStatus::NoSolution => {
                return Err(PlannerError::SolverTimeout(params.time_limit));
            }
            EngineStatus::Failed => {
                return Err(PlannerError::engine(outcome.detail.unwrap_or_else(|| {
                    format!("engine '{}' failed", self.engine.name())
                })));
            }
        };
        let order = outcome
            .tour
            .ok_or(PlannerError::SolverTimeout(params.time_limit))?;
        validate_tour(&order, problem.size())?;
        Ok(TourSolution { order, status })
    }
}

/// Soft and hard deadlines for a solve starting at `started`.
fn deadlines(started: Instant, time_limit: Duration, grace: Duration) -> Result<(Instant, Instant)> {
    let deadline = started.checked_add(time_limit);
    let hard_deadline = deadline.and_then(|d| d.checked_add(grace));
    deadline.zip(hard_deadline).ok_or_else(|| {
        PlannerError::config(format!("time limit {time_limit:?} is out of range"))
    })
}

/// Check that `order` is `[0, ..., 0]` and visits each of `0..size` once.
pub fn validate_tour(order: &[usize], size: usize) -> Result<()> {
    if order.len() != size + 1 {
        return Err(PlannerError::engine(format!(
            "tour has {} entries, expected {}",
            order.len(),
            size + 1
        )));
    }
    if order.first() != Some(&0) || order.last() != Some(&0) {
        return Err(PlannerError::engine("tour must start and end at the depot"));
    }

    let mut seen = vec![false; size];
    for &node in &order[..size] {
        let slot = seen
            .get_mut(node)
            .ok_or_else(|| PlannerError::engine(format!("tour visits unknown node {node}")))?;
        if *slot {
            return Err(PlannerError::engine(format!("tour visits node {node} twice")));
        }
        *slot = true;
    }
    Ok(())
}
