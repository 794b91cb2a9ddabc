//! How the planner behaves when an engine is slow, silent or broken.

mod fixtures;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use fixtures::*;
use route_planner::strategy::EngineParameters;
use route_planner::traits::{EngineOutcome, EngineProblem, EngineStatus, SolveContext};
use route_planner::{PlannerConfig, PlannerError, ResultStatus, RoutePlanner, SolverStatus, TourEngine};

const GRACE_MILLIS: u64 = 300;

fn planner(engine: impl TourEngine + 'static) -> RoutePlanner {
    let config = PlannerConfig {
        solver_grace_millis: GRACE_MILLIS,
        ..PlannerConfig::default()
    };
    RoutePlanner::with_engine(config, Arc::new(engine))
}

fn index_order(problem: &EngineProblem) -> Vec<usize> {
    let mut walk: Vec<usize> = (0..problem.size()).collect();
    walk.push(0);
    walk
}

/// Publishes one tour, then ignores the deadline for a while.
struct Stubborn;

impl TourEngine for Stubborn {
    fn name(&self) -> &str {
        "stubborn"
    }

    fn solve(&self, problem: &EngineProblem, _: &EngineParameters, ctx: &SolveContext) -> EngineOutcome {
        let walk = index_order(problem);
        ctx.publish(&walk, problem.walk_cost(&walk));
        thread::sleep(Duration::from_secs(4));
        EngineOutcome::found(walk, EngineStatus::Completed)
    }
}

/// Never publishes anything and ignores the deadline.
struct Silent;

impl TourEngine for Silent {
    fn name(&self) -> &str {
        "silent"
    }

    fn solve(&self, _: &EngineProblem, _: &EngineParameters, _: &SolveContext) -> EngineOutcome {
        thread::sleep(Duration::from_secs(4));
        EngineOutcome::no_solution()
    }
}

/// Searches until told to stop.
struct Cooperative;

impl TourEngine for Cooperative {
    fn name(&self) -> &str {
        "cooperative"
    }

    fn solve(&self, problem: &EngineProblem, _: &EngineParameters, ctx: &SolveContext) -> EngineOutcome {
        while !ctx.should_stop() {
            thread::sleep(Duration::from_millis(10));
        }
        EngineOutcome::found(index_order(problem), EngineStatus::LimitReached)
    }
}

struct Exploding;

impl TourEngine for Exploding {
    fn name(&self) -> &str {
        "exploding"
    }

    fn solve(&self, _: &EngineProblem, _: &EngineParameters, _: &SolveContext) -> EngineOutcome {
        panic!("engine blew up");
    }
}

/// Returns a walk that skips a node.
struct Sloppy;

impl TourEngine for Sloppy {
    fn name(&self) -> &str {
        "sloppy"
    }

    fn solve(&self, problem: &EngineProblem, _: &EngineParameters, _: &SolveContext) -> EngineOutcome {
        let mut walk = index_order(problem);
        walk.remove(1);
        EngineOutcome::found(walk, EngineStatus::Completed)
    }
}

fn bound() -> Duration {
    Duration::from_secs(1) + Duration::from_millis(GRACE_MILLIS) + Duration::from_millis(500)
}

#[test]
fn test_hung_engine_with_incumbent_returns_feasible_in_time() {
    let request = valley_request(6).time_limit(1).build();
    let started = Instant::now();
    let result = planner(Stubborn).optimize(&request).unwrap();

    assert!(started.elapsed() < bound(), "took {:?}", started.elapsed());
    assert_eq!(result.summary.solver_status, SolverStatus::FeasibleWithinTimeLimit);
    assert_eq!(result.status, ResultStatus::Warning);
    assert_eq!(result.route.len(), 7);
}

#[test]
fn test_abandoned_engine_keeps_its_solve_slot() {
    let planner = planner(Stubborn);
    let request = valley_request(6).time_limit(1).build();
    planner.optimize(&request).unwrap();

    // the engine thread is still sleeping and still counts against capacity
    assert_eq!(planner.admission().in_use(), 1);

    let released_by = Instant::now() + Duration::from_secs(6);
    while planner.admission().in_use() > 0 && Instant::now() < released_by {
        thread::sleep(Duration::from_millis(50));
    }
    assert_eq!(planner.admission().in_use(), 0);
}

#[test]
fn test_hung_engine_without_incumbent_times_out() {
    let request = valley_request(6).time_limit(1).build();
    let started = Instant::now();
    let err = planner(Silent).optimize(&request).unwrap_err();

    assert!(started.elapsed() < bound(), "took {:?}", started.elapsed());
    assert!(matches!(err, PlannerError::SolverTimeout(_)));
    assert!(!err.is_client_error());
}

#[test]
fn test_engine_stopping_at_deadline_is_feasible() {
    let request = valley_request(4).time_limit(1).build();
    let result = planner(Cooperative).optimize(&request).unwrap();
    assert_eq!(result.summary.solver_status, SolverStatus::FeasibleWithinTimeLimit);
    assert!(result.message.contains("time limit"));
}

#[test]
fn test_panicking_engine_is_engine_failure() {
    let request = valley_request(4).time_limit(1).build();
    let err = planner(Exploding).optimize(&request).unwrap_err();
    assert!(matches!(err, PlannerError::EngineFailure(_)));
}

#[test]
fn test_invalid_tour_is_engine_failure() {
    let request = valley_request(4).time_limit(1).build();
    let err = planner(Sloppy).optimize(&request).unwrap_err();
    assert!(matches!(err, PlannerError::EngineFailure(_)));
}

#[test]
fn test_default_engine_respects_short_limit() {
    let request = RequestBuilder::new()
        .place(&DEPOTS[2])
        .places(&valley_stops())
        .places(&valley_stops())
        .strategies("SAVINGS", "GUIDED_LOCAL_SEARCH")
        .time_limit(1)
        .build();
    let started = Instant::now();
    let result = RoutePlanner::default().optimize(&request).unwrap();

    assert!(started.elapsed() < Duration::from_secs(4), "took {:?}", started.elapsed());
    assert_eq!(result.route.len(), 35);
}

#[test]
fn test_default_engine_answers_in_time_on_a_large_input() {
    let planner = RoutePlanner::new(PlannerConfig {
        solver_grace_millis: GRACE_MILLIS,
        ..PlannerConfig::default()
    });
    let request = RequestBuilder::new()
        .place(&DEPOTS[0])
        .grid(1_500)
        .strategies("BEST_INSERTION", "GREEDY_DESCENT")
        .time_limit(1)
        .build();
    let result = planner.optimize(&request).unwrap();

    assert_eq!(result.route.len(), 1_501);
    assert_eq!(result.summary.solver_status, SolverStatus::FeasibleWithinTimeLimit);
    let bound_ms = bound().as_millis() as u64;
    assert!(
        result.summary.calculation_time_ms < bound_ms,
        "solver took {} ms",
        result.summary.calculation_time_ms
    );
}
