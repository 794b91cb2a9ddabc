//! Default [`TourEngine`] backed by the `vrp-core` solver.
//!
//! The matrix becomes a one-vehicle problem: the vehicle starts and ends at
//! node 0 and every other node is a job. The first-solution method picks the
//! insertion heuristic for the initial solution and the refinement budget
//! bounds the evolutionary search after it. The adapter's deadline and
//! cancellation flag reach the solver as its environment quota.

use std::sync::Arc;

use vrp_core::construction::heuristics::InsertionContext;
use vrp_core::prelude::*;
use vrp_core::rosomaxa::evolution::TelemetryMode;
use vrp_core::rosomaxa::utils::{Environment, Quota};
use vrp_core::solver::search::{
    Recreate, RecreateWithCheapest, RecreateWithFarthest, RecreateWithGaps,
    RecreateWithNearestNeighbor, RecreateWithRegret, RecreateWithSkipBest,
};
use vrp_core::solver::{create_elitism_population, RefinementContext};

use crate::strategy::{EngineParameters, FirstSolutionMethod, RefinementBudget};
use crate::traits::{EngineOutcome, EngineProblem, EngineStatus, SolveContext, TourEngine};

type Transport = Arc<dyn TransportCost + Send + Sync>;

#[derive(Debug, Clone, Copy, Default)]
pub struct VrpEngine;

impl VrpEngine {
    pub fn new() -> Self {
        Self
    }
}

impl TourEngine for VrpEngine {
    fn name(&self) -> &str {
        "vrp-core"
    }

    fn solve(
        &self,
        problem: &EngineProblem,
        params: &EngineParameters,
        ctx: &SolveContext,
    ) -> EngineOutcome {
        let n = problem.size();
        if n == 0 {
            return EngineOutcome::no_solution();
        }
        if params.first_solution == FirstSolutionMethod::LeaveAllUnperformed {
            tracing::debug!("first solution leaves every stop unperformed");
            return EngineOutcome::infeasible();
        }

        // every permutation is a tour; have one on record before any setup work
        let index_order: Vec<usize> = (0..n).chain(std::iter::once(0)).collect();
        ctx.publish(&index_order, problem.walk_cost(&index_order));

        if n <= 3 {
            return EngineOutcome::found(index_order, EngineStatus::Completed);
        }
        if ctx.should_stop() {
            return EngineOutcome::found(index_order, EngineStatus::LimitReached);
        }

        match run_solver(problem, params, ctx) {
            Ok(status) => best_published(ctx, status),
            Err(err) => {
                tracing::warn!(error = %err, "vrp-core solver failed");
                EngineOutcome::failed(format!("vrp-core: {err}"))
            }
        }
    }
}

/// Reports the adapter's deadline and cancellation to the solver.
struct DeadlineQuota(SolveContext);

impl Quota for DeadlineQuota {
    fn is_reached(&self) -> bool {
        self.0.should_stop()
    }
}

/// Build and solve the vrp-core model, publishing every complete tour it
/// yields. Returns how the run ended.
fn run_solver(
    problem: &EngineProblem,
    params: &EngineParameters,
    ctx: &SolveContext,
) -> GenericResult<EngineStatus> {
    let n = problem.size();
    let environment = Arc::new(Environment {
        quota: Some(Arc::new(DeadlineQuota(ctx.clone()))),
        ..Environment::default()
    });

    let weights: Vec<f64> = problem.weights().iter().map(|&w| w as f64).collect();
    let transport: Transport = Arc::new(SimpleTransportCost::new(weights.clone(), weights)?);
    let goal = define_goal(transport.clone())?;
    let model = Arc::new(define_problem(n, goal, transport)?);

    let initial = build_initial(&model, params.first_solution, &environment);
    let initial_walk = walk_of(&initial, n);
    if let Some(walk) = &initial_walk {
        ctx.publish(walk, problem.walk_cost(walk));
    }
    tracing::debug!(
        method = ?params.first_solution,
        complete = initial_walk.is_some(),
        "initial solution built"
    );
    if ctx.should_stop() || initial_walk.is_none() {
        return Ok(EngineStatus::LimitReached);
    }

    let max_generations = match params.refinement {
        RefinementBudget::Generations(generations) => Some(generations),
        RefinementBudget::UntilTimeLimit => None,
    };
    let max_time = usize::try_from(params.time_limit.as_secs().max(1)).unwrap_or(usize::MAX);
    let seed = InsertionContext::new_from_solution(model.clone(), (initial, None), environment.clone());

    let config = VrpConfigBuilder::new(model.clone())
        .set_environment(environment)
        .prebuild()?
        .with_max_time(Some(max_time))
        .with_max_generations(max_generations)
        .with_init_solutions(vec![seed], None)
        .build()?;
    let solution = Solver::new(model, config).solve()?;

    let Some(walk) = walk_of(&solution, n) else {
        return Ok(EngineStatus::LimitReached);
    };
    let cost = problem.walk_cost(&walk);
    ctx.publish(&walk, cost);
    tracing::debug!(cost, refinement = ?params.refinement, "vrp-core search finished");

    Ok(if ctx.should_stop() {
        EngineStatus::LimitReached
    } else {
        EngineStatus::Completed
    })
}

fn define_goal(transport: Transport) -> GenericResult<GoalContext> {
    let minimize_unassigned = MinimizeUnassignedBuilder::new("min-unassigned").build()?;
    let transport_feature = TransportFeatureBuilder::new("min-distance")
        .set_transport_cost(transport)
        .set_time_constrained(false)
        .build_minimize_distance()?;

    GoalContextBuilder::with_features(&[minimize_unassigned, transport_feature])?.build()
}

/// One vehicle based at node 0, one job per other node.
fn define_problem(size: usize, goal: GoalContext, transport: Transport) -> GenericResult<Problem> {
    let jobs = (1..size)
        .map(|node| {
            SingleBuilder::default()
                .id(format!("node{node}").as_str())
                .location(node)?
                .build_as_job()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let vehicle = VehicleBuilder::default()
        .id("vehicle")
        .add_detail(
            VehicleDetailBuilder::default()
                .set_start_location(0)
                .set_end_location(0)
                .build()?,
        )
        .build()?;

    ProblemBuilder::default()
        .add_jobs(jobs.into_iter())
        .add_vehicles(std::iter::once(vehicle))
        .with_goal(goal)
        .with_transport_cost(transport)
        .build()
}

fn build_initial(
    model: &Arc<Problem>,
    method: FirstSolutionMethod,
    environment: &Arc<Environment>,
) -> Solution {
    let random = environment.random.clone();
    let recreate: Box<dyn Recreate> = match method {
        FirstSolutionMethod::CheapestInsertion | FirstSolutionMethod::LeaveAllUnperformed => {
            Box::new(RecreateWithCheapest::new(random))
        }
        FirstSolutionMethod::FarthestInsertion => Box::new(RecreateWithFarthest::new(random)),
        FirstSolutionMethod::NearestNeighbor => Box::new(RecreateWithNearestNeighbor::new(random)),
        FirstSolutionMethod::RegretInsertion => Box::new(RecreateWithRegret::new(2, 3, random)),
        FirstSolutionMethod::SkipBestInsertion => Box::new(RecreateWithSkipBest::new(1, 2, random)),
        FirstSolutionMethod::GapsInsertion => Box::new(RecreateWithGaps::new(1, 2, random)),
    };

    let population = create_elitism_population(model.goal.clone(), environment.clone());
    let refinement_ctx = RefinementContext::new(
        model.clone(),
        Box::new(population),
        TelemetryMode::None,
        environment.clone(),
    );

    recreate
        .run(&refinement_ctx, InsertionContext::new(model.clone(), environment.clone()))
        .into()
}

/// Closed walk of the single route, if every job was assigned.
fn walk_of(solution: &Solution, size: usize) -> Option<Vec<usize>> {
    if !solution.unassigned.is_empty() {
        return None;
    }
    let mut walk: Vec<usize> = solution.get_locations().next()?.collect();
    if walk.last() != Some(&0) {
        walk.push(0);
    }
    (walk.len() == size + 1 && walk.first() == Some(&0)).then_some(walk)
}

fn best_published(ctx: &SolveContext, status: EngineStatus) -> EngineOutcome {
    match ctx.incumbent() {
        Some((walk, _)) => EngineOutcome::found(walk, status),
        None => EngineOutcome::no_solution(),
    }
}
