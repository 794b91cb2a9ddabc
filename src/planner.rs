//! The per-request pipeline.
//!
//! A request moves through `validate -> filter -> build matrix -> solve ->
//! assemble`. Each stage consumes the previous stage's value and produces the
//! next one; nothing is stored on the planner between requests, so a single
//! [`RoutePlanner`] can serve concurrent callers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::adapter::{TourSolution, TourSolverAdapter};
use crate::admission::SolveAdmission;
use crate::assembler::assemble;
use crate::config::PlannerConfig;
use crate::engine::VrpEngine;
use crate::error::{PlannerError, Result};
use crate::matrix::{build_matrix, DistanceMatrix, NodeTable};
use crate::model::{Location, OptimizeRequest, RouteResult};
use crate::outliers::{filter_outliers, OutlierPolicy, Partition};
use crate::strategy::{map_options, EngineParameters};
use crate::traits::TourEngine;

#[derive(Debug, Clone)]
pub struct RoutePlanner {
    config: PlannerConfig,
    adapter: TourSolverAdapter,
    admission: SolveAdmission,
}

/// Request checked and options resolved; no distances computed yet.
#[derive(Debug)]
struct Validated {
    locations: Vec<Location>,
    params: EngineParameters,
    policy: Option<OutlierPolicy>,
    speed_kmh: f64,
}

#[derive(Debug)]
struct Filtered {
    partition: Partition,
    params: EngineParameters,
    speed_kmh: f64,
}

#[derive(Debug)]
struct MatrixBuilt {
    matrix: DistanceMatrix,
    nodes: NodeTable,
    partition: Partition,
    params: EngineParameters,
    speed_kmh: f64,
}

#[derive(Debug)]
struct Solved {
    tour: TourSolution,
    elapsed: Duration,
    nodes: NodeTable,
    partition: Partition,
    speed_kmh: f64,
}

impl RoutePlanner {
    /// Planner backed by the `vrp-core` [`VrpEngine`].
    pub fn new(config: PlannerConfig) -> Self {
        Self::with_engine(config, Arc::new(VrpEngine::new()))
    }

    pub fn with_engine(config: PlannerConfig, engine: Arc<dyn TourEngine>) -> Self {
        let adapter = TourSolverAdapter::new(engine, config.solver_grace());
        let admission = SolveAdmission::new(config.max_concurrent_solves);
        Self {
            config,
            adapter,
            admission,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn admission(&self) -> &SolveAdmission {
        &self.admission
    }

    /// Optimize one request into a closed route from the depot.
    #[tracing::instrument(
        name = "optimize",
        skip_all,
        fields(locations = request.locations.len(), engine = self.adapter.engine_name())
    )]
    pub fn optimize(&self, request: &OptimizeRequest) -> Result<RouteResult> {
        let result = self
            .validate(request)
            .and_then(filter)
            .and_then(build)
            .and_then(|built| self.solve(built))
            .and_then(finish);

        match &result {
            Ok(route) => tracing::info!(
                optimized = route.summary.num_locations_optimized,
                excluded = route.summary.num_locations_excluded,
                total_distance_m = route.summary.total_distance_meters.round(),
                solver_status = route.summary.solver_status.as_str(),
                calculation_time_ms = route.summary.calculation_time_ms,
                "route optimized"
            ),
            Err(err) if err.is_client_error() => {
                tracing::info!(error = %err, "request rejected");
            }
            Err(err) => tracing::warn!(error = %err, "optimization failed"),
        }
        result
    }

    fn validate(&self, request: &OptimizeRequest) -> Result<Validated> {
        let count = request.locations.len();
        if count < 2 {
            return Err(PlannerError::input(format!(
                "at least 2 locations are required, got {count}"
            )));
        }

        let locations = request
            .locations
            .iter()
            .enumerate()
            .map(|(i, input)| Location::from_input(i, input))
            .collect::<Result<Vec<_>>>()?;

        let options = &request.options;
        let params = map_options(options, &self.config)?;
        if params.depot_index >= count {
            return Err(PlannerError::input(format!(
                "depot_index {} is out of bounds for {count} locations",
                params.depot_index
            )));
        }

        let speed_kmh = options
            .average_speed_kmh
            .unwrap_or(self.config.default_average_speed_kmh);
        if !(speed_kmh.is_finite() && speed_kmh > 0.0) {
            return Err(PlannerError::config(format!(
                "average_speed_kmh must be > 0, got {speed_kmh}"
            )));
        }

        let policy = OutlierPolicy::from_options(options)?;

        Ok(Validated {
            locations,
            params,
            policy,
            speed_kmh,
        })
    }

    fn solve(&self, built: MatrixBuilt) -> Result<Solved> {
        // the engine thread owns the permit; an abandoned engine keeps its slot
        let permit = self.admission.acquire_timeout(self.config.admission_wait())?;

        let started = Instant::now();
        let tour = self
            .adapter
            .solve_holding(built.matrix, &built.params, permit)?;
        let elapsed = started.elapsed();

        Ok(Solved {
            tour,
            elapsed,
            nodes: built.nodes,
            partition: built.partition,
            speed_kmh: built.speed_kmh,
        })
    }
}

impl Default for RoutePlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

fn filter(validated: Validated) -> Result<Filtered> {
    let partition = filter_outliers(
        &validated.locations,
        validated.params.depot_index,
        validated.policy,
    )?;
    Ok(Filtered {
        partition,
        params: validated.params,
        speed_kmh: validated.speed_kmh,
    })
}

fn build(filtered: Filtered) -> Result<MatrixBuilt> {
    let (matrix, nodes) = build_matrix(&filtered.partition.retained)?;
    Ok(MatrixBuilt {
        matrix,
        nodes,
        partition: filtered.partition,
        params: filtered.params,
        speed_kmh: filtered.speed_kmh,
    })
}

fn finish(solved: Solved) -> Result<RouteResult> {
    assemble(
        &solved.tour,
        &solved.partition.retained,
        &solved.nodes,
        &solved.partition.excluded,
        solved.speed_kmh,
        solved.elapsed,
    )
}
