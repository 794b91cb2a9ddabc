//! Caller-facing strategy names and their translation into engine parameters.
//!
//! Strategy identifiers form closed sets. Parsing an identifier outside the set
//! is a configuration error; nothing is passed through to the engine as a raw
//! string.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result};
use crate::model::RouteOptions;

/// How the initial tour is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FirstSolutionStrategy {
    Automatic,
    PathCheapestArc,
    Savings,
    Sweep,
    Christofides,
    AllUnperformed,
    BestInsertion,
    ParallelCheapestInsertion,
    LocalCheapestInsertion,
    GlobalCheapestArc,
    LocalCheapestArc,
    FirstUnboundMinValue,
}

impl FirstSolutionStrategy {
    pub const ALL: [FirstSolutionStrategy; 12] = [
        FirstSolutionStrategy::Automatic,
        FirstSolutionStrategy::PathCheapestArc,
        FirstSolutionStrategy::Savings,
        FirstSolutionStrategy::Sweep,
        FirstSolutionStrategy::Christofides,
        FirstSolutionStrategy::AllUnperformed,
        FirstSolutionStrategy::BestInsertion,
        FirstSolutionStrategy::ParallelCheapestInsertion,
        FirstSolutionStrategy::LocalCheapestInsertion,
        FirstSolutionStrategy::GlobalCheapestArc,
        FirstSolutionStrategy::LocalCheapestArc,
        FirstSolutionStrategy::FirstUnboundMinValue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FirstSolutionStrategy::Automatic => "AUTOMATIC",
            FirstSolutionStrategy::PathCheapestArc => "PATH_CHEAPEST_ARC",
            FirstSolutionStrategy::Savings => "SAVINGS",
            FirstSolutionStrategy::Sweep => "SWEEP",
            FirstSolutionStrategy::Christofides => "CHRISTOFIDES",
            FirstSolutionStrategy::AllUnperformed => "ALL_UNPERFORMED",
            FirstSolutionStrategy::BestInsertion => "BEST_INSERTION",
            FirstSolutionStrategy::ParallelCheapestInsertion => "PARALLEL_CHEAPEST_INSERTION",
            FirstSolutionStrategy::LocalCheapestInsertion => "LOCAL_CHEAPEST_INSERTION",
            FirstSolutionStrategy::GlobalCheapestArc => "GLOBAL_CHEAPEST_ARC",
            FirstSolutionStrategy::LocalCheapestArc => "LOCAL_CHEAPEST_ARC",
            FirstSolutionStrategy::FirstUnboundMinValue => "FIRST_UNBOUND_MIN_VALUE",
        }
    }
}

/// How the initial tour is refined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocalSearchStrategy {
    Automatic,
    GreedyDescent,
    GuidedLocalSearch,
    SimulatedAnnealing,
    TabuSearch,
}

impl LocalSearchStrategy {
    pub const ALL: [LocalSearchStrategy; 5] = [
        LocalSearchStrategy::Automatic,
        LocalSearchStrategy::GreedyDescent,
        LocalSearchStrategy::GuidedLocalSearch,
        LocalSearchStrategy::SimulatedAnnealing,
        LocalSearchStrategy::TabuSearch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LocalSearchStrategy::Automatic => "AUTOMATIC",
            LocalSearchStrategy::GreedyDescent => "GREEDY_DESCENT",
            LocalSearchStrategy::GuidedLocalSearch => "GUIDED_LOCAL_SEARCH",
            LocalSearchStrategy::SimulatedAnnealing => "SIMULATED_ANNEALING",
            LocalSearchStrategy::TabuSearch => "TABU_SEARCH",
        }
    }
}

macro_rules! closed_set_parsing {
    ($ty:ty, $label:literal) => {
        impl FromStr for $ty {
            type Err = PlannerError;

            fn from_str(value: &str) -> Result<Self> {
                let wanted = value.trim();
                <$ty>::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        let known: Vec<&str> = <$ty>::ALL.iter().map(|s| s.as_str()).collect();
                        PlannerError::config(format!(
                            "unknown {} {:?}; expected one of {}",
                            $label,
                            value,
                            known.join(", ")
                        ))
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_set_parsing!(FirstSolutionStrategy, "first_solution_strategy");
closed_set_parsing!(LocalSearchStrategy, "local_search_strategy");

/// Insertion heuristic that builds the engine's initial solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstSolutionMethod {
    CheapestInsertion,
    FarthestInsertion,
    NearestNeighbor,
    RegretInsertion,
    SkipBestInsertion,
    GapsInsertion,
    LeaveAllUnperformed,
}

/// How long the engine keeps refining after the initial solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefinementBudget {
    /// Stop after this many generations, or at the time limit if that comes first.
    Generations(usize),
    /// Refine until the time limit.
    UntilTimeLimit,
}

/// Everything a [`crate::traits::TourEngine`] needs besides the problem.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineParameters {
    /// Depot position in the caller's input. The engine itself always sees the
    /// depot as node 0.
    pub depot_index: usize,
    pub time_limit: Duration,
    pub first_solution: FirstSolutionMethod,
    pub refinement: RefinementBudget,
}

/// Caller strategy to engine construction method, one entry per identifier.
fn first_solution_method(strategy: FirstSolutionStrategy) -> FirstSolutionMethod {
    match strategy {
        FirstSolutionStrategy::Automatic => FirstSolutionMethod::CheapestInsertion,
        FirstSolutionStrategy::PathCheapestArc => FirstSolutionMethod::NearestNeighbor,
        FirstSolutionStrategy::Savings => FirstSolutionMethod::RegretInsertion,
        FirstSolutionStrategy::Sweep => FirstSolutionMethod::FarthestInsertion,
        FirstSolutionStrategy::Christofides => FirstSolutionMethod::FarthestInsertion,
        FirstSolutionStrategy::AllUnperformed => FirstSolutionMethod::LeaveAllUnperformed,
        FirstSolutionStrategy::BestInsertion => FirstSolutionMethod::CheapestInsertion,
        FirstSolutionStrategy::ParallelCheapestInsertion => FirstSolutionMethod::RegretInsertion,
        FirstSolutionStrategy::LocalCheapestInsertion => FirstSolutionMethod::SkipBestInsertion,
        FirstSolutionStrategy::GlobalCheapestArc => FirstSolutionMethod::CheapestInsertion,
        FirstSolutionStrategy::LocalCheapestArc => FirstSolutionMethod::NearestNeighbor,
        FirstSolutionStrategy::FirstUnboundMinValue => FirstSolutionMethod::GapsInsertion,
    }
}

/// Descent strategies stop on a generation budget; the metaheuristics use the
/// whole time limit.
fn refinement_budget(strategy: LocalSearchStrategy, config: &PlannerConfig) -> RefinementBudget {
    match strategy {
        LocalSearchStrategy::Automatic => RefinementBudget::Generations(config.max_generations),
        LocalSearchStrategy::GreedyDescent => {
            RefinementBudget::Generations(config.descent_generations)
        }
        LocalSearchStrategy::GuidedLocalSearch => RefinementBudget::UntilTimeLimit,
        LocalSearchStrategy::SimulatedAnnealing => RefinementBudget::UntilTimeLimit,
        LocalSearchStrategy::TabuSearch => RefinementBudget::UntilTimeLimit,
    }
}

/// Resolve the strategy, time limit and depot options into engine parameters.
///
/// Does not look at locations; the caller checks that `depot_index` is in
/// bounds.
pub fn map_options(options: &RouteOptions, config: &PlannerConfig) -> Result<EngineParameters> {
    let first_solution = match options.first_solution_strategy.as_deref() {
        Some(raw) => raw.parse()?,
        None => config.default_first_solution_strategy,
    };
    let local_search = match options.local_search_strategy.as_deref() {
        Some(raw) => raw.parse()?,
        None => config.default_local_search_strategy,
    };

    let time_limit_seconds = match options.time_limit_seconds {
        Some(seconds) if seconds <= 0 => {
            return Err(PlannerError::config(format!(
                "time_limit_seconds must be > 0, got {seconds}"
            )));
        }
        Some(seconds) if seconds.unsigned_abs() > config.max_time_limit_seconds => {
            return Err(PlannerError::config(format!(
                "time_limit_seconds must be <= {}, got {seconds}",
                config.max_time_limit_seconds
            )));
        }
        Some(seconds) => seconds.unsigned_abs(),
        None => config.default_time_limit_seconds,
    };

    tracing::debug!(
        first_solution = %first_solution,
        local_search = %local_search,
        time_limit_seconds,
        "resolved solver strategies"
    );

    Ok(EngineParameters {
        depot_index: options.depot_index.unwrap_or(0),
        time_limit: Duration::from_secs(time_limit_seconds),
        first_solution: first_solution_method(first_solution),
        refinement: refinement_budget(local_search, config),
    })
}
