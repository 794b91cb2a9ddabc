//! route-planner core
//!
//! Single-depot route optimization: validate a list of locations, drop
//! geographic outliers, build a haversine distance matrix, hand it to a
//! time-bounded tour engine (`vrp-core` by default) and turn the tour back
//! into an itinerary keyed by the caller's own indices.

pub mod adapter;
pub mod admission;
pub mod assembler;
pub mod config;
pub mod engine;
pub mod error;
pub mod haversine;
pub mod matrix;
pub mod model;
pub mod outliers;
pub mod planner;
pub mod strategy;
pub mod traits;

pub use config::PlannerConfig;
pub use engine::VrpEngine;
pub use error::{PlannerError, Result};
pub use model::{
    Coordinate, ExcludedLocation, ExclusionReason, LocationInput, OptimizeRequest, ResultStatus,
    RouteLeg, RouteOptions, RouteResult, RouteStop, RouteSummary, SolverStatus,
};
pub use planner::RoutePlanner;
pub use strategy::{FirstSolutionStrategy, LocalSearchStrategy};
pub use traits::{DistanceMatrixProvider, TourEngine};
