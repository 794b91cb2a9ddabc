//! Error types for the route planner.

use std::time::Duration;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum PlannerError {
    /// Malformed request: too few locations, bad coordinates, bad depot index.
    #[error("invalid input: {0}")]
    Input(String),

    /// Outlier filtering left nothing to route besides the depot.
    #[error("outlier filtering left {retained} location(s) ({excluded} excluded); at least 2 are required")]
    FilterExhaustion { retained: usize, excluded: usize },

    /// Unknown strategy identifier or out-of-range numeric option.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The distance source returned a malformed matrix.
    #[error("distance matrix error: {0}")]
    Matrix(String),

    /// The engine proved that no closed tour exists under its configuration.
    #[error("solver reported that no feasible tour exists")]
    SolverInfeasible,

    /// The deadline passed before the engine produced any feasible tour.
    #[error("solver found no feasible tour within {0:?}")]
    SolverTimeout(Duration),

    /// The engine crashed or returned something that is not a valid tour.
    #[error("tour engine failure: {0}")]
    EngineFailure(String),

    /// No solve slot became free in time.
    #[error("too many concurrent solves (capacity {capacity})")]
    Overloaded { capacity: usize },
}

pub type Result<T> = std::result::Result<T, PlannerError>;

impl PlannerError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn engine(message: impl Into<String>) -> Self {
        Self::EngineFailure(message.into())
    }

    /// True for errors caused by the request itself rather than by the solve.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Input(_) | Self::FilterExhaustion { .. } | Self::Config(_)
        )
    }
}
