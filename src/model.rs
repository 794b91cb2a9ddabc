//! Request and response types for route optimization.
//!
//! Everything here is plain data with serde derives. Validation lives with
//! the component that owns the rule: coordinate ranges in [`Coordinate`],
//! strategy names in [`crate::strategy`], outlier values in [`crate::outliers`].

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Reject non-finite values and anything outside [-90, 90] x [-180, 180].
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || self.latitude.abs() > 90.0 {
            return Err(PlannerError::input(format!(
                "latitude {} is outside [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || self.longitude.abs() > 180.0 {
            return Err(PlannerError::input(format!(
                "longitude {} is outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

/// A location as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl LocationInput {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            id: None,
            latitude,
            longitude,
            name: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A validated location tagged with its position in the caller's input.
///
/// `original_index` is the only stable handle back to caller data; it is
/// never renumbered by filtering or solving.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub original_index: usize,
    pub id: Option<String>,
    pub coordinate: Coordinate,
    pub name: Option<String>,
}

impl Location {
    pub fn from_input(original_index: usize, input: &LocationInput) -> Result<Self> {
        let coordinate = Coordinate::new(input.latitude, input.longitude);
        coordinate.validate().map_err(|err| match err {
            PlannerError::Input(message) => {
                PlannerError::input(format!("location {original_index}: {message}"))
            }
            other => other,
        })?;

        Ok(Self {
            original_index,
            id: input.id.clone(),
            coordinate,
            name: input.name.clone(),
        })
    }
}

/// Caller-facing options. Every field is optional; absent values fall back to
/// [`crate::config::PlannerConfig`] defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteOptions {
    pub depot_index: Option<usize>,
    pub time_limit_seconds: Option<i64>,
    pub average_speed_kmh: Option<f64>,
    /// Absolute outlier radius around the centroid, in kilometers.
    pub outlier_threshold_km: Option<f64>,
    /// Outlier radius as a multiple of the mean centroid distance.
    pub outlier_factor: Option<f64>,
    pub first_solution_strategy: Option<String>,
    pub local_search_strategy: Option<String>,
}

/// One optimization request: the locations plus options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub locations: Vec<LocationInput>,
    #[serde(default)]
    pub options: RouteOptions,
}

impl OptimizeRequest {
    pub fn new(locations: Vec<LocationInput>) -> Self {
        Self {
            locations,
            options: RouteOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RouteOptions) -> Self {
        self.options = options;
        self
    }
}

/// Engine-level outcome quality, copied into the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    Optimal,
    FeasibleWithinTimeLimit,
    Infeasible,
}

impl SolverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverStatus::Optimal => "optimal",
            SolverStatus::FeasibleWithinTimeLimit => "feasible_within_time_limit",
            SolverStatus::Infeasible => "infeasible",
        }
    }
}

/// Overall outcome flag for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    pub original_index: usize,
    pub visit_order: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub id: Option<String>,
    pub name: Option<String>,
    pub is_depot: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub from_original_index: usize,
    pub to_original_index: usize,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    Outlier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedLocation {
    pub original_index: usize,
    pub reason: ExclusionReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub total_distance_meters: f64,
    pub total_duration_seconds: f64,
    pub num_locations_optimized: usize,
    pub num_locations_excluded: usize,
    pub calculation_time_ms: u64,
    pub solver_status: SolverStatus,
    pub depot_id: Option<String>,
}

/// The itinerary handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub status: ResultStatus,
    pub message: String,
    pub summary: RouteSummary,
    pub route: Vec<RouteStop>,
    pub legs: Vec<RouteLeg>,
    pub excluded: Vec<ExcludedLocation>,
}
