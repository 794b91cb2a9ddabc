//! Turns a tour over matrix indices back into a caller-facing itinerary.
//!
//! Only original indices and real coordinates come out of here. Leg lengths
//! are recomputed with haversine on the coordinates rather than read from the
//! rounded matrix.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::adapter::TourSolution;
use crate::error::{PlannerError, Result};
use crate::haversine::{haversine_meters, travel_seconds};
use crate::matrix::NodeTable;
use crate::model::{
    ExcludedLocation, ExclusionReason, Location, ResultStatus, RouteLeg, RouteResult, RouteStop,
    RouteSummary, SolverStatus,
};

/// Build the [`RouteResult`] for a solved tour.
///
/// `retained` and `nodes` come from the same matrix build; `excluded` from
/// the outlier filter. `elapsed` is the time spent in the solver.
pub fn assemble(
    tour: &TourSolution,
    retained: &[Location],
    nodes: &NodeTable,
    excluded: &[Location],
    speed_kmh: f64,
    elapsed: Duration,
) -> Result<RouteResult> {
    let by_original: HashMap<usize, &Location> =
        retained.iter().map(|l| (l.original_index, l)).collect();
    if by_original.len() != retained.len() {
        return Err(PlannerError::engine("retained locations share an original index"));
    }

    let (closing, stops) = tour
        .order
        .split_last()
        .ok_or_else(|| PlannerError::engine("empty tour"))?;

    let mut visited: Vec<&Location> = Vec::with_capacity(stops.len());
    let mut seen = HashSet::with_capacity(stops.len());
    for &matrix_index in stops {
        let location = resolve(matrix_index, nodes, &by_original)?;
        if !seen.insert(location.original_index) {
            return Err(PlannerError::engine(format!(
                "original index {} appears twice in the tour",
                location.original_index
            )));
        }
        visited.push(location);
    }
    let depot = *visited
        .first()
        .ok_or_else(|| PlannerError::engine("tour has no stops"))?;
    if resolve(*closing, nodes, &by_original)?.original_index != depot.original_index {
        return Err(PlannerError::engine("tour does not return to the depot"));
    }

    let route: Vec<RouteStop> = visited
        .iter()
        .enumerate()
        .map(|(visit_order, location)| RouteStop {
            original_index: location.original_index,
            visit_order,
            latitude: location.coordinate.latitude,
            longitude: location.coordinate.longitude,
            id: location.id.clone(),
            name: location.name.clone(),
            is_depot: visit_order == 0,
        })
        .collect();

    let legs: Vec<RouteLeg> = visited
        .iter()
        .zip(visited.iter().skip(1).chain(std::iter::once(&depot)))
        .map(|(from, to)| {
            let distance_meters = haversine_meters(from.coordinate, to.coordinate);
            RouteLeg {
                from_original_index: from.original_index,
                to_original_index: to.original_index,
                distance_meters,
                duration_seconds: travel_seconds(distance_meters, speed_kmh),
            }
        })
        .collect();

    let excluded: Vec<ExcludedLocation> = excluded
        .iter()
        .map(|l| ExcludedLocation {
            original_index: l.original_index,
            reason: ExclusionReason::Outlier,
        })
        .collect();

    let summary = RouteSummary {
        total_distance_meters: legs.iter().map(|l| l.distance_meters).sum(),
        total_duration_seconds: legs.iter().map(|l| l.duration_seconds).sum(),
        num_locations_optimized: route.len(),
        num_locations_excluded: excluded.len(),
        calculation_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        solver_status: tour.status,
        depot_id: depot.id.clone(),
    };

    let (status, message) = describe(&summary);

    tracing::debug!(
        stops = route.len(),
        excluded = summary.num_locations_excluded,
        total_distance_m = summary.total_distance_meters,
        "route assembled"
    );

    Ok(RouteResult {
        status,
        message,
        summary,
        route,
        legs,
        excluded,
    })
}

fn resolve<'a>(
    matrix_index: usize,
    nodes: &NodeTable,
    by_original: &HashMap<usize, &'a Location>,
) -> Result<&'a Location> {
    let original = nodes
        .original_index(matrix_index)
        .ok_or_else(|| PlannerError::engine(format!("unknown matrix index {matrix_index}")))?;
    by_original.get(&original).copied().ok_or_else(|| {
        PlannerError::engine(format!(
            "matrix index {matrix_index} maps to original index {original}, which was not retained"
        ))
    })
}

/// Overall status and message. Anything short of a complete, unfiltered,
/// fully optimized route is a warning.
fn describe(summary: &RouteSummary) -> (ResultStatus, String) {
    let mut notes = Vec::new();
    if summary.solver_status == SolverStatus::FeasibleWithinTimeLimit {
        notes.push("the solver stopped at its time limit; the route may not be optimal".to_string());
    }
    if summary.num_locations_excluded > 0 {
        notes.push(format!(
            "{} location(s) were excluded as outliers",
            summary.num_locations_excluded
        ));
    }

    let headline = format!(
        "Route optimized for {} locations.",
        summary.num_locations_optimized
    );
    if notes.is_empty() {
        (ResultStatus::Success, headline)
    } else {
        (ResultStatus::Warning, format!("{headline} Note: {}.", notes.join("; ")))
    }
}
