//! Centroid-based outlier filtering.
//!
//! The centroid is the plain arithmetic mean of latitude and longitude over
//! the non-depot locations. That is a planar approximation, fine at city or
//! regional scale and wrong near the antimeridian or the poles; it is only
//! used as a reference point for filtering, never reported.

use crate::error::{PlannerError, Result};
use crate::haversine::haversine_meters;
use crate::model::{Coordinate, Location, RouteOptions};

const METERS_PER_KM: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlierPolicy {
    /// Exclude locations farther than this many kilometers from the centroid.
    AbsoluteKm(f64),
    /// Exclude locations farther than `factor * mean centroid distance`.
    MeanFactor(f64),
}

impl OutlierPolicy {
    /// Resolve the two request fields into at most one policy.
    ///
    /// When both are supplied the absolute threshold wins.
    pub fn from_options(options: &RouteOptions) -> Result<Option<Self>> {
        let threshold = options
            .outlier_threshold_km
            .map(|km| non_negative("outlier_threshold_km", km))
            .transpose()?;
        let factor = options
            .outlier_factor
            .map(|f| non_negative("outlier_factor", f))
            .transpose()?;

        Ok(match (threshold, factor) {
            (Some(km), Some(f)) => {
                tracing::warn!(
                    outlier_threshold_km = km,
                    outlier_factor = f,
                    "both outlier forms supplied; using the absolute threshold"
                );
                Some(OutlierPolicy::AbsoluteKm(km))
            }
            (Some(km), None) => Some(OutlierPolicy::AbsoluteKm(km)),
            (None, Some(f)) => Some(OutlierPolicy::MeanFactor(f)),
            (None, None) => None,
        })
    }
}

fn non_negative(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(PlannerError::config(format!("{field} must be >= 0, got {value}")))
    }
}

/// Locations split by the filter. `retained[0]` is always the depot; the
/// remaining retained locations keep their input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub retained: Vec<Location>,
    pub excluded: Vec<Location>,
}

/// Split `locations` into retained and excluded sets.
///
/// `depot_index` is a position in `locations`. The depot is never excluded.
/// Fewer than two retained locations is an error.
pub fn filter_outliers(
    locations: &[Location],
    depot_index: usize,
    policy: Option<OutlierPolicy>,
) -> Result<Partition> {
    let depot = locations.get(depot_index).ok_or_else(|| {
        PlannerError::input(format!(
            "depot_index {depot_index} is out of bounds for {} locations",
            locations.len()
        ))
    })?;

    let candidates: Vec<&Location> = locations
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != depot_index)
        .map(|(_, location)| location)
        .collect();

    let mut retained = Vec::with_capacity(locations.len());
    retained.push(depot.clone());
    let mut excluded = Vec::new();

    match policy.and_then(|policy| limit_meters(policy, &candidates)) {
        None => retained.extend(candidates.into_iter().cloned()),
        Some((limit, centroid)) => {
            for candidate in candidates {
                let distance = haversine_meters(candidate.coordinate, centroid);
                if distance > limit {
                    tracing::debug!(
                        original_index = candidate.original_index,
                        distance_m = distance.round(),
                        limit_m = limit.round(),
                        "excluding outlier"
                    );
                    excluded.push(candidate.clone());
                } else {
                    retained.push(candidate.clone());
                }
            }
        }
    }

    if retained.len() < 2 {
        return Err(PlannerError::FilterExhaustion {
            retained: retained.len(),
            excluded: excluded.len(),
        });
    }

    if !excluded.is_empty() {
        tracing::info!(
            retained = retained.len(),
            excluded = excluded.len(),
            "outlier filtering complete"
        );
    }

    Ok(Partition { retained, excluded })
}

/// Arithmetic mean of latitude and longitude.
pub fn centroid(locations: &[&Location]) -> Option<Coordinate> {
    if locations.is_empty() {
        return None;
    }
    let n = locations.len() as f64;
    let (lat, lng) = locations.iter().fold((0.0, 0.0), |(lat, lng), location| {
        (
            lat + location.coordinate.latitude,
            lng + location.coordinate.longitude,
        )
    });
    Some(Coordinate::new(lat / n, lng / n))
}

/// Exclusion radius in meters for `policy`, with the centroid it is measured from.
fn limit_meters(policy: OutlierPolicy, candidates: &[&Location]) -> Option<(f64, Coordinate)> {
    let center = centroid(candidates)?;
    let limit = match policy {
        OutlierPolicy::AbsoluteKm(km) => km * METERS_PER_KM,
        OutlierPolicy::MeanFactor(factor) => {
            let total: f64 = candidates
                .iter()
                .map(|location| haversine_meters(location.coordinate, center))
                .sum();
            factor * (total / candidates.len() as f64)
        }
    };
    Some((limit, center))
}
