//! Great-circle distance on a spherical Earth.
//!
//! Straight-line distance only; roads are ignored. Every distance the planner
//! reports comes from [`haversine_meters`].

use rayon::prelude::*;

use crate::model::Coordinate;
use crate::traits::DistanceMatrixProvider;

/// Mean Earth radius in kilometers (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

const METERS_PER_KM: f64 = 1000.0;
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Haversine distance between two points in meters.
///
/// Symmetric and never negative. Inputs are assumed to be in range; see
/// [`Coordinate::validate`].
pub fn haversine_meters(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    // rounding can push `a` a hair above 1 for antipodal points
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_KM * METERS_PER_KM * c
}

/// Travel time in seconds for `distance_meters` at a constant `speed_kmh`.
pub fn travel_seconds(distance_meters: f64, speed_kmh: f64) -> f64 {
    distance_meters / METERS_PER_KM / speed_kmh * SECONDS_PER_HOUR
}

/// Haversine-based matrix provider with whole-meter weights.
///
/// Values are rounded half-up, so any weight differs from the exact
/// haversine distance by at most half a meter.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineMatrix;

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[Coordinate]) -> Vec<Vec<i64>> {
        locations
            .par_iter()
            .enumerate()
            .map(|(i, from)| {
                locations
                    .iter()
                    .enumerate()
                    .map(|(j, to)| {
                        if i == j {
                            0
                        } else {
                            haversine_meters(*from, *to).round() as i64
                        }
                    })
                    .collect()
            })
            .collect()
    }
}
