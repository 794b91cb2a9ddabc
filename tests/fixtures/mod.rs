//! Test fixtures for route-planner.
//!
//! Provides realistic test data including:
//! - Real Las Vegas / Henderson locations (from OpenStreetMap)
//! - Builders for requests and options

#![allow(dead_code)]

pub mod las_vegas_locations;

pub use las_vegas_locations::*;

use route_planner::{LocationInput, OptimizeRequest, RouteOptions};

/// Builder for [`OptimizeRequest`] with a depot placed at a chosen position.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    locations: Vec<LocationInput>,
    options: RouteOptions,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(mut self, place: &Place) -> Self {
        self.locations.push(place.input());
        self
    }

    pub fn places<'a>(mut self, places: impl IntoIterator<Item = &'a Place>) -> Self {
        self.locations.extend(places.into_iter().map(Place::input));
        self
    }

    pub fn point(mut self, lat: f64, lng: f64) -> Self {
        self.locations.push(LocationInput::new(lat, lng));
        self
    }

    /// `count` synthetic points on a 40-column grid over the valley, about
    /// 500 m apart.
    pub fn grid(mut self, count: usize) -> Self {
        for i in 0..count {
            let (row, col) = ((i / 40) as f64, (i % 40) as f64);
            self.locations
                .push(LocationInput::new(36.0 + row * 0.0045, -115.3 + col * 0.0055));
        }
        self
    }

    pub fn depot(mut self, index: usize) -> Self {
        self.options.depot_index = Some(index);
        self
    }

    pub fn time_limit(mut self, seconds: i64) -> Self {
        self.options.time_limit_seconds = Some(seconds);
        self
    }

    pub fn speed(mut self, kmh: f64) -> Self {
        self.options.average_speed_kmh = Some(kmh);
        self
    }

    pub fn outlier_threshold_km(mut self, km: f64) -> Self {
        self.options.outlier_threshold_km = Some(km);
        self
    }

    pub fn outlier_factor(mut self, factor: f64) -> Self {
        self.options.outlier_factor = Some(factor);
        self
    }

    pub fn strategies(mut self, first_solution: &str, local_search: &str) -> Self {
        self.options.first_solution_strategy = Some(first_solution.to_string());
        self.options.local_search_strategy = Some(local_search.to_string());
        self
    }

    pub fn build(self) -> OptimizeRequest {
        OptimizeRequest::new(self.locations).with_options(self.options)
    }
}

/// Depot (Wynn) followed by `count` valley stops.
pub fn valley_request(count: usize) -> RequestBuilder {
    RequestBuilder::new()
        .place(&DEPOTS[0])
        .places(&sample_stops(count))
}
