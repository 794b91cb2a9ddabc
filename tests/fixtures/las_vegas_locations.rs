//! Real Las Vegas / Henderson locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap. A handful of far-away cities are
//! included to exercise outlier filtering.

use route_planner::LocationInput;

/// A named location with coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Place {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Place {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn input(&self) -> LocationInput {
        LocationInput::new(self.lat, self.lng).with_name(self.name)
    }
}

// ============================================================================
// Depots
// ============================================================================

pub const DEPOTS: &[Place] = &[
    Place::new("Wynn Las Vegas", 36.1263781, -115.1658180),
    Place::new("MGM Grand", 36.1023654, -115.1688720),
    Place::new("Longhorn Casino", 36.1070664, -115.0591256),
];

// ============================================================================
// Stops around the valley
// ============================================================================

pub const STRIP: &[Place] = &[
    Place::new("Hard Rock Cafe", 36.1041592, -115.1722166),
    Place::new("Sinatra", 36.1300035, -115.1654850),
    Place::new("Brooklyn Bowl", 36.1175388, -115.1695094),
    Place::new("Gordon Ramsay BurGR", 36.1107195, -115.1720818),
    Place::new("Le Cirque", 36.1135689, -115.1749763),
    Place::new("Rao's", 36.1163982, -115.1763053),
    Place::new("Strip Steak", 36.0908722, -115.1776176),
];

pub const HENDERSON: &[Place] = &[
    Place::new("I Love Sushi Henderson", 35.9916660, -115.1028343),
    Place::new("Islander's Grill", 36.0335058, -114.9856162),
    Place::new("Green Valley Ranch Area", 36.0308, -115.0825),
    Place::new("Sunset Station Area", 36.0614, -115.0631),
];

pub const NORTH_VEGAS: &[Place] = &[
    Place::new("Rivas Mexican Grill North", 36.1450055, -115.0482587),
    Place::new("Monarca Mexican Restaurant", 36.1440711, -115.0634197),
    Place::new("Beers and Bets", 36.1428945, -115.1573836),
];

pub const SOUTH_STRIP: &[Place] = &[
    Place::new("Bootlegger Bistro", 36.0492047, -115.1715744),
    Place::new("kabuki Japanese", 36.0675472, -115.1779391),
    Place::new("Mikos Izakaya", 36.0429503, -115.1527627),
];

// ============================================================================
// Far away
// ============================================================================

pub const FAR_AWAY: &[Place] = &[
    Place::new("Los Angeles City Hall", 34.0536909, -118.2427660),
    Place::new("Phoenix Sky Harbor", 33.4342, -112.0116),
    Place::new("Salt Lake Temple", 40.7704, -111.8918),
];

// ============================================================================
// Collections
// ============================================================================

/// Every valley stop, in a stable order.
pub fn valley_stops() -> Vec<Place> {
    STRIP
        .iter()
        .chain(HENDERSON)
        .chain(NORTH_VEGAS)
        .chain(SOUTH_STRIP)
        .copied()
        .collect()
}

/// The first `count` valley stops.
pub fn sample_stops(count: usize) -> Vec<Place> {
    valley_stops().into_iter().take(count).collect()
}
