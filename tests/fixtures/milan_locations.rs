//! Real Milan locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap, rounded to four decimals.

use fleet_planner::haversine::Coordinate;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lon: f64) -> Self {
        Self { name, lat, lon }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// Piazza del Duomo, used as the depot.
pub const DEPOT: Location = Location::new("Duomo", 45.4642, 9.19);

/// Three stops around the depot: north, east and south-west.
pub const TRIANGLE: &[Location] = &[
    Location::new("North", 45.4942, 9.19),
    Location::new("East", 45.4642, 9.23),
    Location::new("South-West", 45.4342, 9.16),
];

pub const LANDMARKS: &[Location] = &[
    Location::new("Castello Sforzesco", 45.4705, 9.1793),
    Location::new("Stazione Centrale", 45.4869, 9.2047),
    Location::new("Navigli", 45.4516, 9.1766),
    Location::new("San Siro", 45.4781, 9.1240),
    Location::new("Porta Romana", 45.4514, 9.2036),
    Location::new("Citta Studi", 45.4781, 9.2270),
    Location::new("Bocconi", 45.4504, 9.1896),
    Location::new("Isola", 45.4881, 9.1886),
    Location::new("Porta Venezia", 45.4744, 9.2050),
    Location::new("CityLife", 45.4779, 9.1560),
    Location::new("Lambrate", 45.4847, 9.2372),
    Location::new("Bicocca", 45.5140, 9.2110),
];
