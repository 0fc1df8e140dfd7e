//! Great-circle distances and the haversine matrix provider.
//!
//! Distances ignore the road network entirely; they are a proxy for road
//! distance that is always available and cheap to compute.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::matrix::{Distance, DistanceMatrix};
use crate::traits::DistanceMatrixProvider;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Matrix entries are meters: kilometers scaled by this factor and truncated.
const UNITS_PER_KM: f64 = 1000.0;

/// A WGS-84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Haversine distance between two points in kilometers.
///
/// The intermediate `a` term is clamped to `[0, 1]`: floating-point overshoot
/// near antipodal points would otherwise push `asin` out of its domain.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> Result<f64> {
    if !from.is_finite() || !to.is_finite() {
        return Err(PlannerError::invalid(format!(
            "non-finite coordinate in distance query: {from} -> {to}"
        )));
    }

    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    Ok(EARTH_RADIUS_KM * c)
}

/// Convert kilometers to integer matrix units, truncating toward zero.
pub fn km_to_units(km: f64) -> Distance {
    (km * UNITS_PER_KM).trunc() as Distance
}

/// Haversine-based distance matrix provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineMatrix;

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[Coordinate]) -> Result<DistanceMatrix> {
        if let Some(bad) = locations.iter().find(|location| !location.is_finite()) {
            return Err(PlannerError::invalid(format!("non-finite location {bad}")));
        }

        // Rows are independent; the collected order keeps the result deterministic.
        let rows = locations
            .par_iter()
            .enumerate()
            .map(|(i, from)| {
                locations
                    .iter()
                    .enumerate()
                    .map(|(j, to)| {
                        if i == j {
                            Ok(0)
                        } else {
                            haversine_km(*from, *to).map(km_to_units)
                        }
                    })
                    .collect::<Result<Vec<Distance>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        DistanceMatrix::from_rows(rows)
    }
}
