//! Scenario generation: a depot plus randomly placed customer stops.
//!
//! Randomness is always injected. `generate_customers` takes any `Rng`, and
//! `generate_scenario` seeds a `SmallRng` from the parameters, so the same
//! parameters always produce the same scenario.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PlannerError, Result};
use crate::haversine::Coordinate;
use crate::matrix::{build_distance_matrix, Distance, DistanceMatrix};

/// Index of the depot in every stop list and matrix.
pub const DEPOT: usize = 0;

/// A depot or customer location. Index 0 is always the depot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: usize,
    pub coordinate: Coordinate,
    pub name: String,
}

impl Stop {
    pub fn depot(coordinate: Coordinate) -> Self {
        Self {
            id: DEPOT,
            coordinate,
            name: "Depot".to_string(),
        }
    }

    pub fn customer(id: usize, coordinate: Coordinate) -> Self {
        Self {
            id,
            coordinate,
            name: format!("Customer {id}"),
        }
    }

    pub fn is_depot(&self) -> bool {
        self.id == DEPOT
    }
}

/// Latitude/longitude box customers are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    pub const fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Square box of `half_deg` degrees around `center`.
    pub fn around(center: Coordinate, half_deg: f64) -> Self {
        Self::new(
            center.lat - half_deg,
            center.lat + half_deg,
            center.lon - half_deg,
            center.lon + half_deg,
        )
    }

    pub fn validate(&self) -> Result<()> {
        let values = [self.min_lat, self.max_lat, self.min_lon, self.max_lon];
        if values.iter().any(|value| !value.is_finite()) {
            return Err(PlannerError::invalid(format!("non-finite bounds {:?}", self)));
        }
        if self.min_lat > self.max_lat {
            return Err(PlannerError::invalid(format!(
                "min latitude {} exceeds max latitude {}",
                self.min_lat, self.max_lat
            )));
        }
        if self.min_lon > self.max_lon {
            return Err(PlannerError::invalid(format!(
                "min longitude {} exceeds max longitude {}",
                self.min_lon, self.max_lon
            )));
        }
        if self.min_lat < -90.0 || self.max_lat > 90.0 {
            return Err(PlannerError::invalid("latitude bounds outside [-90, 90]"));
        }
        if self.min_lon < -180.0 || self.max_lon > 180.0 {
            return Err(PlannerError::invalid("longitude bounds outside [-180, 180]"));
        }
        Ok(())
    }

    pub fn contains(&self, coordinate: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&coordinate.lat)
            && (self.min_lon..=self.max_lon).contains(&coordinate.lon)
    }
}

/// Draw `count` customers uniformly inside `bounds`, numbered from 1.
pub fn generate_customers<R: Rng>(bounds: &Bounds, count: usize, rng: &mut R) -> Result<Vec<Stop>> {
    bounds.validate()?;

    let customers = (1..=count)
        .map(|id| {
            let lat = rng.gen_range(bounds.min_lat..=bounds.max_lat);
            let lon = rng.gen_range(bounds.min_lon..=bounds.max_lon);
            Stop::customer(id, Coordinate::new(lat, lon))
        })
        .collect();

    Ok(customers)
}

/// Everything needed to (re)generate a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub depot: Coordinate,
    pub bounds: Bounds,
    pub stop_count: usize,
    pub vehicle_count: usize,
    pub max_distance_per_vehicle: Distance,
    pub seed: u64,
}

/// A generated problem instance. Replaced wholesale, never edited in place.
#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    stops: Vec<Stop>,
    matrix: DistanceMatrix,
    vehicle_count: usize,
    max_distance_per_vehicle: Distance,
}

impl Scenario {
    /// Assemble a scenario from explicit stops (depot first).
    pub fn new(stops: Vec<Stop>, vehicle_count: usize, max_distance_per_vehicle: Distance) -> Result<Self> {
        match stops.first() {
            Some(depot) if depot.is_depot() => {}
            _ => return Err(PlannerError::invalid("scenario stops must start with the depot")),
        }
        if let Some((index, stop)) = stops.iter().enumerate().find(|(index, stop)| stop.id != *index) {
            return Err(PlannerError::invalid(format!(
                "stop '{}' has id {} but sits at index {index}",
                stop.name, stop.id
            )));
        }
        if vehicle_count == 0 {
            return Err(PlannerError::invalid("vehicle count must be at least 1"));
        }
        if max_distance_per_vehicle <= 0 {
            return Err(PlannerError::invalid("max distance per vehicle must be positive"));
        }

        let matrix = build_distance_matrix(&stops)?;

        Ok(Self {
            stops,
            matrix,
            vehicle_count,
            max_distance_per_vehicle,
        })
    }

    pub fn depot(&self) -> &Stop {
        &self.stops[DEPOT]
    }

    pub fn customers(&self) -> &[Stop] {
        &self.stops[1..]
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn stop(&self, index: usize) -> Option<&Stop> {
        self.stops.get(index)
    }

    pub fn matrix(&self) -> &DistanceMatrix {
        &self.matrix
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicle_count
    }

    pub fn max_distance_per_vehicle(&self) -> Distance {
        self.max_distance_per_vehicle
    }
}

/// Generate a reproducible scenario from `params`.
pub fn generate_scenario(params: &ScenarioParams) -> Result<Scenario> {
    if !params.depot.is_finite() {
        return Err(PlannerError::invalid(format!("non-finite depot {}", params.depot)));
    }

    let mut rng = SmallRng::seed_from_u64(params.seed);
    let customers = generate_customers(&params.bounds, params.stop_count, &mut rng)?;

    let mut stops = Vec::with_capacity(customers.len() + 1);
    stops.push(Stop::depot(params.depot));
    stops.extend(customers);

    let scenario = Scenario::new(stops, params.vehicle_count, params.max_distance_per_vehicle)?;
    info!(
        customers = scenario.customers().len(),
        vehicles = scenario.vehicle_count(),
        seed = params.seed,
        "generated scenario"
    );
    Ok(scenario)
}
