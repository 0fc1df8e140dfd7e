//! Test fixtures for fleet-planner.
//!
//! Provides realistic test data including:
//! - Real Milan locations (from OpenStreetMap)
//! - A builder for hand-made scenarios and random matrices

pub mod milan_locations;

pub use milan_locations::*;

use fleet_planner::haversine::Coordinate;
use fleet_planner::matrix::{Distance, DistanceMatrix};
use fleet_planner::scenario::{Scenario, Stop};
use fleet_planner::solver::Solution;

/// Builder for scenarios with explicit stop placement.
#[derive(Clone, Debug)]
pub struct ScenarioBuilder {
    depot: Coordinate,
    customers: Vec<Coordinate>,
    vehicle_count: usize,
    max_distance_per_vehicle: Distance,
}

impl ScenarioBuilder {
    pub fn new(depot: Coordinate) -> Self {
        Self {
            depot,
            customers: Vec::new(),
            vehicle_count: 1,
            max_distance_per_vehicle: 50_000,
        }
    }

    pub fn customer(mut self, lat: f64, lon: f64) -> Self {
        self.customers.push(Coordinate::new(lat, lon));
        self
    }

    pub fn customers(mut self, locations: &[Location]) -> Self {
        self.customers.extend(locations.iter().map(Location::coordinate));
        self
    }

    pub fn vehicles(mut self, vehicle_count: usize) -> Self {
        self.vehicle_count = vehicle_count;
        self
    }

    pub fn max_distance(mut self, max_distance_per_vehicle: Distance) -> Self {
        self.max_distance_per_vehicle = max_distance_per_vehicle;
        self
    }

    pub fn build(self) -> Scenario {
        let mut stops = vec![Stop::depot(self.depot)];
        stops.extend(
            self.customers
                .into_iter()
                .enumerate()
                .map(|(index, coordinate)| Stop::customer(index + 1, coordinate)),
        );
        Scenario::new(stops, self.vehicle_count, self.max_distance_per_vehicle).expect("valid test scenario")
    }
}

/// Every customer index of `matrix` appears in exactly one route.
pub fn assert_partition(solution: &Solution, matrix: &DistanceMatrix) {
    let mut seen: Vec<usize> = solution
        .routes
        .iter()
        .flat_map(|route| route.visits.iter().copied())
        .collect();
    seen.sort_unstable();
    let expected: Vec<usize> = (1..matrix.size()).collect();
    assert_eq!(seen, expected, "stops must be served exactly once");
}

/// Every route is within the cap and its cached distance matches the matrix.
pub fn assert_within_cap(solution: &Solution, matrix: &DistanceMatrix, cap: Distance) {
    for route in &solution.routes {
        let walked: Distance = route
            .path()
            .windows(2)
            .map(|pair| matrix.get(pair[0], pair[1]))
            .sum();
        assert_eq!(walked, route.distance, "vehicle {} distance", route.vehicle);
        assert!(
            route.distance <= cap,
            "vehicle {} drives {} over cap {}",
            route.vehicle,
            route.distance,
            cap
        );
    }
}
