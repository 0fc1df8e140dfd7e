//! Arrival-time projection for solved routes.
//!
//! Given a route and an explicit start time, walk the legs at the effective
//! speed (base speed slowed by traffic) and add a fixed service time at every
//! customer. Nothing here reads the clock or mutates the route, so the same
//! inputs always give the same timestamps and traffic changes never re-solve.

use jiff::civil::{Date, DateTime};
use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::matrix::Distance;
use crate::scenario::DEPOT;
use crate::solver::{Route, Solution};

/// Average driving speed assumption when none is configured.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Matrix units (meters) per kilometer.
const UNITS_PER_KM: f64 = 1000.0;

/// Vehicles leave the depot at this hour unless told otherwise.
const DEFAULT_START_HOUR: i8 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleOptions {
    /// Free-flow speed in km/h.
    pub base_speed_kmh: f64,
    /// Fraction of speed lost to traffic, in `[0, 1)`.
    pub traffic_intensity: f64,
    /// Time spent at each customer.
    pub service_duration: SignedDuration,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            base_speed_kmh: DEFAULT_SPEED_KMH,
            traffic_intensity: 0.0,
            service_duration: SignedDuration::from_mins(10),
        }
    }
}

impl ScheduleOptions {
    pub fn new(base_speed_kmh: f64, traffic_intensity: f64, service_duration: SignedDuration) -> Self {
        Self {
            base_speed_kmh,
            traffic_intensity,
            service_duration,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.base_speed_kmh.is_finite() || self.base_speed_kmh <= 0.0 {
            return Err(PlannerError::invalid(format!(
                "base speed must be positive, got {} km/h",
                self.base_speed_kmh
            )));
        }
        if !self.traffic_intensity.is_finite() || !(0.0..1.0).contains(&self.traffic_intensity) {
            return Err(PlannerError::invalid(format!(
                "traffic intensity must be in [0, 1), got {}",
                self.traffic_intensity
            )));
        }
        if self.service_duration.is_negative() {
            return Err(PlannerError::invalid("service duration must not be negative"));
        }
        Ok(())
    }

    /// Base speed reduced by traffic, in km/h. Always positive once validated.
    pub fn effective_speed_kmh(&self) -> Result<f64> {
        self.validate()?;
        Ok(self.base_speed_kmh * (1.0 - self.traffic_intensity))
    }
}

/// Projected arrival at one stop of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub stop: usize,
    pub arrival: DateTime,
    /// Arrival plus service time; equal to `arrival` for the depot return.
    pub departure: DateTime,
    /// Length of the leg that ends at this stop.
    pub leg_distance: Distance,
}

/// Projected timeline of one vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub vehicle: usize,
    pub start: DateTime,
    /// One entry per leg: every customer, then the return to the depot.
    pub entries: Vec<ScheduleEntry>,
    /// Time from leaving the depot to returning to it.
    pub total_duration: SignedDuration,
}

impl Schedule {
    /// Return time at the depot; the start time for an unused vehicle.
    pub fn end(&self) -> DateTime {
        self.entries.last().map_or(self.start, |entry| entry.arrival)
    }
}

/// `date` at the default 08:00 departure.
pub fn default_start(date: Date) -> DateTime {
    date.at(DEFAULT_START_HOUR, 0, 0, 0)
}

/// Time needed to cover `distance` meters at `speed_kmh`.
pub fn travel_time(distance: Distance, speed_kmh: f64) -> Result<SignedDuration> {
    if !speed_kmh.is_finite() || speed_kmh <= 0.0 {
        return Err(PlannerError::NumericDegenerate(format!(
            "cannot travel at {speed_kmh} km/h"
        )));
    }
    let seconds = distance as f64 * 3600.0 / (UNITS_PER_KM * speed_kmh);
    SignedDuration::try_from_secs_f64(seconds)
        .map_err(|err| PlannerError::NumericDegenerate(format!("travel time for {distance} m: {err}")))
}

/// Project arrival times along `route` leaving the depot at `start`.
pub fn project_schedule(route: &Route, start: DateTime, options: &ScheduleOptions) -> Result<Schedule> {
    let speed = options.effective_speed_kmh()?;

    let mut elapsed = SignedDuration::ZERO;
    let mut entries = Vec::with_capacity(route.legs.len());

    for leg in &route.legs {
        elapsed = add(elapsed, travel_time(leg.distance, speed)?)?;
        let arrival = offset(start, elapsed)?;

        let departure = if leg.to == DEPOT {
            arrival
        } else {
            elapsed = add(elapsed, options.service_duration)?;
            offset(start, elapsed)?
        };

        entries.push(ScheduleEntry {
            stop: leg.to,
            arrival,
            departure,
            leg_distance: leg.distance,
        });
    }

    Ok(Schedule {
        vehicle: route.vehicle,
        start,
        entries,
        total_duration: elapsed,
    })
}

/// Project every route of `solution` from the same start time.
pub fn project_solution(solution: &Solution, start: DateTime, options: &ScheduleOptions) -> Result<Vec<Schedule>> {
    solution
        .routes
        .iter()
        .map(|route| project_schedule(route, start, options))
        .collect()
}

fn add(elapsed: SignedDuration, extra: SignedDuration) -> Result<SignedDuration> {
    elapsed
        .checked_add(extra)
        .ok_or_else(|| PlannerError::NumericDegenerate("schedule duration overflow".to_string()))
}

fn offset(start: DateTime, elapsed: SignedDuration) -> Result<DateTime> {
    start
        .checked_add(elapsed)
        .map_err(|err| PlannerError::NumericDegenerate(format!("arrival time out of range: {err}")))
}
