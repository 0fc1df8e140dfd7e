//! Fleet-level roll-up of a solution and its projected schedules.

use jiff::SignedDuration;
use serde::Serialize;

use crate::error::{PlannerError, Result};
use crate::matrix::Distance;
use crate::schedule::Schedule;
use crate::solver::Solution;

/// Matrix units (meters) per kilometer.
const UNITS_PER_KM: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FleetKpis {
    /// Sum of all tour distances, in meters.
    pub total_distance: Distance,
    /// Sum of every vehicle's depot-to-depot duration.
    pub total_time: SignedDuration,
    /// Vehicles with at least one stop.
    pub vehicles_used: usize,
    /// Total kilometers times the configured rate.
    pub estimated_cost: f64,
}

impl FleetKpis {
    pub fn total_distance_km(&self) -> f64 {
        self.total_distance as f64 / UNITS_PER_KM
    }
}

/// Aggregate distance, time, fleet usage and cost.
///
/// `schedules` must be the projection of `solution`: one per route, in
/// vehicle order.
pub fn aggregate_kpis(solution: &Solution, schedules: &[Schedule], cost_per_km: f64) -> Result<FleetKpis> {
    if !cost_per_km.is_finite() || cost_per_km < 0.0 {
        return Err(PlannerError::invalid(format!(
            "cost per km must be a non-negative number, got {cost_per_km}"
        )));
    }
    if schedules.len() != solution.routes.len() {
        return Err(PlannerError::invalid(format!(
            "{} schedules for {} routes",
            schedules.len(),
            solution.routes.len()
        )));
    }
    if let Some(schedule) = schedules
        .iter()
        .zip(&solution.routes)
        .find_map(|(schedule, route)| (schedule.vehicle != route.vehicle).then_some(schedule))
    {
        return Err(PlannerError::invalid(format!(
            "schedule for vehicle {} is out of order",
            schedule.vehicle
        )));
    }

    let total_distance: Distance = solution.routes.iter().map(|route| route.distance).sum();
    let total_time = schedules
        .iter()
        .try_fold(SignedDuration::ZERO, |total, schedule| total.checked_add(schedule.total_duration))
        .ok_or_else(|| PlannerError::NumericDegenerate("fleet time overflow".to_string()))?;

    let kpis = FleetKpis {
        total_distance,
        total_time,
        vehicles_used: solution.vehicles_used(),
        estimated_cost: total_distance as f64 / UNITS_PER_KM * cost_per_km,
    };
    Ok(kpis)
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;
    use crate::matrix::DistanceMatrix;
    use crate::schedule::{default_start, project_solution, ScheduleOptions};
    use crate::solver::Route;

    fn solution() -> Solution {
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0, 3_000, 5_000],
            vec![3_000, 0, 4_000],
            vec![5_000, 4_000, 0],
        ])
        .unwrap();
        let routes = vec![
            Route::new(0, vec![1], &matrix),
            Route::new(1, vec![2], &matrix),
            Route::new(2, Vec::new(), &matrix),
        ];
        Solution {
            total_distance: routes.iter().map(|route| route.distance).sum(),
            cost: 16_000,
            routes,
        }
    }

    #[test]
    fn test_aggregate() {
        let solution = solution();
        let options = ScheduleOptions::new(60.0, 0.0, SignedDuration::from_mins(5));
        let schedules = project_solution(&solution, default_start(date(2024, 1, 1)), &options).unwrap();

        let kpis = aggregate_kpis(&solution, &schedules, 0.5).unwrap();
        assert_eq!(kpis.total_distance, 16_000);
        assert_eq!(kpis.total_distance_km(), 16.0);
        assert_eq!(kpis.vehicles_used, 2);
        assert!((kpis.estimated_cost - 8.0).abs() < 1e-9);
        // 16 km at 60 km/h plus two services
        assert_eq!(kpis.total_time, SignedDuration::from_mins(26));
    }

    #[test]
    fn test_rejects_bad_rate() {
        let solution = solution();
        let schedules =
            project_solution(&solution, default_start(date(2024, 1, 1)), &ScheduleOptions::default()).unwrap();
        assert!(aggregate_kpis(&solution, &schedules, -1.0).is_err());
        assert!(aggregate_kpis(&solution, &schedules, f64::NAN).is_err());
    }

    #[test]
    fn test_rejects_mismatched_schedules() {
        let solution = solution();
        let schedules =
            project_solution(&solution, default_start(date(2024, 1, 1)), &ScheduleOptions::default()).unwrap();
        assert!(matches!(
            aggregate_kpis(&solution, &schedules[..1], 1.0),
            Err(PlannerError::InvalidConfiguration(_))
        ));

        let mut reversed = schedules.clone();
        reversed.reverse();
        assert!(aggregate_kpis(&solution, &reversed, 1.0).is_err());
    }
}
