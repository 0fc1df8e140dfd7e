//! Thin cache around the pure planner functions.
//!
//! Holds the last scenario and solution, keyed by the parameters that
//! produced them. Repeating the same request or re-projecting schedules after
//! a traffic or service-time change reuses it instead of re-solving; any other
//! request replaces it.

use jiff::civil::DateTime;
use jiff::SignedDuration;
use tracing::{debug, info};

use crate::config::SolverSettings;
use crate::error::{PlannerError, Result};
use crate::kpi::{aggregate_kpis, FleetKpis};
use crate::scenario::{generate_scenario, Scenario, ScenarioParams};
use crate::schedule::{project_solution, Schedule, ScheduleOptions};
use crate::solver::{solve, Solution, SpanScope};

/// Hashable identity of a solve request. Floats are keyed by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SolveKey {
    depot: (u64, u64),
    bounds: [u64; 4],
    stop_count: usize,
    vehicle_count: usize,
    max_distance_per_vehicle: i64,
    seed: u64,
    span_coefficient: i64,
    span_scope: SpanScope,
    iteration_budget: usize,
    time_limit: Option<SignedDuration>,
}

impl SolveKey {
    fn new(params: &ScenarioParams, settings: &SolverSettings) -> Self {
        let bounds = params.bounds;
        Self {
            depot: (params.depot.lat.to_bits(), params.depot.lon.to_bits()),
            bounds: [
                bounds.min_lat.to_bits(),
                bounds.max_lat.to_bits(),
                bounds.min_lon.to_bits(),
                bounds.max_lon.to_bits(),
            ],
            stop_count: params.stop_count,
            vehicle_count: params.vehicle_count,
            max_distance_per_vehicle: params.max_distance_per_vehicle,
            seed: params.seed,
            span_coefficient: settings.span_coefficient,
            span_scope: settings.span_scope,
            iteration_budget: settings.iteration_budget,
            time_limit: settings.time_limit,
        }
    }
}

/// A solved scenario.
#[derive(Debug, Clone)]
pub struct SolvedScenario {
    pub scenario: Scenario,
    pub solution: Solution,
}

/// Schedules and KPIs derived from a solved scenario.
#[derive(Debug, Clone)]
pub struct Projection {
    pub schedules: Vec<Schedule>,
    pub kpis: FleetKpis,
}

#[derive(Debug, Default)]
pub struct PlannerSession {
    last: Option<(SolveKey, SolvedScenario)>,
    solves: usize,
}

impl PlannerSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate and solve, or return the held result for an identical request.
    ///
    /// A failed solve clears the last result so a stale solution is never
    /// shown in place of the failure.
    pub fn solve_scenario(&mut self, params: &ScenarioParams, settings: &SolverSettings) -> Result<&SolvedScenario> {
        let key = SolveKey::new(params, settings);

        match self.last.take() {
            Some((held, solved)) if held == key => {
                debug!(seed = params.seed, "reusing last solution");
                self.last = Some((held, solved));
            }
            _ => {
                let outcome = generate_scenario(params).and_then(|scenario| {
                    let solution = solve(scenario.matrix(), &settings.solve_options(&scenario))?;
                    Ok(SolvedScenario { scenario, solution })
                });
                self.solves += 1;

                let solved = outcome?;
                info!(seed = params.seed, cost = solved.solution.cost, "solved new scenario");
                self.last = Some((key, solved));
            }
        }

        self.last
            .as_ref()
            .map(|(_, solved)| solved)
            .ok_or_else(|| PlannerError::invalid("solution missing from session"))
    }

    /// The most recent successful solve, if the latest request succeeded.
    pub fn last(&self) -> Option<&SolvedScenario> {
        self.last.as_ref().map(|(_, solved)| solved)
    }

    /// Project schedules and KPIs for the last solution without re-solving.
    pub fn reproject(&self, start: DateTime, options: &ScheduleOptions, cost_per_km: f64) -> Result<Projection> {
        let solved = self
            .last()
            .ok_or_else(|| PlannerError::invalid("no solved scenario to project"))?;
        let schedules = project_solution(&solved.solution, start, options)?;
        let kpis = aggregate_kpis(&solved.solution, &schedules, cost_per_km)?;
        Ok(Projection { schedules, kpis })
    }

    /// Number of times the solver actually ran.
    pub fn solve_count(&self) -> usize {
        self.solves
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}
