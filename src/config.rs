//! Planner configuration.
//!
//! Everything has a default, so a config file only needs the values it
//! changes. Durations use jiff's serde format (`"PT10M"` or `"10m"`).

use std::fs;
use std::path::Path;

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::scenario::Scenario;
use crate::schedule::ScheduleOptions;
use crate::solver::{SolveOptions, SpanScope, MAX_SPAN_COEFFICIENT};
use crate::zones::{self, Zone};

/// Solver tuning that does not depend on the scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub span_coefficient: i64,
    pub span_scope: SpanScope,
    pub iteration_budget: usize,
    pub time_limit: Option<SignedDuration>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        let options = SolveOptions::default();
        Self {
            span_coefficient: options.span_coefficient,
            span_scope: options.span_scope,
            iteration_budget: options.iteration_budget,
            time_limit: options.time_limit,
        }
    }
}

impl SolverSettings {
    /// Combine with a scenario's fleet size and cap.
    pub fn solve_options(&self, scenario: &Scenario) -> SolveOptions {
        SolveOptions {
            span_coefficient: self.span_coefficient,
            span_scope: self.span_scope,
            iteration_budget: self.iteration_budget,
            time_limit: self.time_limit,
            ..SolveOptions::for_scenario(scenario)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub solver: SolverSettings,
    pub schedule: ScheduleOptions,
    /// Operating cost per kilometer driven.
    pub cost_per_km: f64,
    /// Zones in addition to the built-in ones; a zone with a built-in name
    /// replaces it.
    pub zones: Vec<Zone>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            solver: SolverSettings::default(),
            schedule: ScheduleOptions::default(),
            cost_per_km: 1.2,
            zones: Vec::new(),
        }
    }
}

impl PlannerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_SPAN_COEFFICIENT).contains(&self.solver.span_coefficient) {
            return Err(PlannerError::invalid(format!(
                "span coefficient must be in [0, {MAX_SPAN_COEFFICIENT}], got {}",
                self.solver.span_coefficient
            )));
        }
        if !self.cost_per_km.is_finite() || self.cost_per_km < 0.0 {
            return Err(PlannerError::invalid("cost per km must be a non-negative number"));
        }
        self.schedule.validate()?;
        self.zones.iter().try_for_each(Zone::validate)
    }

    /// Built-in zones merged with the configured ones.
    pub fn all_zones(&self) -> Vec<Zone> {
        let mut all: Vec<Zone> = zones::builtin()
            .into_iter()
            .filter(|zone| zones::find(&self.zones, &zone.name).is_none())
            .collect();
        all.extend(self.zones.iter().cloned());
        all
    }
}
