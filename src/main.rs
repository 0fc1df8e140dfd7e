use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use jiff::civil::{DateTime, Time};
use jiff::{SignedDuration, Zoned};
use serde::Serialize;
use tracing::info;

use fleet_planner::config::PlannerConfig;
use fleet_planner::kpi::FleetKpis;
use fleet_planner::scenario::{Scenario, ScenarioParams};
use fleet_planner::schedule::{default_start, Schedule};
use fleet_planner::session::PlannerSession;
use fleet_planner::solver::{Solution, SpanScope};
use fleet_planner::zones;

#[derive(Parser)]
#[clap(author, version, about = "Generate a delivery scenario, route the fleet and project arrival times", long_about = None)]
struct Cli {
    /// Service zone to draw stops from
    #[arg(short, long, default_value = "Milan")]
    zone: String,

    /// Number of customer stops
    #[arg(short, long, default_value_t = 12)]
    stops: usize,

    /// Number of vehicles
    #[arg(short, long, default_value_t = 3)]
    vehicles: usize,

    /// Maximum tour distance per vehicle, in meters
    #[arg(long, default_value_t = 50_000)]
    max_distance: i64,

    /// Seed for stop placement
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Planner configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load-balancing weight (overrides config)
    #[arg(long)]
    span_coefficient: Option<i64>,

    /// Balance only vehicles that have stops, letting idle vehicles stay idle
    #[arg(long)]
    balance_used_only: bool,

    /// Local search passes (overrides config)
    #[arg(long)]
    iterations: Option<usize>,

    /// Traffic intensity in [0, 1) (overrides config)
    #[arg(short, long)]
    traffic: Option<f64>,

    /// Free-flow speed in km/h (overrides config)
    #[arg(long)]
    speed: Option<f64>,

    /// Service minutes per stop (overrides config)
    #[arg(long)]
    service_minutes: Option<i64>,

    /// Cost per kilometer (overrides config)
    #[arg(long)]
    cost_per_km: Option<f64>,

    /// Departure time, e.g. "2024-05-06T08:00" (default: today at 08:00)
    #[arg(long)]
    start: Option<DateTime>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    scenario: &'a Scenario,
    solution: &'a Solution,
    schedules: &'a [Schedule],
    kpis: &'a FleetKpis,
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => PlannerConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PlannerConfig::default(),
    };
    apply_overrides(&cli, &mut config)?;
    config.validate()?;

    let zones = config.all_zones();
    let zone = zones::find(&zones, &cli.zone).ok_or_else(|| {
        let names: Vec<&str> = zones.iter().map(|zone| zone.name.as_str()).collect();
        anyhow!("unknown zone '{}', expected one of {}", cli.zone, names.join(", "))
    })?;

    let params = ScenarioParams {
        depot: zone.center,
        bounds: zone.bounds,
        stop_count: cli.stops,
        vehicle_count: cli.vehicles,
        max_distance_per_vehicle: cli.max_distance,
        seed: cli.seed,
    };

    let start = match cli.start {
        Some(start) => start,
        // The clock is read here only; the planner itself always takes it as input.
        None => default_start(Zoned::now().date()),
    };

    let mut session = PlannerSession::new();
    session
        .solve_scenario(&params, &config.solver)
        .with_context(|| format!("routing {} stops in {}", cli.stops, zone.name))?;
    let projection = session.reproject(start, &config.schedule, config.cost_per_km)?;
    let solved = session
        .last()
        .ok_or_else(|| anyhow!("no solution after a successful solve"))?;

    if cli.json {
        let report = Report {
            scenario: &solved.scenario,
            solution: &solved.solution,
            schedules: &projection.schedules,
            kpis: &projection.kpis,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for schedule in &projection.schedules {
        let route = &solved.solution.routes[schedule.vehicle];
        if !route.is_used() {
            println!("Vehicle {}: unused", schedule.vehicle + 1);
            continue;
        }
        println!(
            "Vehicle {}: {:.2} km, back at {}",
            schedule.vehicle + 1,
            route.distance as f64 / 1000.0,
            clock(schedule.end())
        );
        for entry in &schedule.entries {
            let name = solved
                .scenario
                .stop(entry.stop)
                .map_or("?", |stop| stop.name.as_str());
            println!(
                "  {}  {:<14} +{:.2} km",
                clock(entry.arrival),
                name,
                entry.leg_distance as f64 / 1000.0
            );
        }
    }

    let kpis = &projection.kpis;
    info!(
        total_km = kpis.total_distance_km(),
        total_time = %kpis.total_time,
        vehicles_used = kpis.vehicles_used,
        estimated_cost = kpis.estimated_cost,
        "fleet summary"
    );
    println!(
        "Total: {:.2} km, {} driving and service, {} vehicles, cost {:.2}",
        kpis.total_distance_km(),
        hours_minutes(kpis.total_time),
        kpis.vehicles_used,
        kpis.estimated_cost
    );

    Ok(())
}

fn apply_overrides(cli: &Cli, config: &mut PlannerConfig) -> Result<(), anyhow::Error> {
    if let Some(span_coefficient) = cli.span_coefficient {
        config.solver.span_coefficient = span_coefficient;
    }
    if cli.balance_used_only {
        config.solver.span_scope = SpanScope::UsedVehicles;
    }
    if let Some(iterations) = cli.iterations {
        config.solver.iteration_budget = iterations;
    }
    if let Some(traffic) = cli.traffic {
        config.schedule.traffic_intensity = traffic;
    }
    if let Some(speed) = cli.speed {
        config.schedule.base_speed_kmh = speed;
    }
    if let Some(minutes) = cli.service_minutes {
        let seconds = minutes
            .checked_mul(60)
            .ok_or_else(|| anyhow!("--service-minutes {minutes} is out of range"))?;
        config.schedule.service_duration = SignedDuration::from_secs(seconds);
    }
    if let Some(cost_per_km) = cli.cost_per_km {
        config.cost_per_km = cost_per_km;
    }
    Ok(())
}

fn clock(at: DateTime) -> String {
    let time: Time = at.time();
    format!("{:02}:{:02}", time.hour(), time.minute())
}

fn hours_minutes(duration: SignedDuration) -> String {
    let minutes = duration.as_secs() / 60;
    format!("{}h{:02}m", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use fleet_planner::schedule::ScheduleOptions;

    use super::*;

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = Cli::parse_from(["fleet-planner", "--service-minutes", "7", "--balance-used-only", "--traffic", "0.3"]);
        let mut config = PlannerConfig::default();
        apply_overrides(&cli, &mut config).unwrap();

        assert_eq!(config.schedule.service_duration, SignedDuration::from_mins(7));
        assert_eq!(config.schedule.traffic_intensity, 0.3);
        assert_eq!(config.solver.span_scope, SpanScope::UsedVehicles);
    }

    #[test]
    fn test_oversized_service_minutes_is_an_error() {
        let minutes = i64::MAX.to_string();
        let cli = Cli::parse_from(["fleet-planner", "--service-minutes", minutes.as_str()]);
        let mut config = PlannerConfig::default();

        assert!(apply_overrides(&cli, &mut config).is_err());
        assert_eq!(config.schedule.service_duration, ScheduleOptions::default().service_duration);
    }
}
