//! fleet-planner core
//!
//! Assigns depot-based delivery stops to a fleet of vehicles, then projects
//! arrival times and fleet KPIs from the solved routes.

pub mod error;
pub mod traits;
pub mod haversine;
pub mod matrix;
pub mod scenario;
pub mod zones;
pub mod solver;
pub mod schedule;
pub mod kpi;
pub mod config;
pub mod session;

pub use error::{PlannerError, Result};
