//! Planner error type.

use thiserror::Error;

/// Every failure the planner can report.
///
/// `Infeasible` is an expected outcome of solving, not a fault: callers are
/// meant to relax the cap or add vehicles and try again.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("no feasible routing under the distance cap (unserved stops: {unserved:?})")]
    Infeasible { unserved: Vec<usize> },

    #[error("numeric degenerate: {0}")]
    NumericDegenerate(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlannerError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        PlannerError::InvalidConfiguration(message.into())
    }
}

impl From<serde_json::Error> for PlannerError {
    fn from(err: serde_json::Error) -> Self {
        PlannerError::Parse(err.to_string())
    }
}

/// Shorthand result type for the planner.
pub type Result<T> = std::result::Result<T, PlannerError>;
