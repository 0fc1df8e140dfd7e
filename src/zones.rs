//! Named service zones: a depot location plus the box customers are drawn from.
//!
//! Boxes are kept tight around each city center so generated stops stay on
//! land and inside the service area.

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::haversine::Coordinate;
use crate::scenario::Bounds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub center: Coordinate,
    pub bounds: Bounds,
}

impl Zone {
    pub fn new(name: impl Into<String>, center: Coordinate, bounds: Bounds) -> Self {
        Self {
            name: name.into(),
            center,
            bounds,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.center.is_finite() {
            return Err(PlannerError::invalid(format!("zone '{}' has a non-finite center", self.name)));
        }
        self.bounds.validate()
    }
}

/// Zones shipped with the planner.
pub fn builtin() -> Vec<Zone> {
    vec![
        Zone::new("Milan", Coordinate::new(45.4642, 9.19), Bounds::new(45.43, 45.50, 9.13, 9.24)),
        Zone::new("Paris", Coordinate::new(48.8566, 2.3522), Bounds::new(48.82, 48.90, 2.27, 2.41)),
        Zone::new("Berlin", Coordinate::new(52.52, 13.405), Bounds::new(52.47, 52.56, 13.30, 13.48)),
        Zone::new("Hamburg", Coordinate::new(53.5511, 9.9937), Bounds::new(53.54, 53.60, 9.93, 10.08)),
        Zone::new("Istanbul", Coordinate::new(41.0082, 28.9784), Bounds::new(40.99, 41.07, 28.90, 28.98)),
        Zone::new("Cassino", Coordinate::new(41.4917, 13.8311), Bounds::new(41.47, 41.51, 13.80, 13.86)),
    ]
}

/// Case-insensitive lookup by zone name.
pub fn find<'a>(zones: &'a [Zone], name: &str) -> Option<&'a Zone> {
    zones.iter().find(|zone| zone.name.eq_ignore_ascii_case(name))
}
