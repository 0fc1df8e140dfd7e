//! Seams between the planner core and its data sources.

use crate::error::Result;
use crate::haversine::Coordinate;
use crate::matrix::DistanceMatrix;

/// Provides a distance matrix for a set of locations.
///
/// The matrix is indexed by the provided location order, so index 0 must be
/// the depot when the result feeds the solver.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[Coordinate]) -> Result<DistanceMatrix>;
}
