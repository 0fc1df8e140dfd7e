//! Dense integer distance matrix.

use serde::Serialize;
use tracing::debug;

use crate::error::{PlannerError, Result};
use crate::haversine::{Coordinate, HaversineMatrix};
use crate::scenario::Stop;
use crate::traits::DistanceMatrixProvider;

/// Integer distance in meters.
pub type Distance = i64;

/// A square distance table stored in row-major order.
///
/// Index 0 is the depot. The diagonal is zero and all entries are
/// non-negative; there are no mutators once the matrix is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistanceMatrix {
    data: Vec<Distance>,
    size: usize,
}

impl DistanceMatrix {
    /// Build a matrix from explicit rows, validating its shape and entries.
    pub fn from_rows(rows: Vec<Vec<Distance>>) -> Result<Self> {
        let size = rows.len();
        let mut data = Vec::with_capacity(size * size);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(PlannerError::invalid(format!(
                    "distance matrix row {i} has {} entries, expected {size}",
                    row.len()
                )));
            }
            for (j, &value) in row.iter().enumerate() {
                if value < 0 {
                    return Err(PlannerError::invalid(format!(
                        "negative distance {value} at ({i}, {j})"
                    )));
                }
                if i == j && value != 0 {
                    return Err(PlannerError::invalid(format!(
                        "diagonal entry ({i}, {i}) must be zero, got {value}"
                    )));
                }
            }
            data.extend(row);
        }

        Ok(Self { data, size })
    }

    /// Distance from `from` to `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[inline]
    pub fn get(&self, from: usize, to: usize) -> Distance {
        self.data[from * self.size + to]
    }

    /// Number of locations, depot included.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of customer stops (every location except the depot).
    pub fn customer_count(&self) -> usize {
        self.size.saturating_sub(1)
    }

    /// Longest single distance in the table; zero when empty.
    pub fn max_entry(&self) -> Distance {
        self.data.iter().copied().max().unwrap_or(0)
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| (i + 1..self.size).all(|j| self.get(i, j) == self.get(j, i)))
    }
}

/// Build the pairwise great-circle matrix for `stops` (depot first).
pub fn build_distance_matrix(stops: &[Stop]) -> Result<DistanceMatrix> {
    let locations: Vec<Coordinate> = stops.iter().map(|stop| stop.coordinate).collect();
    let matrix = HaversineMatrix.matrix_for(&locations)?;
    debug!(locations = matrix.size(), "built haversine distance matrix");
    Ok(matrix)
}
