//! Distance matrix over the retained locations.
//!
//! Matrix index 0 is always the depot. The mapping from matrix index back to
//! the caller's `original_index` is kept in an explicit [`NodeTable`] built in
//! the same pass, never inferred from vector positions later on.

use crate::error::{PlannerError, Result};
use crate::haversine::HaversineMatrix;
use crate::model::{Coordinate, Location};
use crate::traits::{DistanceMatrixProvider, EngineProblem};

/// Ordered association list `matrix index -> original index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTable {
    original: Vec<usize>,
}

impl NodeTable {
    pub fn original_index(&self, matrix_index: usize) -> Option<usize> {
        self.original.get(matrix_index).copied()
    }

    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    /// `(matrix_index, original_index)` pairs in matrix order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.original.iter().copied().enumerate()
    }
}

/// Square, non-negative, whole-meter distance matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    weights: Vec<i64>,
}

impl DistanceMatrix {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, from: usize, to: usize) -> i64 {
        self.weights[from * self.size + to]
    }

    pub(crate) fn into_engine_problem(self) -> EngineProblem {
        EngineProblem::new(self.size, self.weights)
    }
}

/// Build the haversine matrix for `retained`, whose first entry is the depot.
pub fn build_matrix(retained: &[Location]) -> Result<(DistanceMatrix, NodeTable)> {
    build_matrix_with(&HaversineMatrix, retained)
}

/// Build the matrix from any provider, checking its shape.
pub fn build_matrix_with<P>(
    provider: &P,
    retained: &[Location],
) -> Result<(DistanceMatrix, NodeTable)>
where
    P: DistanceMatrixProvider,
{
    let positions: Vec<Coordinate> = retained.iter().map(|l| l.coordinate).collect();
    let rows = provider.matrix_for(&positions);
    let size = positions.len();

    if rows.len() != size {
        return Err(PlannerError::Matrix(format!(
            "expected {size} rows, provider returned {}",
            rows.len()
        )));
    }

    let mut weights = Vec::with_capacity(size * size);
    for (i, row) in rows.into_iter().enumerate() {
        if row.len() != size {
            return Err(PlannerError::Matrix(format!(
                "row {i} has {} columns, expected {size}",
                row.len()
            )));
        }
        if row[i] != 0 {
            return Err(PlannerError::Matrix(format!("diagonal entry {i} is {}", row[i])));
        }
        if let Some(negative) = row.iter().find(|w| **w < 0) {
            return Err(PlannerError::Matrix(format!(
                "row {i} contains negative weight {negative}"
            )));
        }
        weights.extend(row);
    }

    let nodes = NodeTable {
        original: retained.iter().map(|l| l.original_index).collect(),
    };

    tracing::debug!(size, "distance matrix built");

    Ok((
        DistanceMatrix { size, weights },
        nodes,
    ))
}
