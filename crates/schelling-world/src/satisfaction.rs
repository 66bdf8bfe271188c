//! Satisfaction predicate over the Moore neighbourhood.

use crate::grid::Grid;
use schelling_core::CellPos;

/// Neighbour census for one occupied cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighborhood {
    /// Occupied neighbours sharing the agent's type
    pub same: usize,
    /// All occupied neighbours
    pub occupied: usize,
}

impl Neighborhood {
    /// Same-type fraction, `None` when there are no occupied neighbours
    pub fn similarity(&self) -> Option<f64> {
        (self.occupied > 0).then(|| self.same as f64 / self.occupied as f64)
    }
}

/// Count the occupied and same-type neighbours of the agent at `pos`.
/// Returns `None` for an empty or out-of-bounds cell.
pub fn neighborhood(grid: &Grid, pos: CellPos) -> Option<Neighborhood> {
    let agent = grid.agent(pos)?;
    let mut census = Neighborhood {
        same: 0,
        occupied: 0,
    };
    for neighbor in grid.neighbors(pos).filter_map(|n| grid.agent(n)) {
        census.occupied += 1;
        if neighbor.kind == agent.kind {
            census.same += 1;
        }
    }
    Some(census)
}

/// Whether the cell at `pos` meets `threshold`.
///
/// Empty cells are vacuously satisfied, and so is an agent with no occupied
/// neighbours whatever the threshold. Otherwise the same-type fraction must be at
/// least `threshold`.
pub fn is_satisfied(grid: &Grid, pos: CellPos, threshold: f64) -> bool {
    match neighborhood(grid, pos).and_then(|census| census.similarity()) {
        Some(similarity) => similarity >= threshold,
        None => true,
    }
}
