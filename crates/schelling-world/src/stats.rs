//! Aggregate statistics over a whole grid.

use crate::grid::Grid;
use crate::satisfaction::{is_satisfied, neighborhood};
use schelling_core::SimulationStats;

/// Recompute every metric from `grid`. Agents without occupied neighbours are left out
/// of the segregation mean but still count towards `total_agents` (and are never
/// unhappy).
pub fn compute_stats(grid: &Grid, threshold: f64) -> SimulationStats {
    let mut similarity_sum = 0.0;
    let mut counted = 0usize;
    let mut unhappy_count = 0usize;
    let mut total_agents = 0usize;

    for (pos, _) in grid.occupied() {
        total_agents += 1;
        let similarity = neighborhood(grid, pos).and_then(|census| census.similarity());
        if let Some(similarity) = similarity {
            similarity_sum += similarity;
            counted += 1;
        }
        if !is_satisfied(grid, pos, threshold) {
            unhappy_count += 1;
        }
    }

    let segregation = if counted > 0 {
        100.0 * similarity_sum / counted as f64
    } else {
        0.0
    };

    SimulationStats {
        segregation,
        unhappy_count,
        total_agents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_grid_stats() {
        let stats = compute_stats(&Grid::empty(3, 3), 0.5);
        assert_eq!(stats, SimulationStats::default());
    }

    #[test]
    fn test_isolated_agents_excluded_from_segregation() {
        let grid = Grid::from_layout(&["A.B", "...", "B.A"]).unwrap();
        let stats = compute_stats(&grid, 1.0);
        assert_eq!(stats.total_agents, 4);
        assert_eq!(stats.unhappy_count, 0);
        assert_eq!(stats.segregation, 0.0);
    }

    #[test]
    fn test_fully_segregated_blocks() {
        let grid = Grid::from_layout(&["AA.BB", "AA.BB"]).unwrap();
        let stats = compute_stats(&grid, 0.5);
        assert_eq!(stats.total_agents, 8);
        assert_eq!(stats.unhappy_count, 0);
        assert!((stats.segregation - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_checkerboard_mix() {
        // Compared against per-cell evaluation rather than hand-derived sums.
        let grid = Grid::from_layout(&["ABA", "BAB", "ABA"]).unwrap();
        let threshold = 0.5;
        let stats = compute_stats(&grid, threshold);

        let expected_unhappy = grid
            .occupied()
            .filter(|(pos, _)| !is_satisfied(&grid, *pos, threshold))
            .count();
        assert_eq!(stats.unhappy_count, expected_unhappy);

        let sims: Vec<f64> = grid
            .occupied()
            .filter_map(|(pos, _)| neighborhood(&grid, pos).and_then(|c| c.similarity()))
            .collect();
        let mean = 100.0 * sims.iter().sum::<f64>() / sims.len() as f64;
        assert!((stats.segregation - mean).abs() < 1e-9);
        assert_eq!(stats.total_agents, 9);
    }

    #[test]
    fn test_known_mean_similarity() {
        // A at (0,0) sees A,B -> 0.5; A at (0,1) sees A,B -> 0.5; B at (1,0) sees A,A -> 0.0
        let grid = Grid::from_layout(&["AA", "B."]).unwrap();
        let stats = compute_stats(&grid, 0.5);
        assert!((stats.segregation - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.unhappy_count, 1);
        assert_eq!(stats.total_agents, 3);
    }
}
