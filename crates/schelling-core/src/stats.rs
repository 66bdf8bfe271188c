//! Aggregate statistics derived from a grid.

use serde::{Deserialize, Serialize};

/// Global metrics for one grid state. Always recomputed from scratch, never patched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    /// Mean same-type neighbour fraction over agents with at least one neighbour, 0–100
    pub segregation: f64,
    /// Agents failing the satisfaction predicate
    pub unhappy_count: usize,
    /// Occupied cells
    pub total_agents: usize,
}

impl SimulationStats {
    pub fn happy_count(&self) -> usize {
        self.total_agents.saturating_sub(self.unhappy_count)
    }

    /// Fraction of agents that are satisfied, 1.0 for an empty grid
    pub fn happy_fraction(&self) -> f64 {
        if self.total_agents == 0 {
            1.0
        } else {
            self.happy_count() as f64 / self.total_agents as f64
        }
    }

    pub fn is_settled(&self) -> bool {
        self.unhappy_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_counts() {
        let stats = SimulationStats {
            segregation: 50.0,
            unhappy_count: 3,
            total_agents: 12,
        };
        assert_eq!(stats.happy_count(), 9);
        assert!((stats.happy_fraction() - 0.75).abs() < f64::EPSILON);
        assert!(!stats.is_settled());
    }

    #[test]
    fn test_empty_stats_are_settled() {
        let stats = SimulationStats::default();
        assert_eq!(stats.happy_fraction(), 1.0);
        assert!(stats.is_settled());
    }
}
