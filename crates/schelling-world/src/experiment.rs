//! Headless batch runs: one simulation to completion, or a sweep over thresholds.

use crate::simulation::Simulation;
use schelling_core::{Error, Result, SimulationConfig, SimulationStats};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A simulation run that can be executed without a presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub config: SimulationConfig,
    pub max_ticks: u64,
}

/// Statistics after one tick (tick 0 is the initial board)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub tick: u64,
    pub relocations: usize,
    pub stats: SimulationStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub config: SimulationConfig,
    pub ticks: u64,
    pub settled: bool,
    pub history: Vec<TickRecord>,
    pub final_stats: SimulationStats,
    /// Final board rendered as rows of `A`, `B` and `.`
    pub final_layout: String,
}

impl Experiment {
    pub fn new(config: SimulationConfig, max_ticks: u64) -> Self {
        Self { config, max_ticks }
    }

    pub fn execute(self) -> Result<ExperimentResult> {
        let mut simulation = Simulation::new(self.config.clone())?;

        let mut history = vec![TickRecord {
            tick: 0,
            relocations: 0,
            stats: simulation.stats(),
        }];
        let summary = simulation.run_with_hook(self.max_ticks, |outcome, stats| {
            history.push(TickRecord {
                tick: history.len() as u64,
                relocations: outcome.relocations.len(),
                stats: *stats,
            });
        })?;

        Ok(ExperimentResult {
            config: self.config,
            ticks: summary.steps,
            settled: summary.settled(),
            history,
            final_stats: summary.final_stats,
            final_layout: simulation.grid().to_string(),
        })
    }
}

/// Final outcome for one threshold of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub threshold: f64,
    pub ticks: u64,
    pub settled: bool,
    pub segregation: f64,
    pub unhappy_count: usize,
    pub happy_fraction: f64,
}

/// The same board seed run once per threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdSweep {
    pub base: SimulationConfig,
    pub thresholds: Vec<f64>,
    pub max_ticks: u64,
}

impl ThresholdSweep {
    /// Evenly spaced thresholds from 0 to 1 inclusive, `increment` apart
    pub fn evenly_spaced(base: SimulationConfig, increment: f64, max_ticks: u64) -> Result<Self> {
        if !(increment > 0.0 && increment <= 1.0) {
            return Err(Error::InvalidConfiguration(format!(
                "sweep increment must be in (0, 1], got {increment}"
            )));
        }
        let count = (1.0 / increment).round() as usize;
        let thresholds = (0..=count)
            .map(|i| (i as f64 * increment).min(1.0))
            .collect();
        Ok(Self {
            base,
            thresholds,
            max_ticks,
        })
    }

    pub fn execute(&self) -> Result<Vec<SweepPoint>> {
        self.thresholds
            .iter()
            .map(|&threshold| -> Result<SweepPoint> {
                let config = SimulationConfig {
                    threshold,
                    ..self.base.clone()
                };
                let result = Experiment::new(config, self.max_ticks).execute()?;
                info!(
                    threshold,
                    ticks = result.ticks,
                    settled = result.settled,
                    segregation = format!("{:.1}%", result.final_stats.segregation),
                    "Sweep point complete"
                );
                Ok(SweepPoint {
                    threshold,
                    ticks: result.ticks,
                    settled: result.settled,
                    segregation: result.final_stats.segregation,
                    unhappy_count: result.final_stats.unhappy_count,
                    happy_fraction: result.final_stats.happy_fraction(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schelling_core::GridConfig;

    fn small_config(threshold: f64) -> SimulationConfig {
        SimulationConfig {
            grid: GridConfig {
                rows: 8,
                cols: 8,
                empty_ratio: 0.25,
            },
            threshold,
            seed: 12,
        }
    }

    #[test]
    fn test_experiment_records_history() {
        let result = Experiment::new(small_config(0.4), 300).execute().unwrap();

        assert_eq!(result.history.len() as u64, result.ticks + 1);
        assert_eq!(result.history[0].tick, 0);
        assert!(result
            .history
            .iter()
            .all(|record| record.stats.total_agents == 48));
        assert_eq!(result.final_layout.lines().count(), 8);
        assert_eq!(
            result.history.last().map(|r| r.stats),
            Some(result.final_stats)
        );
    }

    #[test]
    fn test_zero_threshold_settles_immediately() {
        let result = Experiment::new(small_config(0.0), 50).execute().unwrap();
        assert!(result.settled);
        assert_eq!(result.ticks, 1);
        assert_eq!(result.history[1].relocations, 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = small_config(0.5);
        config.grid.rows = 0;
        assert!(Experiment::new(config, 10).execute().is_err());
    }

    #[test]
    fn test_sweep_thresholds() {
        let sweep = ThresholdSweep::evenly_spaced(small_config(0.0), 0.25, 20).unwrap();
        assert_eq!(sweep.thresholds, vec![0.0, 0.25, 0.5, 0.75, 1.0]);

        let points = sweep.execute().unwrap();
        assert_eq!(points.len(), 5);
        assert!(points[0].settled);
        assert_eq!(points[0].unhappy_count, 0);
        assert_eq!(points[0].happy_fraction, 1.0);

        assert!(ThresholdSweep::evenly_spaced(small_config(0.0), 0.0, 20).is_err());
    }
}
