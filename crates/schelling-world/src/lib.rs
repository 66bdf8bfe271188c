//! Segregation engine.
//!
//! A fixed grid of cells holds agents of two types. Each step, agents whose share of
//! same-type neighbours falls below a threshold relocate to random empty cells.

pub mod grid;
pub mod satisfaction;
pub mod stats;
pub mod simulation;
pub mod experiment;

pub use grid::Grid;
pub use satisfaction::{is_satisfied, neighborhood, Neighborhood};
pub use stats::compute_stats;
pub use simulation::{
    move_budget, place_agent, step, Relocation, RunSummary, Simulation, StepOutcome, StepStatus,
};
pub use experiment::{Experiment, ExperimentResult, SweepPoint, ThresholdSweep, TickRecord};
