//! Relocation engine and the simulation that owns a grid between ticks.

use crate::grid::Grid;
use crate::satisfaction::is_satisfied;
use crate::stats::compute_stats;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use schelling_core::{
    validate_threshold, AgentId, CellPos, Result, SimulationConfig, SimulationStats,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Why a step ended the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// At least one agent relocated
    Moved,
    /// Nobody is unsatisfied
    Settled,
    /// Unsatisfied agents exist but there is no empty cell to go to
    NoVacancy,
}

/// One agent's move within a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relocation {
    pub agent: AgentId,
    pub from: CellPos,
    pub to: CellPos,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub status: StepStatus,
    /// Unsatisfied agents in the pre-step snapshot
    pub unsatisfied: usize,
    /// Empty cells in the pre-step snapshot
    pub vacancies: usize,
    pub relocations: Vec<Relocation>,
}

impl StepOutcome {
    pub fn moved(&self) -> bool {
        !self.relocations.is_empty()
    }
}

/// At most half of the unsatisfied agents move per step, and always at least one.
/// Moving everyone at once makes the population swap back and forth between steps.
pub fn move_budget(unsatisfied: usize) -> usize {
    (unsatisfied / 2).max(1)
}

/// Advance `grid` by one batch of relocations.
///
/// Satisfaction is judged once against the pre-step state. Unsatisfied agents and the
/// cells that were empty before the step are shuffled independently and paired in
/// order, up to [`move_budget`]. Cells vacated during the step are not offered as
/// targets until the next step.
pub fn step<R: Rng + ?Sized>(
    grid: &mut Grid,
    threshold: f64,
    rng: &mut R,
) -> Result<StepOutcome> {
    grid.validate()?;
    validate_threshold(threshold)?;

    let snapshot: &Grid = grid;
    let mut unsatisfied: Vec<CellPos> = snapshot
        .occupied()
        .map(|(pos, _)| pos)
        .filter(|pos| !is_satisfied(snapshot, *pos, threshold))
        .collect();
    let mut targets: Vec<CellPos> = snapshot.empty_cells().collect();

    let mut outcome = StepOutcome {
        status: StepStatus::Settled,
        unsatisfied: unsatisfied.len(),
        vacancies: targets.len(),
        relocations: Vec::new(),
    };

    if unsatisfied.is_empty() {
        return Ok(outcome);
    }
    if targets.is_empty() {
        outcome.status = StepStatus::NoVacancy;
        return Ok(outcome);
    }

    unsatisfied.shuffle(rng);
    targets.shuffle(rng);

    let budget = move_budget(unsatisfied.len());
    for (from, to) in unsatisfied.into_iter().zip(targets).take(budget) {
        let Some(agent) = grid.agent(from).map(|agent| agent.id) else {
            continue;
        };
        if grid.relocate(from, to) {
            outcome.relocations.push(Relocation { agent, from, to });
        }
    }

    outcome.status = StepStatus::Moved;
    debug!(
        unsatisfied = outcome.unsatisfied,
        vacancies = outcome.vacancies,
        budget,
        moved = outcome.relocations.len(),
        "Relocation batch applied"
    );

    Ok(outcome)
}

/// Move one agent to a chosen cell. Returns `false` and leaves the grid untouched if
/// the agent is unknown, the target lies outside the grid, or the target is occupied.
pub fn place_agent(grid: &mut Grid, agent: AgentId, target: CellPos) -> bool {
    let Some(from) = grid.find_agent(agent) else {
        return false;
    };
    grid.relocate(from, target)
}

/// Result of running until movement stops or a tick limit is hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: u64,
    pub total_relocations: usize,
    /// Status of the step that stopped the run, `None` if the tick limit was reached
    pub halted_by: Option<StepStatus>,
    pub final_stats: SimulationStats,
}

impl RunSummary {
    pub fn settled(&self) -> bool {
        self.halted_by == Some(StepStatus::Settled)
    }
}

/// Single owner of a grid, its threshold and its random stream.
pub struct Simulation {
    grid: Grid,
    config: SimulationConfig,
    threshold: f64,
    rng: ChaCha8Rng,
    tick: u64,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let grid = Grid::initialize(&config.grid, &mut rng)?;

        info!(
            rows = config.grid.rows,
            cols = config.grid.cols,
            empty_ratio = config.grid.empty_ratio,
            threshold = config.threshold,
            seed = config.seed,
            agents = grid.agent_count(),
            "Simulation created"
        );

        Ok(Self {
            grid,
            threshold: config.threshold,
            config,
            rng,
            tick: 0,
        })
    }

    /// Replace the grid with a freshly populated one. The random stream carries on, so
    /// consecutive boards differ while the whole sequence stays reproducible.
    pub fn reset(&mut self) -> Result<()> {
        self.grid = Grid::initialize(&self.config.grid, &mut self.rng)?;
        self.tick = 0;
        info!(agents = self.grid.agent_count(), "Simulation reset");
        Ok(())
    }

    pub fn step(&mut self) -> Result<StepOutcome> {
        let outcome = step(&mut self.grid, self.threshold, &mut self.rng)?;
        self.tick += 1;
        if !outcome.moved() {
            debug!(tick = self.tick, status = ?outcome.status, "No agents moved");
        }
        Ok(outcome)
    }

    pub fn place_agent(&mut self, agent: AgentId, target: CellPos) -> bool {
        let applied = place_agent(&mut self.grid, agent, target);
        debug!(%agent, %target, applied, "Manual placement");
        applied
    }

    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        validate_threshold(threshold)?;
        self.threshold = threshold;
        Ok(())
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Steps taken since creation or the last reset
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn stats(&self) -> SimulationStats {
        compute_stats(&self.grid, self.threshold)
    }

    pub fn is_satisfied(&self, pos: CellPos) -> bool {
        is_satisfied(&self.grid, pos, self.threshold)
    }

    /// Step until a step moves nobody or `max_ticks` steps have run
    pub fn run(&mut self, max_ticks: u64) -> Result<RunSummary> {
        self.run_with_hook(max_ticks, |_, _| {})
    }

    /// Like [`Simulation::run`], calling `hook` after every step with the outcome and
    /// the freshly computed statistics.
    #[instrument(skip(self, hook), fields(threshold = self.threshold))]
    pub fn run_with_hook<F>(&mut self, max_ticks: u64, mut hook: F) -> Result<RunSummary>
    where
        F: FnMut(&StepOutcome, &SimulationStats),
    {
        let mut steps = 0;
        let mut total_relocations = 0;
        let mut halted_by = None;

        while steps < max_ticks {
            let outcome = self.step()?;
            steps += 1;
            total_relocations += outcome.relocations.len();

            let stats = self.stats();
            hook(&outcome, &stats);

            if steps % 100 == 0 {
                info!(
                    "Tick {}/{}: {} unhappy of {} agents",
                    steps, max_ticks, stats.unhappy_count, stats.total_agents
                );
            }

            if !outcome.moved() {
                halted_by = Some(outcome.status);
                break;
            }
        }

        let final_stats = self.stats();
        info!(
            steps,
            total_relocations,
            halted_by = ?halted_by,
            segregation = format!("{:.1}%", final_stats.segregation),
            unhappy = final_stats.unhappy_count,
            "Run finished"
        );

        Ok(RunSummary {
            steps,
            total_relocations,
            halted_by,
            final_stats,
        })
    }
}
