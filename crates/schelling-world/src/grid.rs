//! Fixed-size 2D grid of cells, each empty or holding one agent.

use rand::seq::SliceRandom;
use rand::Rng;
use schelling_core::{Agent, AgentId, AgentType, CellPos, Direction, Error, GridConfig, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// A bounded (non-wrapping) grid addressed by `row * cols + col`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Option<Agent>>,
    next_agent_id: u64,
}

/// Wire shape of a grid before its invariants have been checked
#[derive(Deserialize)]
struct RawGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Option<Agent>>,
    next_agent_id: u64,
}

impl TryFrom<RawGrid> for Grid {
    type Error = Error;

    fn try_from(raw: RawGrid) -> Result<Self> {
        let grid = Self {
            rows: raw.rows,
            cols: raw.cols,
            cells: raw.cells,
            next_agent_id: raw.next_agent_id,
        };
        grid.validate()?;
        Ok(grid)
    }
}

impl Grid {
    /// A grid with every cell vacant
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
            next_agent_id: 0,
        }
    }

    /// Populate a fresh grid from configuration.
    ///
    /// `floor(rows * cols * empty_ratio)` cells stay empty. Agents are created with
    /// alternating types, shuffled, and dropped onto an explicit random permutation of
    /// the cell indices, so the result depends only on the RNG stream.
    pub fn initialize<R: Rng + ?Sized>(config: &GridConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let mut grid = Self::empty(config.rows, config.cols);
        let agent_count = config.agent_count();

        let mut agents: Vec<Agent> = (0..agent_count)
            .map(|i| Agent::new(grid.allocate_id(), AgentType::alternating(i)))
            .collect();
        agents.shuffle(rng);

        let mut indices: Vec<usize> = (0..grid.cells.len()).collect();
        indices.shuffle(rng);

        for (agent, index) in agents.into_iter().zip(indices) {
            grid.cells[index] = Some(agent);
        }

        debug!(
            rows = config.rows,
            cols = config.cols,
            agents = agent_count,
            empty = config.empty_count(),
            "Grid initialized"
        );

        Ok(grid)
    }

    /// Build a grid from text rows of `A`, `B` and `.` (empty).
    ///
    /// Agents receive ids in reading order starting at 0.
    pub fn from_layout(layout: &[&str]) -> Result<Self> {
        let rows = layout.len();
        let cols = layout.first().map(|line| line.chars().count()).unwrap_or(0);
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidConfiguration(
                "layout must have at least one row and one column".to_string(),
            ));
        }

        let mut grid = Self::empty(rows, cols);
        for (row, line) in layout.iter().enumerate() {
            if line.chars().count() != cols {
                return Err(Error::InvalidConfiguration(format!(
                    "layout row {row} has {} cells, expected {cols}",
                    line.chars().count()
                )));
            }
            for (col, symbol) in line.chars().enumerate() {
                if symbol == '.' {
                    continue;
                }
                let kind = AgentType::from_symbol(symbol).ok_or_else(|| {
                    Error::InvalidConfiguration(format!(
                        "unknown cell symbol '{symbol}' at ({row}, {col})"
                    ))
                })?;
                grid.spawn(CellPos::new(row, col), kind);
            }
        }

        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, pos: CellPos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    fn index(&self, pos: CellPos) -> Option<usize> {
        self.contains(pos).then(|| pos.row * self.cols + pos.col)
    }

    fn index_to_pos(&self, index: usize) -> CellPos {
        CellPos::new(index / self.cols, index % self.cols)
    }

    /// Agent at a position; `None` for empty or out-of-bounds cells
    pub fn agent(&self, pos: CellPos) -> Option<&Agent> {
        self.index(pos).and_then(|i| self.cells[i].as_ref())
    }

    /// In bounds and unoccupied
    pub fn is_vacant(&self, pos: CellPos) -> bool {
        matches!(self.index(pos), Some(i) if self.cells[i].is_none())
    }

    /// Create a new agent in a vacant cell. Returns `None` if the cell is occupied or
    /// out of bounds.
    pub fn spawn(&mut self, pos: CellPos, kind: AgentType) -> Option<AgentId> {
        let index = self.index(pos)?;
        if self.cells[index].is_some() {
            return None;
        }
        let id = self.allocate_id();
        self.cells[index] = Some(Agent::new(id, kind));
        Some(id)
    }

    fn allocate_id(&mut self) -> AgentId {
        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;
        id
    }

    /// Position of the cell holding `id`
    pub fn find_agent(&self, id: AgentId) -> Option<CellPos> {
        self.cells
            .iter()
            .position(|cell| matches!(cell, Some(agent) if agent.id == id))
            .map(|i| self.index_to_pos(i))
    }

    /// Move the occupant of `from` into `to`. Both ends are checked; returns `false`
    /// without touching the grid if `from` is empty or `to` is not vacant.
    pub(crate) fn relocate(&mut self, from: CellPos, to: CellPos) -> bool {
        let (Some(src), Some(dst)) = (self.index(from), self.index(to)) else {
            return false;
        };
        if self.cells[src].is_none() || self.cells[dst].is_some() {
            return false;
        }
        self.cells[dst] = self.cells[src].take();
        true
    }

    /// Iterator over all cells with positions, in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (CellPos, Option<&Agent>)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (self.index_to_pos(i), cell.as_ref()))
    }

    /// Occupied cells in row-major order
    pub fn occupied(&self) -> impl Iterator<Item = (CellPos, &Agent)> + '_ {
        self.iter()
            .filter_map(|(pos, agent)| agent.map(|agent| (pos, agent)))
    }

    /// Vacant cells in row-major order
    pub fn empty_cells(&self) -> impl Iterator<Item = CellPos> + '_ {
        self.iter()
            .filter(|(_, agent)| agent.is_none())
            .map(|(pos, _)| pos)
    }

    pub fn agent_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Moore neighbourhood of `pos`, clipped at the edges
    pub fn neighbors(&self, pos: CellPos) -> impl Iterator<Item = CellPos> {
        let (rows, cols) = (self.rows, self.cols);
        Direction::all().into_iter().filter_map(move |direction| {
            let (d_row, d_col) = direction.to_delta();
            pos.offset(d_row, d_col, rows, cols)
        })
    }

    /// Check the structural invariants: storage matches the dimensions and every agent
    /// id occurs once. Grids built through this API, or deserialized, always pass.
    pub fn validate(&self) -> Result<()> {
        if self.rows.checked_mul(self.cols) != Some(self.cells.len()) {
            return Err(Error::InvariantViolation(format!(
                "grid declares {}x{} but stores {} cells",
                self.rows,
                self.cols,
                self.cells.len()
            )));
        }

        let mut seen = HashSet::with_capacity(self.cells.len());
        for (pos, agent) in self.occupied() {
            if !seen.insert(agent.id) {
                return Err(Error::InvariantViolation(format!(
                    "{} appears more than once (again at {pos})",
                    agent.id
                )));
            }
            if agent.id.0 >= self.next_agent_id {
                return Err(Error::InvariantViolation(format!(
                    "{} at {pos} was never allocated by this grid",
                    agent.id
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            if row > 0 {
                writeln!(f)?;
            }
            for col in 0..self.cols {
                let symbol = self
                    .agent(CellPos::new(row, col))
                    .map(|agent| agent.kind.symbol())
                    .unwrap_or('.');
                write!(f, "{symbol}")?;
            }
        }
        Ok(())
    }
}
