//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an agent, stable for the agent's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent-{}", self.0)
    }
}

/// The two agent populations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentType {
    A,
    B,
}

impl AgentType {
    /// Alternating assignment used when populating a fresh grid
    pub fn alternating(index: usize) -> Self {
        if index % 2 == 0 {
            AgentType::A
        } else {
            AgentType::B
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            AgentType::A => 'A',
            AgentType::B => 'B',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'A' | 'a' => Some(AgentType::A),
            'B' | 'b' => Some(AgentType::B),
            _ => None,
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// An occupant of a grid cell. Identity and type never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub kind: AgentType,
}

impl Agent {
    pub fn new(id: AgentId, kind: AgentType) -> Self {
        Self { id, kind }
    }
}

/// Fixed cell coordinate on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

impl CellPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Offset by a delta, returning `None` when the result leaves a `rows × cols` grid.
    /// There is no wraparound.
    pub fn offset(&self, d_row: i32, d_col: i32, rows: usize, cols: usize) -> Option<Self> {
        let row = self.row as i64 + d_row as i64;
        let col = self.col as i64 + d_col as i64;
        if row < 0 || col < 0 || row >= rows as i64 || col >= cols as i64 {
            return None;
        }
        Some(Self {
            row: row as usize,
            col: col as usize,
        })
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The eight directions of the Moore neighbourhood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    /// `(d_row, d_col)`; north is towards row 0.
    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
            Direction::NorthEast => (-1, 1),
            Direction::NorthWest => (-1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (1, -1),
        }
    }

    pub fn all() -> [Direction; 8] {
        [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
            Direction::NorthEast,
            Direction::NorthWest,
            Direction::SouthEast,
            Direction::SouthWest,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_clips_at_edges() {
        let corner = CellPos::new(0, 0);
        assert_eq!(corner.offset(-1, 0, 3, 3), None);
        assert_eq!(corner.offset(0, -1, 3, 3), None);
        assert_eq!(corner.offset(1, 1, 3, 3), Some(CellPos::new(1, 1)));

        let far = CellPos::new(2, 2);
        assert_eq!(far.offset(1, 0, 3, 3), None);
        assert_eq!(far.offset(0, 1, 3, 3), None);
    }

    #[test]
    fn test_directions_cover_moore_neighbourhood() {
        let mut deltas: Vec<(i32, i32)> = Direction::all().iter().map(|d| d.to_delta()).collect();
        deltas.sort();
        deltas.dedup();
        assert_eq!(deltas.len(), 8);
        assert!(!deltas.contains(&(0, 0)));
    }

    #[test]
    fn test_alternating_types() {
        assert_eq!(AgentType::alternating(0), AgentType::A);
        assert_eq!(AgentType::alternating(1), AgentType::B);
        assert_eq!(AgentType::alternating(6), AgentType::A);
    }

    #[test]
    fn test_symbol_round_trip() {
        assert_eq!(AgentType::from_symbol('A'), Some(AgentType::A));
        assert_eq!(AgentType::from_symbol('b'), Some(AgentType::B));
        assert_eq!(AgentType::from_symbol('.'), None);
        assert_eq!(AgentType::B.to_string(), "B");
    }
}
