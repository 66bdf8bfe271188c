//! Invariants that must hold for every reachable grid.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use schelling_core::{AgentId, CellPos, GridConfig};
use schelling_world::{compute_stats, is_satisfied, move_budget, place_agent, step, Grid};
use std::collections::HashSet;

fn grid_config() -> impl Strategy<Value = GridConfig> {
    (1usize..9, 1usize..9, 0.0f64..0.9).prop_map(|(rows, cols, empty_ratio)| GridConfig {
        rows,
        cols,
        empty_ratio,
    })
}

/// Either a scheduler step or a manual move of some agent to some cell
#[derive(Debug, Clone)]
enum Command {
    Step,
    Place { agent: u64, row: usize, col: usize },
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::Step),
        (0u64..80, 0usize..10, 0usize..10)
            .prop_map(|(agent, row, col)| Command::Place { agent, row, col }),
    ]
}

fn agent_ids(grid: &Grid) -> Vec<AgentId> {
    grid.occupied().map(|(_, agent)| agent.id).collect()
}

proptest! {
    #[test]
    fn partition_and_conservation_hold(
        config in grid_config(),
        threshold in 0.0f64..=1.0,
        seed in any::<u64>(),
        commands in prop::collection::vec(command(), 1..30),
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut grid = Grid::initialize(&config, &mut rng).unwrap();
        let mut initial_ids = agent_ids(&grid);
        initial_ids.sort();
        let total = compute_stats(&grid, threshold).total_agents;

        for command in commands {
            match command {
                Command::Step => {
                    step(&mut grid, threshold, &mut rng).unwrap();
                }
                Command::Place { agent, row, col } => {
                    place_agent(&mut grid, AgentId(agent), CellPos::new(row, col));
                }
            }

            prop_assert!(grid.validate().is_ok());
            prop_assert_eq!(grid.agent_count() + grid.empty_cells().count(), grid.cell_count());
            prop_assert_eq!(compute_stats(&grid, threshold).total_agents, total);

            let mut ids = agent_ids(&grid);
            let unique: HashSet<AgentId> = ids.iter().copied().collect();
            prop_assert_eq!(unique.len(), ids.len());
            ids.sort();
            prop_assert_eq!(&ids, &initial_ids);
        }
    }

    #[test]
    fn step_is_one_atomic_bounded_batch(
        config in grid_config(),
        threshold in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut grid = Grid::initialize(&config, &mut rng).unwrap();
        let before = grid.clone();
        let empties: HashSet<CellPos> = before.empty_cells().collect();

        let outcome = step(&mut grid, threshold, &mut rng).unwrap();

        prop_assert_eq!(outcome.unsatisfied, compute_stats(&before, threshold).unhappy_count);
        prop_assert!(outcome.relocations.len() <= move_budget(outcome.unsatisfied));
        prop_assert!(outcome.relocations.len() <= empties.len());

        let mut targets = HashSet::new();
        for relocation in &outcome.relocations {
            prop_assert!(empties.contains(&relocation.to));
            prop_assert!(targets.insert(relocation.to));
            prop_assert!(!is_satisfied(&before, relocation.from, threshold));
            prop_assert_eq!(before.agent(relocation.from).map(|a| a.id), Some(relocation.agent));
            prop_assert_eq!(grid.agent(relocation.to).map(|a| a.id), Some(relocation.agent));
        }

        if outcome.unsatisfied > 0 && !empties.is_empty() {
            let expected = move_budget(outcome.unsatisfied).min(empties.len());
            prop_assert_eq!(outcome.relocations.len(), expected);
        }
    }

    #[test]
    fn higher_threshold_never_reduces_unhappiness(
        config in grid_config(),
        seed in any::<u64>(),
        low in 0.0f64..=1.0,
        high in 0.0f64..=1.0,
    ) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let grid = Grid::initialize(&config, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap();
        prop_assert!(
            compute_stats(&grid, low).unhappy_count <= compute_stats(&grid, high).unhappy_count
        );
    }

    #[test]
    fn isolated_agents_are_always_satisfied(
        config in grid_config(),
        seed in any::<u64>(),
        threshold in 0.0f64..=1.0,
    ) {
        let grid = Grid::initialize(&config, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap();
        for (pos, _) in grid.occupied() {
            let isolated = grid.neighbors(pos).all(|n| grid.agent(n).is_none());
            if isolated {
                prop_assert!(is_satisfied(&grid, pos, threshold));
            }
        }
    }

    #[test]
    fn settled_grid_stays_settled(
        config in grid_config(),
        threshold in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut grid = Grid::initialize(&config, &mut rng).unwrap();

        for _ in 0..200 {
            let outcome = step(&mut grid, threshold, &mut rng).unwrap();
            if !outcome.moved() {
                let frozen = grid.clone();
                let again = step(&mut grid, threshold, &mut rng).unwrap();
                prop_assert!(!again.moved());
                prop_assert_eq!(again.status, outcome.status);
                prop_assert_eq!(&grid, &frozen);
                break;
            }
        }
    }
}

#[test]
fn lone_agent_in_three_by_three_is_satisfied() {
    let grid = Grid::from_layout(&["...", ".A.", "..."]).unwrap();
    assert!(is_satisfied(&grid, CellPos::new(1, 1), 0.5));
}

#[test]
fn four_by_four_at_zero_threshold_does_not_move() {
    let config = GridConfig {
        rows: 4,
        cols: 4,
        empty_ratio: 0.25,
    };
    for seed in 0..20 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut grid = Grid::initialize(&config, &mut rng).unwrap();
        assert_eq!(grid.empty_cells().count(), 4);
        let outcome = step(&mut grid, 0.0, &mut rng).unwrap();
        assert!(!outcome.moved());
    }
}
