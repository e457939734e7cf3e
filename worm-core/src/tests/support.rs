use super::*;
use crate::halo;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::thread;

pub(super) fn turns(offsets: &[u8]) -> Vec<Turn> {
    offsets
        .iter()
        .map(|offset| Turn::new(*offset).expect("turn offset should be valid"))
        .collect()
}

pub(super) fn canonical(values: &[u8]) -> Vec<CanonicalState> {
    values
        .iter()
        .map(|value| CanonicalState::new(*value).expect("canonical state should be below 32"))
        .collect()
}

pub(super) fn world(
    board: Board,
    worm: WormState,
    rules: &[u8],
    visited: &[u8],
) -> WorldState {
    WorldState {
        height: board.height(),
        width: board.width(),
        worm,
        rules: turns(rules),
        visited_states: canonical(visited),
        board,
    }
}

pub(super) fn random_board(height: usize, width: usize, seed: u64) -> Board {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let cells = (0..height * width).map(|_| rng.random_range(0..8u8)).collect();
    Board::from_cells(height, width, cells).expect("random cells should fit the board")
}

pub(super) fn run_world(state: WorldState, workers: usize, iterations: u64) -> RunReport {
    Simulation::new(RunSettings {
        workers,
        iterations,
    })
    .expect("settings should be valid")
    .run(state)
    .expect("run should succeed")
}

/// Distributes `board` over `workers` threads, runs one halo exchange on each and returns
/// every worker's tiles.
pub(super) fn exchanged_tiles(board: &Board, workers: usize) -> (PartitionPlan, Vec<TileSet>) {
    let plan = PartitionPlan::new(board.height(), board.width(), workers)
        .expect("plan should be valid");
    let sets = thread::scope(|scope| {
        let handles: Vec<_> = fabric(workers)
            .into_iter()
            .map(|endpoint| {
                let plan = &plan;
                scope.spawn(move || {
                    let rank = endpoint.rank();
                    let region = encode_region(board, plan, rank);
                    let mut tiles =
                        TileSet::from_interior(plan, rank, &region).expect("region should fit");
                    halo::exchange(&mut tiles, plan, &endpoint).expect("exchange should succeed");
                    tiles
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("worker thread should not panic"))
            .collect()
    });
    (plan, sets)
}

/// Sensed state of `(row, col)` computed straight from the global board.
pub(super) fn board_sense(board: &Board, row: usize, col: usize) -> SensedState {
    let bits = Direction::ALL
        .iter()
        .filter(|direction| board.edge(row, col, **direction))
        .fold(0, |bits, direction| bits | (1 << direction.index()));
    SensedState(bits)
}
