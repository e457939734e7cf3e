use super::support::*;
use super::*;

fn empty_two_by_two() -> WorldState {
    world(
        Board::new(2, 2),
        WormState::new(0, 0, Direction::East),
        &[0],
        &[],
    )
}

#[test]
fn single_tick_draws_the_first_edge() {
    for workers in [1, 2] {
        let report = run_world(empty_two_by_two(), workers, 1);
        assert_eq!(report.completed_ticks, 1);
        assert_eq!(report.state.worm, WormState::new(0, 1, Direction::East));
        assert_eq!(report.state.board.cells(), &[1, 0, 0, 0]);
        assert_eq!(report.state.visited_states, canonical(&[0]));
    }
}

#[test]
fn unseen_state_without_rule_halts_the_worm() {
    for workers in [1, 2, 3] {
        let report = run_world(empty_two_by_two(), workers, 5);
        assert_eq!(report.completed_ticks, 2, "{workers} workers");
        assert_eq!(report.state.worm, WormState::new(0, 0, Direction::East).halted());
        assert_eq!(report.state.worm.dir_code(), -1);
        assert_eq!(report.state.visited_states, canonical(&[0, 1]));
        assert_eq!(report.state.board.cells(), &[1, 1, 0, 0]);
    }
}

#[test]
fn existing_edge_changes_the_sensed_state() {
    let mut board = Board::new(3, 3);
    board.set(0, 1, 0b010);
    let state = world(board, WormState::new(0, 0, Direction::East), &[0], &[]);
    for workers in [1, 2, 3] {
        let report = run_world(state.clone(), workers, 5);
        assert_eq!(report.completed_ticks, 1);
        assert_eq!(report.state.worm, WormState::new(0, 1, Direction::East).halted());
        assert_eq!(report.state.visited_states, canonical(&[0, 2]));
        assert_eq!(report.state.board.get(0, 0), 0b001);
        assert_eq!(report.state.board.get(0, 1), 0b010);
    }
}

#[test]
fn zero_iterations_return_the_initial_state() {
    let state = world(
        random_board(4, 5, 21),
        WormState::new(3, 4, Direction::North),
        &[0, 1, 5],
        &[3],
    );
    let report = run_world(state.clone(), 3, 0);
    assert_eq!(report.completed_ticks, 0);
    assert_eq!(report.state, state);
}

#[test]
fn already_halted_worm_never_ticks() {
    let mut state = empty_two_by_two();
    state.worm = state.worm.halted();
    let report = run_world(state.clone(), 2, 10);
    assert_eq!(report.completed_ticks, 0);
    assert_eq!(report.state, state);
}

#[test]
fn loader_failure_aborts_every_worker() {
    let simulation = Simulation::new(RunSettings {
        workers: 3,
        iterations: 10,
    })
    .expect("settings should be valid");
    let err = simulation
        .launch(|| Err::<WorldState, _>("state file is truncated"))
        .expect_err("loader fails");
    assert_eq!(err, SimError::StartupAborted("state file is truncated".to_owned()));
}

#[test]
fn worm_outside_the_grid_aborts_startup() {
    let mut state = empty_two_by_two();
    state.worm = WormState::new(0, 2, Direction::East);
    let err = Simulation::new(RunSettings {
        workers: 2,
        iterations: 1,
    })
    .expect("settings should be valid")
    .run(state)
    .expect_err("worm is off the board");
    assert!(matches!(err, SimError::StartupAborted(reason) if reason.contains("outside")));
}

#[test]
fn zero_workers_are_rejected() {
    let err = Simulation::new(RunSettings {
        workers: 0,
        iterations: 1,
    })
    .expect_err("no workers");
    assert!(matches!(err, SimError::InvalidSetup(_)));
}

#[test]
fn worker_counts_agree_on_a_long_walk() {
    let state = world(
        random_board(6, 7, 5),
        WormState::new(2, 3, Direction::SouthEast),
        &[0, 1, 5, 2, 4, 1, 0, 2, 5, 4, 1, 2, 0, 5, 4, 2],
        &[],
    );
    let baseline = run_world(state.clone(), 1, 200);
    for workers in 2..=6 {
        assert_eq!(run_world(state.clone(), workers, 200), baseline, "{workers} workers");
    }
}
