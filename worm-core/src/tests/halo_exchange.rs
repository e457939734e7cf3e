use super::support::*;
use super::*;

/// Every stored entry, halo included, must mirror the board cell at its wrapped position.
fn assert_halos_mirror_board(board: &Board, workers: usize) {
    let (height, width) = (board.height() as isize, board.width() as isize);
    let (_, sets) = exchanged_tiles(board, workers);
    for tiles in &sets {
        for tile in tiles.tiles() {
            let bounds = tile.bounds();
            for row in -1..bounds.height as isize {
                for col in -1..bounds.width as isize {
                    let global_row = (bounds.row as isize + row).rem_euclid(height) as usize;
                    let global_col = (bounds.col as isize + col).rem_euclid(width) as usize;
                    assert_eq!(
                        tile.get(row, col),
                        board.get(global_row, global_col),
                        "{}x{} / {workers}: rank {} tile {:?} entry ({row}, {col})",
                        height,
                        width,
                        tiles.rank(),
                        bounds,
                    );
                }
            }
        }
    }
}

#[test]
fn single_worker_wraps_onto_itself() {
    assert_halos_mirror_board(&random_board(3, 4, 1), 1);
    assert_halos_mirror_board(&random_board(1, 1, 2), 1);
}

#[test]
fn halos_match_board_with_full_bands() {
    assert_halos_mirror_board(&random_board(4, 4, 3), 2);
    assert_halos_mirror_board(&random_board(7, 5, 4), 3);
    assert_halos_mirror_board(&random_board(9, 12, 5), 4);
}

#[test]
fn halos_cross_empty_bands() {
    assert_halos_mirror_board(&random_board(2, 3, 6), 5);
    assert_halos_mirror_board(&random_board(1, 1, 7), 3);
    assert_halos_mirror_board(&random_board(3, 2, 8), 4);
    assert_halos_mirror_board(&random_board(1, 6, 9), 4);
}

#[test]
fn corner_comes_from_the_diagonal_tile() {
    let mut board = Board::new(4, 4);
    board.set(1, 1, 0b010);
    let (plan, sets) = exchanged_tiles(&board, 2);
    let (rank, row_band) = plan.locate(2, 2).expect("cell should be inside the grid");
    let tile = &sets[rank].tiles()[row_band];
    assert_eq!(tile.get(-1, -1), 0b010);
    assert!(tile.sense(0, 0).has(Direction::NorthWest));
}
