use super::support::*;
use super::*;

fn single_tile(height: usize, width: usize) -> Tile {
    let plan = PartitionPlan::new(height, width, 1).expect("plan should be valid");
    Tile::new(plan.tile(0, 0))
}

#[test]
fn upper_left_edges_are_written_on_the_far_cell() {
    let mut tile = single_tile(2, 2);
    tile.apply_edge(0, 0, Direction::East);
    tile.apply_edge(1, 1, Direction::North);
    tile.apply_edge(0, 0, Direction::West);
    tile.apply_edge(0, 0, Direction::NorthWest);

    assert_eq!(tile.get(0, 0), 0b001);
    assert_eq!(tile.get(0, 1), 0b100);
    assert_eq!(tile.get(0, -1), 0b001);
    assert_eq!(tile.get(-1, -1), 0b010);
}

#[test]
fn stored_bits_are_masked_to_local_directions() {
    let mut tile = single_tile(1, 1);
    tile.set(0, 0, 0xff);
    assert_eq!(tile.get(0, 0), 0b111);
}

#[test]
#[should_panic(expected = "outside the 2x3 tile")]
fn reading_past_the_last_column_panics() {
    let tile = single_tile(2, 3);
    tile.get(0, 3);
}

#[test]
#[should_panic(expected = "outside the 2x2 tile")]
fn drawing_from_a_cell_below_the_tile_panics() {
    let mut tile = single_tile(2, 2);
    tile.apply_edge(2, 0, Direction::East);
}

#[test]
fn sensing_matches_the_global_board_for_every_cell() {
    let board = random_board(5, 6, 11);
    for workers in [1, 2, 3] {
        let (_, sets) = exchanged_tiles(&board, workers);
        for row in 0..board.height() {
            for col in 0..board.width() {
                let sensed: Vec<_> = sets
                    .iter()
                    .filter_map(|tiles| tiles.sense_at(row, col))
                    .collect();
                assert_eq!(sensed, vec![board_sense(&board, row, col)], "({row}, {col})");
            }
        }
    }
}

#[test]
fn apply_edge_at_skips_cells_owned_elsewhere() {
    let plan = PartitionPlan::new(4, 4, 2).expect("plan should be valid");
    let mut tiles = TileSet::new(&plan, 0);
    assert!(!tiles.apply_edge_at(0, 2, Direction::East));
    assert!(tiles.apply_edge_at(3, 3, Direction::South));
    assert_eq!(tiles.locate(3, 3), Some((1, 1, 1)));
    assert_eq!(tiles.tiles()[1].get(1, 1), 0b100);
}

#[test]
fn regions_reassemble_into_the_original_board() {
    let board = random_board(5, 7, 3);
    let plan = PartitionPlan::new(5, 7, 3).expect("plan should be valid");
    let mut rebuilt = Board::new(5, 7);
    for rank in 0..3 {
        let region = encode_region(&board, &plan, rank);
        let tiles = TileSet::from_interior(&plan, rank, &region).expect("region should fit");
        decode_region(&mut rebuilt, &plan, rank, &tiles.interior())
            .expect("region should decode");
    }
    assert_eq!(rebuilt, board);
}

#[test]
fn short_region_is_a_protocol_error() {
    let plan = PartitionPlan::new(4, 4, 2).expect("plan should be valid");
    let err = TileSet::from_interior(&plan, 1, &[0; 7]).expect_err("region is one cell short");
    assert!(matches!(err, SimError::Protocol { rank: 1, .. }));
}
