//! Halo refresh run by every worker at the start of each tick.
//!
//! The left halos travel around the worker ring from rank `r` to rank `r + 1`, the top
//! halos from rank `r + 1` to rank `r`. Both passes repeat once per empty band so that a
//! value crosses zero-sized tiles before it lands on the tile that reads it. The corner
//! halos are filled locally from the worker's own tiles afterwards.

use crate::partition::PartitionPlan;
use crate::tile::TileSet;
use crate::transport::{Endpoint, Message};
use crate::SimError;
use tracing::debug;

const CORNER_PASSES: usize = 2;

pub(crate) fn exchange(
    tiles: &mut TileSet,
    plan: &PartitionPlan,
    endpoint: &Endpoint,
) -> Result<(), SimError> {
    for round in 0..plan.vertical_rounds() {
        vertical_pass(tiles, plan, endpoint)?;
        debug!(rank = endpoint.rank(), round, "left halos refreshed");
    }
    for round in 0..plan.horizontal_rounds() {
        horizontal_pass(tiles, plan, endpoint)?;
        debug!(rank = endpoint.rank(), round, "top halos refreshed");
    }
    corner_pass(tiles);
    Ok(())
}

/// Sends every tile's right column to the next worker and installs the previous worker's
/// columns as left halos. Tile `i` of rank `r - 1` sits directly left of tile `i` of rank
/// `r`, so both sides concatenate in row-band order.
fn vertical_pass(
    tiles: &mut TileSet,
    plan: &PartitionPlan,
    endpoint: &Endpoint,
) -> Result<(), SimError> {
    let workers = plan.workers();
    let rank = endpoint.rank();
    let outgoing: Vec<u8> = tiles.tiles().iter().flat_map(|tile| tile.right_column()).collect();
    endpoint.send((rank + 1) % workers, Message::LeftHalo(outgoing))?;

    let incoming = endpoint.recv_left_halo((rank + workers - 1) % workers)?;
    if incoming.len() != plan.height() {
        return Err(endpoint.protocol_error(format!(
            "left halo carries {} values for a grid of height {}",
            incoming.len(),
            plan.height()
        )));
    }
    let mut offset = 0;
    for tile in tiles.tiles_mut() {
        let height = tile.height();
        tile.set_left_halo(&incoming[offset..offset + height]);
        offset += height;
    }
    Ok(())
}

/// Sends bottom rows to the previous worker and installs the next worker's rows as top
/// halos. Tile `i` of rank `r` sits directly below tile `i - 1` of rank `r + 1`, so the
/// sender orders its rows by the row band of the receiving tile.
fn horizontal_pass(
    tiles: &mut TileSet,
    plan: &PartitionPlan,
    endpoint: &Endpoint,
) -> Result<(), SimError> {
    let workers = plan.workers();
    let rank = endpoint.rank();
    let own = tiles.tiles();
    let outgoing: Vec<u8> = (0..workers)
        .flat_map(|row_band| own[(row_band + workers - 1) % workers].bottom_row())
        .collect();
    endpoint.send((rank + workers - 1) % workers, Message::TopHalo(outgoing))?;

    let incoming = endpoint.recv_top_halo((rank + 1) % workers)?;
    if incoming.len() != plan.width() {
        return Err(endpoint.protocol_error(format!(
            "top halo carries {} values for a grid of width {}",
            incoming.len(),
            plan.width()
        )));
    }
    let mut offset = 0;
    for tile in tiles.tiles_mut() {
        let width = tile.width();
        tile.set_top_halo(&incoming[offset..offset + width]);
        offset += width;
    }
    Ok(())
}

/// The up-left neighbour of tile `i`'s first cell is the last cell of this worker's tile
/// `i - 1`. When that tile is empty its corner halo stands in, which the second pass
/// resolves.
fn corner_pass(tiles: &mut TileSet) {
    let tiles = tiles.tiles_mut();
    let count = tiles.len();
    for _ in 0..CORNER_PASSES {
        for current in 0..count {
            let previous = (current + count - 1) % count;
            let bits = tiles[previous].bottom_right();
            tiles[current].set_corner(bits);
        }
    }
}
