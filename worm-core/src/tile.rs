use crate::partition::{PartitionPlan, TileBounds};
use crate::SimError;
use worm_types::{Board, Direction, SensedState, LOCAL_EDGE_MASK};

/// Edge bits of one tile plus a halo row above and a halo column to the left, both
/// addressed with index `-1`.
///
/// Only the interior is authoritative. Halo entries are copies of the neighbouring
/// tiles' cells, refreshed by every halo exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    bounds: TileBounds,
    cells: Vec<u8>,
}

impl Tile {
    pub fn new(bounds: TileBounds) -> Self {
        Self {
            bounds,
            cells: vec![0; (bounds.height + 1) * (bounds.width + 1)],
        }
    }

    pub fn bounds(&self) -> TileBounds {
        self.bounds
    }

    pub fn height(&self) -> usize {
        self.bounds.height
    }

    pub fn width(&self) -> usize {
        self.bounds.width
    }

    /// Panics when `(row, col)` lies outside `[-1, height) x [-1, width)`.
    fn index(&self, row: isize, col: isize) -> usize {
        assert!(
            (-1..self.bounds.height as isize).contains(&row)
                && (-1..self.bounds.width as isize).contains(&col),
            "({row}, {col}) is outside the {}x{} tile and its halo",
            self.bounds.height,
            self.bounds.width
        );
        (row + 1) as usize * (self.bounds.width + 1) + (col + 1) as usize
    }

    pub(crate) fn get(&self, row: isize, col: isize) -> u8 {
        self.cells[self.index(row, col)]
    }

    pub(crate) fn set(&mut self, row: isize, col: isize, bits: u8) {
        let idx = self.index(row, col);
        self.cells[idx] = bits & LOCAL_EDGE_MASK;
    }

    /// The six edge bits around local cell `(row, col)`. Directions 3, 4 and 5 are read
    /// from the left, upper-left and upper neighbours, so the halo must be current.
    pub fn sense(&self, row: usize, col: usize) -> SensedState {
        let (row, col) = (row as isize, col as isize);
        let mut state = self.get(row, col);
        let far_ends = [
            (Direction::West, row, col - 1),
            (Direction::NorthWest, row - 1, col - 1),
            (Direction::North, row - 1, col),
        ];
        for (direction, far_row, far_col) in far_ends {
            let stored_as = direction.opposite().index();
            if (self.get(far_row, far_col) >> stored_as) & 1 == 1 {
                state |= 1 << direction.index();
            }
        }
        SensedState(state)
    }

    /// Marks the edge leaving local cell `(row, col)` in `direction`. Edges in directions
    /// 3, 4 and 5 are written on the cell at the far end, which may be a halo entry.
    pub fn apply_edge(&mut self, row: usize, col: usize, direction: Direction) {
        let (mut row, mut col) = (row as isize, col as isize);
        let mut stored_as = direction;
        if !direction.is_stored_locally() {
            let (dr, dc) = direction.offset();
            row += dr;
            col += dc;
            stored_as = direction.opposite();
        }
        let bits = self.get(row, col) | (1 << stored_as.index());
        self.set(row, col, bits);
    }

    /// Values this tile contributes to its right neighbour's left halo, one per row.
    /// A zero-width tile forwards its own left halo.
    pub(crate) fn right_column(&self) -> impl Iterator<Item = u8> + '_ {
        let last_col = self.bounds.width as isize - 1;
        (0..self.bounds.height as isize).map(move |row| self.get(row, last_col))
    }

    /// Values this tile contributes to the top halo of the tile below, one per column.
    /// A zero-height tile forwards its own top halo.
    pub(crate) fn bottom_row(&self) -> impl Iterator<Item = u8> + '_ {
        let last_row = self.bounds.height as isize - 1;
        (0..self.bounds.width as isize).map(move |col| self.get(last_row, col))
    }

    pub(crate) fn bottom_right(&self) -> u8 {
        self.get(
            self.bounds.height as isize - 1,
            self.bounds.width as isize - 1,
        )
    }

    pub(crate) fn set_left_halo(&mut self, values: &[u8]) {
        debug_assert_eq!(values.len(), self.bounds.height);
        for (row, bits) in values.iter().enumerate() {
            self.set(row as isize, -1, *bits);
        }
    }

    pub(crate) fn set_top_halo(&mut self, values: &[u8]) {
        debug_assert_eq!(values.len(), self.bounds.width);
        for (col, bits) in values.iter().enumerate() {
            self.set(-1, col as isize, *bits);
        }
    }

    pub(crate) fn set_corner(&mut self, bits: u8) {
        self.set(-1, -1, bits);
    }

    fn interior(&self) -> impl Iterator<Item = u8> + '_ {
        let width = self.bounds.width as isize;
        (0..self.bounds.height as isize)
            .flat_map(move |row| (0..width).map(move |col| self.get(row, col)))
    }

    fn load_interior(&mut self, bits: &[u8]) {
        debug_assert_eq!(bits.len(), self.bounds.area());
        let width = self.bounds.width.max(1);
        for (idx, value) in bits.iter().enumerate() {
            self.set((idx / width) as isize, (idx % width) as isize, *value);
        }
    }
}

/// Every tile one worker owns, indexed by row band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSet {
    rank: usize,
    tiles: Vec<Tile>,
}

impl TileSet {
    pub fn new(plan: &PartitionPlan, rank: usize) -> Self {
        Self {
            rank,
            tiles: plan.tiles_for(rank).map(Tile::new).collect(),
        }
    }

    /// Builds the tile set from the row-major interiors of its tiles, concatenated in
    /// row-band order.
    pub fn from_interior(
        plan: &PartitionPlan,
        rank: usize,
        bits: &[u8],
    ) -> Result<Self, SimError> {
        let expected = plan.area_for(rank);
        if bits.len() != expected {
            return Err(SimError::Protocol {
                rank,
                message: format!("expected {expected} edge records, received {}", bits.len()),
            });
        }
        let mut set = Self::new(plan, rank);
        let mut offset = 0;
        for tile in &mut set.tiles {
            let area = tile.bounds().area();
            tile.load_interior(&bits[offset..offset + area]);
            offset += area;
        }
        Ok(set)
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    /// `(tile index, local row, local col)` of global cell `(row, col)` if this worker
    /// owns it.
    pub fn locate(&self, row: usize, col: usize) -> Option<(usize, usize, usize)> {
        self.tiles.iter().enumerate().find_map(|(idx, tile)| {
            let bounds = tile.bounds();
            bounds
                .contains(row, col)
                .then(|| (idx, row - bounds.row, col - bounds.col))
        })
    }

    pub fn sense_at(&self, row: usize, col: usize) -> Option<SensedState> {
        let (idx, local_row, local_col) = self.locate(row, col)?;
        Some(self.tiles[idx].sense(local_row, local_col))
    }

    /// Returns whether this worker owned the cell and applied the edge.
    pub fn apply_edge_at(&mut self, row: usize, col: usize, direction: Direction) -> bool {
        let Some((idx, local_row, local_col)) = self.locate(row, col) else {
            return false;
        };
        self.tiles[idx].apply_edge(local_row, local_col, direction);
        true
    }

    pub fn interior(&self) -> Vec<u8> {
        self.tiles.iter().flat_map(|tile| tile.interior()).collect()
    }
}

/// Row-major interiors of `rank`'s tiles, in row-band order, cut from the global board.
pub fn encode_region(board: &Board, plan: &PartitionPlan, rank: usize) -> Vec<u8> {
    let mut bits = Vec::with_capacity(plan.area_for(rank));
    for tile in plan.tiles_for(rank) {
        for row in tile.row..tile.row + tile.height {
            for col in tile.col..tile.col + tile.width {
                bits.push(board.get(row, col));
            }
        }
    }
    bits
}

/// Inverse of [`encode_region`]: writes `rank`'s tile interiors back into `board`.
pub fn decode_region(
    board: &mut Board,
    plan: &PartitionPlan,
    rank: usize,
    bits: &[u8],
) -> Result<(), SimError> {
    let expected = plan.area_for(rank);
    if bits.len() != expected {
        return Err(SimError::Protocol {
            rank,
            message: format!(
                "expected {expected} gathered edge records, received {}",
                bits.len()
            ),
        });
    }
    let mut values = bits.iter();
    for tile in plan.tiles_for(rank) {
        for row in tile.row..tile.row + tile.height {
            for col in tile.col..tile.col + tile.width {
                if let Some(value) = values.next() {
                    board.set(row, col, *value);
                }
            }
        }
    }
    Ok(())
}
