use serde::{Deserialize, Serialize};

/// Number of hex-edge directions around a cell.
pub const DIRECTION_COUNT: usize = 6;
/// Number of distinct canonical (rotation-normalized, 5-bit) states.
pub const CANONICAL_STATE_COUNT: usize = 1 << 5;
/// Mask of the edge bits a cell stores for itself (directions 0, 1 and 2).
pub const LOCAL_EDGE_MASK: u8 = 0b111;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub u32);

/// Direction `d` moves a cell by `offset()`; `d` and `(d + 3) % 6` are opposite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    East,
    SouthEast,
    South,
    West,
    NorthWest,
    North,
}

impl Direction {
    pub const ALL: [Direction; DIRECTION_COUNT] = [
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::West,
        Direction::NorthWest,
        Direction::North,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// `(row delta, column delta)`.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::East => (0, 1),
            Direction::SouthEast => (1, 1),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
            Direction::NorthWest => (-1, -1),
            Direction::North => (-1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        Self::ALL[(self.index() + DIRECTION_COUNT / 2) % DIRECTION_COUNT]
    }

    pub fn turned(self, turn: Turn) -> Self {
        Self::ALL[(self.index() + usize::from(turn.offset())) % DIRECTION_COUNT]
    }

    /// Edges in directions 0..3 are stored on the cell itself, the other three on the
    /// neighbor at the far end.
    pub fn is_stored_locally(self) -> bool {
        self.index() < DIRECTION_COUNT / 2
    }
}

/// A relative turn configured for a rule. Offset 3 ("straight back") is never valid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct Turn(u8);

impl Turn {
    pub const STRAIGHT_BACK: u8 = 3;

    pub fn new(offset: u8) -> Option<Self> {
        (usize::from(offset) < DIRECTION_COUNT && offset != Self::STRAIGHT_BACK)
            .then_some(Self(offset))
    }

    pub fn offset(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Turn {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Turn::new(value).ok_or_else(|| format!("turn {value} must be one of 0, 1, 2, 4, 5"))
    }
}

impl From<Turn> for u8 {
    fn from(value: Turn) -> Self {
        value.0
    }
}

/// The six edge bits around one cell, bit `d` set when the edge in direction `d` is used.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct SensedState(pub u8);

impl SensedState {
    pub fn has(self, direction: Direction) -> bool {
        (self.0 >> direction.index()) & 1 == 1
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

/// Rotation-normalized sensed state with the straight-back bit dropped; always `< 32`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub struct CanonicalState(u8);

impl CanonicalState {
    pub fn new(value: u8) -> Option<Self> {
        (usize::from(value) < CANONICAL_STATE_COUNT).then_some(Self(value))
    }

    /// Keeps the low five bits of `value`.
    pub fn from_low_bits(value: u8) -> Self {
        Self(value & (CANONICAL_STATE_COUNT as u8 - 1))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl TryFrom<u8> for CanonicalState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        CanonicalState::new(value)
            .ok_or_else(|| format!("canonical state {value} must be below {CANONICAL_STATE_COUNT}"))
    }
}

impl From<CanonicalState> for u8 {
    fn from(value: CanonicalState) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WormState {
    pub row: usize,
    pub col: usize,
    /// `None` once the worm has halted.
    pub heading: Option<Direction>,
}

impl WormState {
    pub fn new(row: usize, col: usize, heading: Direction) -> Self {
        Self {
            row,
            col,
            heading: Some(heading),
        }
    }

    pub fn is_halted(&self) -> bool {
        self.heading.is_none()
    }

    pub fn halted(self) -> Self {
        Self {
            heading: None,
            ..self
        }
    }

    /// Direction index as written in state files, `-1` when halted.
    pub fn dir_code(&self) -> i32 {
        self.heading.map_or(-1, |direction| direction.index() as i32)
    }
}

/// Fixed-layout record the leader broadcasts at startup and after every decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameInfo {
    pub width: usize,
    pub height: usize,
    pub iteration_count: u64,
    pub worm: WormState,
}

/// Global toroidal grid of edge bits. Each cell keeps the bits for directions 0, 1, 2.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Board {
    height: usize,
    width: usize,
    cells: Vec<u8>,
}

impl Board {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            cells: vec![0; height * width],
        }
    }

    pub fn from_cells(height: usize, width: usize, cells: Vec<u8>) -> Option<Self> {
        if cells.len() != height * width || cells.iter().any(|bits| bits & !LOCAL_EDGE_MASK != 0)
        {
            return None;
        }
        Some(Self {
            height,
            width,
            cells,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.width + col]
    }

    pub fn set(&mut self, row: usize, col: usize, bits: u8) {
        self.cells[row * self.width + col] = bits & LOCAL_EDGE_MASK;
    }

    /// Whether the edge leaving `(row, col)` in `direction` is set, looking through to the
    /// neighbor for directions stored on the far endpoint.
    pub fn edge(&self, row: usize, col: usize, direction: Direction) -> bool {
        let (row, col, direction) = if direction.is_stored_locally() {
            (row, col, direction)
        } else {
            let (row, col) = toroidal_neighbor(row, col, direction, self.height, self.width);
            (row, col, direction.opposite())
        };
        (self.get(row, col) >> direction.index()) & 1 == 1
    }

    pub fn set_edge(&mut self, row: usize, col: usize, direction: Direction) {
        let (row, col, direction) = if direction.is_stored_locally() {
            (row, col, direction)
        } else {
            let (row, col) = toroidal_neighbor(row, col, direction, self.height, self.width);
            (row, col, direction.opposite())
        };
        let bits = self.get(row, col) | (1 << direction.index());
        self.set(row, col, bits);
    }

    pub fn count_edges(&self) -> u32 {
        self.cells.iter().map(|bits| bits.count_ones()).sum()
    }
}

/// Neighbor of `(row, col)` in `direction` on a `height x width` torus.
pub fn toroidal_neighbor(
    row: usize,
    col: usize,
    direction: Direction,
    height: usize,
    width: usize,
) -> (usize, usize) {
    let (dr, dc) = direction.offset();
    let row = (row as isize + dr).rem_euclid(height as isize) as usize;
    let col = (col as isize + dc).rem_euclid(width as isize) as usize;
    (row, col)
}

/// A complete simulation state as read from, and written back to, a state file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorldState {
    pub height: usize,
    pub width: usize,
    pub worm: WormState,
    pub rules: Vec<Turn>,
    /// Canonical states in rule-id order: entry `i` was assigned `RuleId(i)`.
    pub visited_states: Vec<CanonicalState>,
    pub board: Board,
}

impl WorldState {
    pub fn game_info(&self, iteration_count: u64) -> GameInfo {
        GameInfo {
            width: self.width,
            height: self.height,
            iteration_count,
            worm: self.worm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_directions_cancel_offsets() {
        for direction in Direction::ALL {
            let (dr, dc) = direction.offset();
            let (or, oc) = direction.opposite().offset();
            assert_eq!((dr + or, dc + oc), (0, 0));
            assert_eq!(direction.opposite().opposite(), direction);
        }
    }

    #[test]
    fn straight_back_turn_is_rejected() {
        assert!(Turn::new(3).is_none());
        assert!(Turn::new(6).is_none());
        for offset in [0, 1, 2, 4, 5] {
            assert_eq!(Turn::new(offset).map(Turn::offset), Some(offset));
        }
    }

    #[test]
    fn board_edges_agree_from_both_endpoints() {
        let mut board = Board::new(3, 4);
        board.set_edge(0, 0, Direction::North);
        assert!(board.edge(0, 0, Direction::North));
        assert!(board.edge(2, 0, Direction::South));
        assert_eq!(board.get(2, 0), 1 << Direction::South.index());

        board.set_edge(1, 3, Direction::East);
        assert!(board.edge(1, 0, Direction::West));
        assert_eq!(board.count_edges(), 2);
    }

    #[test]
    fn toroidal_neighbor_wraps_both_axes() {
        assert_eq!(toroidal_neighbor(0, 0, Direction::NorthWest, 3, 5), (2, 4));
        assert_eq!(toroidal_neighbor(2, 4, Direction::SouthEast, 3, 5), (0, 0));
    }
}
