//! ASCII board codec.
//!
//! A `height x width` board is drawn on `2 * height` lines of `2 * width` characters.
//! Cell `(r, c)` sits at `(2r, 2c)`; its three stored edges are drawn next to it:
//!
//! ```text
//! (2r,   2c) cell marker     (2r,   2c+1) '=' or '-'  East
//! (2r+1, 2c) '|'  South      (2r+1, 2c+1) '\'         SouthEast
//! ```

use worm_types::{Board, Direction};

const CELL_MARKER: u8 = b'*';
const EAST_MARKER: u8 = b'=';
const EAST_MARKER_ALT: u8 = b'-';
const SOUTH_MARKER: u8 = b'|';
const SOUTH_EAST_MARKER: u8 = b'\\';
const BLANK: u8 = b' ';

/// Decodes a board from rows already checked to be at least `2 * width` bytes long.
pub(crate) fn board_from_ascii(rows: &[&str], height: usize, width: usize) -> Board {
    let mut board = Board::new(height, width);
    for r in 0..height {
        let upper = rows[2 * r].as_bytes();
        let lower = rows[2 * r + 1].as_bytes();
        for c in 0..width {
            if matches!(upper[2 * c + 1], EAST_MARKER | EAST_MARKER_ALT) {
                board.set_edge(r, c, Direction::East);
            }
            if lower[2 * c + 1] == SOUTH_EAST_MARKER {
                board.set_edge(r, c, Direction::SouthEast);
            }
            if lower[2 * c] == SOUTH_MARKER {
                board.set_edge(r, c, Direction::South);
            }
        }
    }
    board
}

pub fn board_to_ascii(board: &Board) -> Vec<String> {
    let mut rows = Vec::with_capacity(2 * board.height());
    for r in 0..board.height() {
        let mut upper = Vec::with_capacity(2 * board.width());
        let mut lower = Vec::with_capacity(2 * board.width());
        for c in 0..board.width() {
            let bits = board.get(r, c);
            let has = |direction: Direction| (bits >> direction.index()) & 1 == 1;
            upper.push(CELL_MARKER);
            upper.push(if has(Direction::East) { EAST_MARKER } else { BLANK });
            lower.push(if has(Direction::South) { SOUTH_MARKER } else { BLANK });
            lower.push(if has(Direction::SouthEast) {
                SOUTH_EAST_MARKER
            } else {
                BLANK
            });
        }
        rows.push(String::from_utf8_lossy(&upper).into_owned());
        rows.push(String::from_utf8_lossy(&lower).into_owned());
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_marker_kind() {
        let rows = ["*=*-", "|\\  ", "* * ", " \\| "];
        let board = board_from_ascii(&rows, 2, 2);
        assert_eq!(board.get(0, 0), 0b111);
        assert_eq!(board.get(0, 1), 0b001);
        assert_eq!(board.get(1, 0), 0b010);
        assert_eq!(board.get(1, 1), 0b100);
    }

    #[test]
    fn encoding_normalizes_horizontal_markers() {
        let rows = ["*-* ", "    ", "* *=", "|  \\"];
        let board = board_from_ascii(&rows, 2, 2);
        let encoded = board_to_ascii(&board);
        assert_eq!(encoded, vec!["*=* ", "    ", "* *=", "|  \\"]);
    }

    #[test]
    fn ignores_characters_past_the_board() {
        let rows = ["* ==", "  ||"];
        let board = board_from_ascii(&rows, 1, 1);
        assert_eq!(board.get(0, 0), 0);
    }
}
