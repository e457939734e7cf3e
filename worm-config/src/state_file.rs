use crate::board::{board_from_ascii, board_to_ascii};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use worm_types::{
    CanonicalState, Direction, Turn, WormState, WorldState, CANONICAL_STATE_COUNT,
    DIRECTION_COUNT,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cannot read {field}")]
    MissingField { field: String },
    #[error("cannot parse {field} from {token:?}")]
    InvalidField { field: String, token: String },
    #[error("the board must have at least one row and one column, found {height}x{width}")]
    EmptyGrid { height: usize, width: usize },
    #[error("a {height}x{width} board cannot be described in memory")]
    GridTooLarge { height: usize, width: usize },
    #[error("worm's row position {row} is out of range 0..{height}")]
    WormRowOutOfRange { row: i64, height: usize },
    #[error("worm's column position {col} is out of range 0..{width}")]
    WormColOutOfRange { col: i64, width: usize },
    #[error("worm's direction {dir} must be an integer between 0 and 5")]
    WormDirectionOutOfRange { dir: i64 },
    #[error("rule-{index} is {value}, rules must be integers between 0 and 5")]
    RuleOutOfRange { index: usize, value: i64 },
    #[error("rule-{index} must not be 3 (cannot go back)")]
    RuleGoesBack { index: usize },
    #[error("visited-state-{index} is {value}, visited states must be between 0 and 31")]
    VisitedStateOutOfRange { index: usize, value: i64 },
    #[error("visited-state-{index} repeats state {value}")]
    DuplicateVisitedState { index: usize, value: u8 },
    #[error("cannot read row #{row} of the board description")]
    MissingBoardRow { row: usize },
    #[error("row #{row} of the board description must be at least {expected} characters, found {found}")]
    BoardRowTooShort {
        row: usize,
        expected: usize,
        found: usize,
    },
}

struct Tokens<'a> {
    raw: &'a str,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(raw: &'a str) -> Self {
        Self { raw, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.raw[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn next_token(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        let rest = &self.raw[self.pos..];
        if rest.is_empty() {
            return None;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        self.pos += end;
        Some(&rest[..end])
    }

    fn read<T: FromStr>(&mut self, field: impl Into<String>) -> Result<T, ConfigError> {
        let field = field.into();
        let Some(token) = self.next_token() else {
            return Err(ConfigError::MissingField { field });
        };
        token.parse().map_err(|_| ConfigError::InvalidField {
            field,
            token: token.to_owned(),
        })
    }

    /// Everything after the header, starting at its first non-whitespace character.
    fn into_board_text(mut self) -> &'a str {
        self.skip_whitespace();
        &self.raw[self.pos..]
    }
}

pub fn world_state_from_str(raw: &str) -> Result<WorldState, ConfigError> {
    let mut tokens = Tokens::new(raw);

    let height: usize = tokens.read("<row-count>")?;
    let width: usize = tokens.read("<column-count>")?;
    let worm_row: i64 = tokens.read("<worm-row-position>")?;
    let worm_col: i64 = tokens.read("<worm-col-position>")?;
    let worm_dir: i64 = tokens.read("<worm-direction>")?;
    if height == 0 || width == 0 {
        return Err(ConfigError::EmptyGrid { height, width });
    }
    let (Some(line_count), Some(line_len), Some(_)) = (
        height.checked_mul(2),
        width.checked_mul(2),
        height.checked_mul(width),
    ) else {
        return Err(ConfigError::GridTooLarge { height, width });
    };
    let worm = validate_worm(worm_row, worm_col, worm_dir, height, width)?;

    let rule_count: usize = tokens.read("<number-of-rule>")?;
    let mut rules = Vec::with_capacity(rule_count.min(CANONICAL_STATE_COUNT));
    for index in 0..rule_count {
        let value: i64 = tokens.read(format!("<rule-{index}>"))?;
        rules.push(validate_rule(index, value)?);
    }

    let visited_count: usize = tokens.read("<number-of-visited-state>")?;
    let mut visited_states = Vec::with_capacity(visited_count.min(CANONICAL_STATE_COUNT));
    let mut seen = HashSet::new();
    for index in 0..visited_count {
        let value: i64 = tokens.read(format!("<visited-state-{index}>"))?;
        let state = u8::try_from(value)
            .ok()
            .and_then(CanonicalState::new)
            .ok_or(ConfigError::VisitedStateOutOfRange { index, value })?;
        if !seen.insert(state) {
            return Err(ConfigError::DuplicateVisitedState {
                index,
                value: state.value(),
            });
        }
        visited_states.push(state);
    }

    let rows: Vec<&str> = tokens.into_board_text().lines().take(line_count).collect();
    if rows.len() < line_count {
        return Err(ConfigError::MissingBoardRow {
            row: rows.len() + 1,
        });
    }
    for (idx, row) in rows.iter().enumerate() {
        if row.len() < line_len {
            return Err(ConfigError::BoardRowTooShort {
                row: idx + 1,
                expected: line_len,
                found: row.len(),
            });
        }
    }
    let board = board_from_ascii(&rows, height, width);

    Ok(WorldState {
        height,
        width,
        worm,
        rules,
        visited_states,
        board,
    })
}

fn validate_worm(
    row: i64,
    col: i64,
    dir: i64,
    height: usize,
    width: usize,
) -> Result<WormState, ConfigError> {
    let row = usize::try_from(row)
        .ok()
        .filter(|row| *row < height)
        .ok_or(ConfigError::WormRowOutOfRange { row, height })?;
    let col = usize::try_from(col)
        .ok()
        .filter(|col| *col < width)
        .ok_or(ConfigError::WormColOutOfRange { col, width })?;
    let heading = usize::try_from(dir)
        .ok()
        .and_then(Direction::from_index)
        .ok_or(ConfigError::WormDirectionOutOfRange { dir })?;
    Ok(WormState::new(row, col, heading))
}

fn validate_rule(index: usize, value: i64) -> Result<Turn, ConfigError> {
    let offset = u8::try_from(value)
        .ok()
        .filter(|offset| usize::from(*offset) < DIRECTION_COUNT)
        .ok_or(ConfigError::RuleOutOfRange { index, value })?;
    Turn::new(offset).ok_or(ConfigError::RuleGoesBack { index })
}

/// Writes a state in the same layout the parser reads. A halted worm is written with
/// direction `-1`.
pub fn render_world_state(state: &WorldState) -> String {
    StateText(state).to_string()
}

struct StateText<'a>(&'a WorldState);

impl fmt::Display for StateText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0;
        writeln!(f, "{} {}", state.height, state.width)?;
        writeln!(
            f,
            "{} {} {}",
            state.worm.row,
            state.worm.col,
            state.worm.dir_code()
        )?;
        writeln!(f, "{}", state.rules.len())?;
        writeln!(f, "{}", join_values(state.rules.iter().map(|r| r.offset())))?;
        writeln!(f, "{}", state.visited_states.len())?;
        writeln!(
            f,
            "{}",
            join_values(state.visited_states.iter().map(|s| s.value()))
        )?;
        for row in board_to_ascii(&state.board) {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

fn join_values(values: impl Iterator<Item = u8>) -> String {
    values
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
