use crate::grid::rotate_right;
use crate::SimError;
use serde::Serialize;
use tracing::debug;
use worm_types::{
    toroidal_neighbor, CanonicalState, Direction, RuleId, SensedState, Turn, WormState,
    CANONICAL_STATE_COUNT,
};

/// Rotates the sensed state into the worm's frame and drops the straight-back bit.
pub fn canonicalize(raw: SensedState, heading: Direction) -> CanonicalState {
    let rotated = rotate_right(raw, heading.index()).bits();
    CanonicalState::from_low_bits((rotated & 0b111) | ((rotated >> 4) << 3))
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum HaltReason {
    /// The state was assigned an id past the end of the rule table.
    RulesExhausted(RuleId),
    /// The rule points at an edge that is already drawn.
    EdgeTaken(Direction),
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Decision {
    Move { turn: Turn, heading: Direction },
    Halt(HaltReason),
}

/// Rule table plus the first-seen numbering of canonical states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomatonEngine {
    rules: Vec<Turn>,
    rule_ids: [Option<RuleId>; CANONICAL_STATE_COUNT],
    visited: Vec<CanonicalState>,
}

impl AutomatonEngine {
    /// `visited` is taken in id order: `visited[i]` already owns `RuleId(i)`.
    pub fn new(rules: Vec<Turn>, visited: &[CanonicalState]) -> Result<Self, SimError> {
        let mut engine = Self {
            rules,
            rule_ids: [None; CANONICAL_STATE_COUNT],
            visited: Vec::with_capacity(CANONICAL_STATE_COUNT),
        };
        for state in visited {
            if engine.rule_id(*state).is_some() {
                return Err(SimError::InvalidSetup(format!(
                    "canonical state {} is listed as visited twice",
                    state.value()
                )));
            }
            engine.learn(*state);
        }
        Ok(engine)
    }

    pub fn rules(&self) -> &[Turn] {
        &self.rules
    }

    /// Canonical states in the order they were first seen.
    pub fn visited_states(&self) -> &[CanonicalState] {
        &self.visited
    }

    pub fn rule_id(&self, state: CanonicalState) -> Option<RuleId> {
        self.rule_ids[state.index()]
    }

    /// Returns the state's id, assigning the next free one on first sight.
    pub fn learn(&mut self, state: CanonicalState) -> RuleId {
        if let Some(id) = self.rule_id(state) {
            return id;
        }
        let id = RuleId(self.visited.len() as u32);
        self.rule_ids[state.index()] = Some(id);
        self.visited.push(state);
        id
    }

    /// Learning happens before the rule lookup, so a state seen for the first time is
    /// recorded even when it has no rule and the worm halts.
    pub fn decide(&mut self, raw: SensedState, heading: Direction) -> Decision {
        let canonical = canonicalize(raw, heading);
        let id = self.learn(canonical);
        let Some(turn) = self.rules.get(id.0 as usize).copied() else {
            debug!(state = canonical.value(), rule = id.0, "no rule for state");
            return Decision::Halt(HaltReason::RulesExhausted(id));
        };
        let target = heading.turned(turn);
        if raw.has(target) {
            debug!(state = canonical.value(), rule = id.0, ?target, "edge already drawn");
            return Decision::Halt(HaltReason::EdgeTaken(target));
        }
        Decision::Move {
            turn,
            heading: target,
        }
    }

    /// Applies one decision to the worm. A halted worm stays where it is.
    pub fn advance(
        &mut self,
        worm: WormState,
        raw: SensedState,
        height: usize,
        width: usize,
    ) -> WormState {
        let Some(heading) = worm.heading else {
            return worm;
        };
        match self.decide(raw, heading) {
            Decision::Move { heading, .. } => {
                let (row, col) = toroidal_neighbor(worm.row, worm.col, heading, height, width);
                WormState::new(row, col, heading)
            }
            Decision::Halt(_) => worm.halted(),
        }
    }
}
