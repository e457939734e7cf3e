pub(super) use super::*;
pub(super) use crate::transport::{fabric, Message, Startup};
pub(super) use worm_types::{Board, CanonicalState, Direction, RuleId, SensedState, Turn, WormState};

mod coordinator_ticks;
mod halo_exchange;
mod support;
mod tile_edges;
