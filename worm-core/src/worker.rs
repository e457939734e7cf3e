//! One worker's view of the run: its tiles, its endpoint and, on the leader, the automaton.

use crate::automaton::AutomatonEngine;
use crate::halo;
use crate::partition::PartitionPlan;
use crate::tile::{decode_region, encode_region, TileSet};
use crate::transport::{Endpoint, Message, Startup, LEADER};
use crate::{RunReport, SimError};
use rayon::prelude::*;
use std::fmt::Display;
use tracing::{debug, info, trace};
use worm_types::{Board, GameInfo, SensedState, WorldState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickOutcome {
    Moved,
    Halted,
}

struct Worker {
    plan: PartitionPlan,
    tiles: TileSet,
    endpoint: Endpoint,
    game: GameInfo,
    automaton: Option<AutomatonEngine>,
    tick: u64,
}

/// Everything the leader checks before telling the followers to proceed.
struct LeaderSetup {
    plan: PartitionPlan,
    automaton: AutomatonEngine,
}

fn prepare(state: &WorldState, workers: usize) -> Result<LeaderSetup, SimError> {
    let board = &state.board;
    if board.height() != state.height || board.width() != state.width {
        return Err(SimError::InvalidSetup(format!(
            "board is {}x{} but the state declares {}x{}",
            board.height(),
            board.width(),
            state.height,
            state.width
        )));
    }
    if state.worm.row >= state.height || state.worm.col >= state.width {
        return Err(SimError::InvalidSetup(format!(
            "worm at ({}, {}) is outside the {}x{} grid",
            state.worm.row, state.worm.col, state.height, state.width
        )));
    }
    let plan = PartitionPlan::new(state.height, state.width, workers)?;
    let automaton = AutomatonEngine::new(state.rules.clone(), &state.visited_states)?;
    Ok(LeaderSetup { plan, automaton })
}

/// Rank 0: loads the state, broadcasts the startup verdict, distributes the regions,
/// drives the automaton and finally gathers the board.
pub(crate) fn run_leader<F, E>(
    endpoint: Endpoint,
    iterations: u64,
    loader: F,
) -> Result<RunReport, SimError>
where
    F: FnOnce() -> Result<WorldState, E>,
    E: Display,
{
    let loaded = loader()
        .map_err(|err| format!("{err:#}"))
        .and_then(|state| match prepare(&state, endpoint.size()) {
            Ok(setup) => Ok((state, setup)),
            Err(err) => Err(err.to_string()),
        });
    let (state, setup) = match loaded {
        Ok(loaded) => loaded,
        Err(reason) => {
            endpoint.broadcast(Message::Startup(Startup::Abort(reason.clone())))?;
            return Err(SimError::StartupAborted(reason));
        }
    };

    let game = state.game_info(iterations);
    endpoint.broadcast(Message::Startup(Startup::Proceed(game)))?;

    let LeaderSetup { plan, automaton } = setup;
    let mut regions: Vec<Vec<u8>> = (0..plan.workers())
        .into_par_iter()
        .map(|rank| encode_region(&state.board, &plan, rank))
        .collect();
    let own = std::mem::take(&mut regions[LEADER]);
    for (rank, region) in regions.into_iter().enumerate().skip(1) {
        endpoint.send(rank, Message::Region(region))?;
    }
    let tiles = TileSet::from_interior(&plan, LEADER, &own)?;

    let mut worker = Worker {
        plan,
        tiles,
        endpoint,
        game,
        automaton: Some(automaton),
        tick: 0,
    };
    let completed_ticks = worker.run_ticks()?;
    let board = worker.gather_board()?;
    let visited_states = worker
        .automaton
        .as_ref()
        .map(|automaton| automaton.visited_states().to_vec())
        .unwrap_or_default();

    Ok(RunReport {
        state: WorldState {
            height: state.height,
            width: state.width,
            worm: worker.game.worm,
            rules: state.rules,
            visited_states,
            board,
        },
        completed_ticks,
    })
}

/// Ranks 1..N: wait for the startup verdict, take a region, follow the leader's ticks and
/// hand the region back.
pub(crate) fn run_follower(endpoint: Endpoint) -> Result<(), SimError> {
    let game = match endpoint.recv_startup(LEADER)? {
        Startup::Proceed(game) => game,
        Startup::Abort(reason) => return Err(SimError::StartupAborted(reason)),
    };
    let plan = PartitionPlan::new(game.height, game.width, endpoint.size())?;
    let region = endpoint.recv_region(LEADER)?;
    let tiles = TileSet::from_interior(&plan, endpoint.rank(), &region)?;

    let mut worker = Worker {
        plan,
        tiles,
        endpoint,
        game,
        automaton: None,
        tick: 0,
    };
    worker.run_ticks()?;
    worker
        .endpoint
        .send(LEADER, Message::Gather(worker.tiles.interior()))
}

impl Worker {
    fn run_ticks(&mut self) -> Result<u64, SimError> {
        let mut completed = 0;
        while self.game.iteration_count > 0 && !self.game.worm.is_halted() {
            self.game.iteration_count -= 1;
            match self.step()? {
                TickOutcome::Moved => completed += 1,
                TickOutcome::Halted => break,
            }
        }
        if self.endpoint.is_leader() {
            info!(completed, worm = ?self.game.worm, "tick loop finished");
        }
        Ok(completed)
    }

    fn step(&mut self) -> Result<TickOutcome, SimError> {
        self.tick += 1;
        let rank = self.endpoint.rank();
        halo::exchange(&mut self.tiles, &self.plan, &self.endpoint)?;

        let before = self.game.worm;
        let sensed = self.tiles.sense_at(before.row, before.col);
        self.endpoint.send(LEADER, Message::Sensed(sensed))?;

        if let Some(automaton) = self.automaton.as_mut() {
            let raw = collect_sensed(&self.endpoint)?;
            self.game.worm = automaton.advance(before, raw, self.game.height, self.game.width);
            debug!(tick = self.tick, raw = raw.bits(), worm = ?self.game.worm, "worm decided");
            self.endpoint.broadcast(Message::WormUpdate(self.game))?;
        } else {
            self.game = self.endpoint.recv_worm_update(LEADER)?;
        }

        let Some(heading) = self.game.worm.heading else {
            return Ok(TickOutcome::Halted);
        };
        let after = self.game.worm;
        if self.tiles.apply_edge_at(after.row, after.col, heading.opposite()) {
            trace!(rank, row = after.row, col = after.col, "edge drawn at new cell");
        }
        if self.tiles.apply_edge_at(before.row, before.col, heading) {
            trace!(rank, row = before.row, col = before.col, "edge drawn at old cell");
        }
        Ok(TickOutcome::Moved)
    }

    fn gather_board(&self) -> Result<Board, SimError> {
        let mut board = Board::new(self.plan.height(), self.plan.width());
        decode_region(&mut board, &self.plan, LEADER, &self.tiles.interior())?;
        for rank in 1..self.plan.workers() {
            let bits = self.endpoint.recv_gather(rank)?;
            decode_region(&mut board, &self.plan, rank, &bits)?;
        }
        Ok(board)
    }
}

/// Exactly one worker owns the worm's cell; everyone else reports nothing.
fn collect_sensed(endpoint: &Endpoint) -> Result<SensedState, SimError> {
    let mut found = None;
    for rank in 0..endpoint.size() {
        if let Some(state) = endpoint.recv_sensed(rank)? {
            if found.replace(state).is_some() {
                return Err(endpoint.protocol_error("more than one worker owns the worm's cell"));
            }
        }
    }
    found.ok_or_else(|| endpoint.protocol_error("no worker owns the worm's cell"))
}
