use serde::Serialize;
use std::fmt::Display;
use std::thread;
use thiserror::Error;
use tracing::info;
use worm_types::WorldState;

mod automaton;
mod grid;
mod halo;
mod partition;
mod tile;
mod transport;
mod worker;

pub use automaton::{canonicalize, AutomatonEngine, Decision, HaltReason};
pub use partition::{PartitionPlan, TileBounds};
pub use tile::{decode_region, encode_region, Tile, TileSet};

#[cfg(test)]
mod tests;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("invalid simulation setup: {0}")]
    InvalidSetup(String),
    #[error("startup aborted: {0}")]
    StartupAborted(String),
    #[error("worker {rank} protocol failure: {message}")]
    Protocol { rank: usize, message: String },
    #[error("worker {0} panicked")]
    WorkerPanicked(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub workers: usize,
    pub iterations: u64,
}

/// The gathered world after the last tick, and how many ticks moved the worm.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunReport {
    pub state: WorldState,
    pub completed_ticks: u64,
}

/// A run of `workers` cooperating threads over one shared world.
#[derive(Debug, Clone)]
pub struct Simulation {
    settings: RunSettings,
}

impl Simulation {
    pub fn new(settings: RunSettings) -> Result<Self, SimError> {
        if settings.workers == 0 {
            return Err(SimError::InvalidSetup(
                "worker count must be greater than zero".to_owned(),
            ));
        }
        Ok(Self { settings })
    }

    pub fn run(&self, initial: WorldState) -> Result<RunReport, SimError> {
        self.launch(move || Ok::<_, SimError>(initial))
    }

    /// Runs `loader` on the leader before any worker touches the grid. A loader error is
    /// broadcast to every follower so the whole run stops before the first tick.
    pub fn launch<F, E>(&self, loader: F) -> Result<RunReport, SimError>
    where
        F: FnOnce() -> Result<WorldState, E>,
        E: Display,
    {
        let RunSettings {
            workers,
            iterations,
        } = self.settings;
        info!(workers, iterations, "starting run");

        let mut endpoints = transport::fabric(workers).into_iter();
        let leader = endpoints.next().ok_or_else(|| {
            SimError::InvalidSetup("worker count must be greater than zero".to_owned())
        })?;

        let report = thread::scope(|scope| {
            let followers: Vec<_> = endpoints
                .map(|endpoint| {
                    let rank = endpoint.rank();
                    (rank, scope.spawn(move || worker::run_follower(endpoint)))
                })
                .collect();

            let mut result = worker::run_leader(leader, iterations, loader);
            for (rank, handle) in followers {
                let outcome = handle.join().unwrap_or(Err(SimError::WorkerPanicked(rank)));
                if let Err(err) = outcome {
                    if result.is_ok() {
                        result = Err(err);
                    }
                }
            }
            result
        })?;

        info!(
            completed_ticks = report.completed_ticks,
            halted = report.state.worm.is_halted(),
            edges = report.state.board.count_edges(),
            "run finished"
        );
        Ok(report)
    }
}
