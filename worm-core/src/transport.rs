//! Point-to-point message fabric between workers.
//!
//! Every ordered pair of workers (including a worker and itself) gets its own unbounded
//! FIFO channel, so sends never block and messages from one peer arrive in the order they
//! were sent. A worker that exits drops its senders, which turns any later receive from it
//! into a protocol error instead of a hang.

use crate::SimError;
use crossbeam::channel::{self, Receiver, Sender};
use worm_types::{GameInfo, SensedState};

pub(crate) const LEADER: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Startup {
    Proceed(GameInfo),
    Abort(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Message {
    Startup(Startup),
    Region(Vec<u8>),
    LeftHalo(Vec<u8>),
    TopHalo(Vec<u8>),
    Sensed(Option<SensedState>),
    WormUpdate(GameInfo),
    Gather(Vec<u8>),
}

impl Message {
    fn kind(&self) -> &'static str {
        match self {
            Message::Startup(_) => "startup",
            Message::Region(_) => "region",
            Message::LeftHalo(_) => "left halo",
            Message::TopHalo(_) => "top halo",
            Message::Sensed(_) => "sensed state",
            Message::WormUpdate(_) => "worm update",
            Message::Gather(_) => "gather",
        }
    }
}

pub(crate) struct Endpoint {
    rank: usize,
    outboxes: Vec<Sender<Message>>,
    inboxes: Vec<Receiver<Message>>,
}

/// One endpoint per worker; endpoint `r` is meant to be moved into worker `r`.
pub(crate) fn fabric(workers: usize) -> Vec<Endpoint> {
    let mut outboxes: Vec<Vec<Sender<Message>>> = (0..workers).map(|_| Vec::new()).collect();
    let mut inboxes: Vec<Vec<Receiver<Message>>> = (0..workers).map(|_| Vec::new()).collect();
    for from in 0..workers {
        for to in 0..workers {
            let (tx, rx) = channel::unbounded();
            outboxes[from].push(tx);
            inboxes[to].push(rx);
        }
    }

    outboxes
        .into_iter()
        .zip(inboxes)
        .enumerate()
        .map(|(rank, (outboxes, inboxes))| Endpoint {
            rank,
            outboxes,
            inboxes,
        })
        .collect()
}

impl Endpoint {
    pub(crate) fn rank(&self) -> usize {
        self.rank
    }

    pub(crate) fn size(&self) -> usize {
        self.outboxes.len()
    }

    pub(crate) fn is_leader(&self) -> bool {
        self.rank == LEADER
    }

    pub(crate) fn protocol_error(&self, message: impl Into<String>) -> SimError {
        SimError::Protocol {
            rank: self.rank,
            message: message.into(),
        }
    }

    pub(crate) fn send(&self, to: usize, message: Message) -> Result<(), SimError> {
        let kind = message.kind();
        self.outboxes[to]
            .send(message)
            .map_err(|_| self.protocol_error(format!("worker {to} hung up before {kind} send")))
    }

    /// Sends a copy of `message` to every other worker.
    pub(crate) fn broadcast(&self, message: Message) -> Result<(), SimError> {
        for to in (0..self.size()).filter(|to| *to != self.rank) {
            self.send(to, message.clone())?;
        }
        Ok(())
    }

    fn recv(&self, from: usize) -> Result<Message, SimError> {
        self.inboxes[from]
            .recv()
            .map_err(|_| self.protocol_error(format!("worker {from} hung up mid-protocol")))
    }

    fn recv_expected<T>(
        &self,
        from: usize,
        expected: &str,
        pick: impl FnOnce(Message) -> Result<T, Message>,
    ) -> Result<T, SimError> {
        pick(self.recv(from)?).map_err(|other| {
            self.protocol_error(format!(
                "expected {expected} from worker {from}, received {}",
                other.kind()
            ))
        })
    }

    pub(crate) fn recv_startup(&self, from: usize) -> Result<Startup, SimError> {
        self.recv_expected(from, "startup", |message| match message {
            Message::Startup(startup) => Ok(startup),
            other => Err(other),
        })
    }

    pub(crate) fn recv_region(&self, from: usize) -> Result<Vec<u8>, SimError> {
        self.recv_expected(from, "region", |message| match message {
            Message::Region(bits) => Ok(bits),
            other => Err(other),
        })
    }

    pub(crate) fn recv_left_halo(&self, from: usize) -> Result<Vec<u8>, SimError> {
        self.recv_expected(from, "left halo", |message| match message {
            Message::LeftHalo(bits) => Ok(bits),
            other => Err(other),
        })
    }

    pub(crate) fn recv_top_halo(&self, from: usize) -> Result<Vec<u8>, SimError> {
        self.recv_expected(from, "top halo", |message| match message {
            Message::TopHalo(bits) => Ok(bits),
            other => Err(other),
        })
    }

    pub(crate) fn recv_sensed(&self, from: usize) -> Result<Option<SensedState>, SimError> {
        self.recv_expected(from, "sensed state", |message| match message {
            Message::Sensed(state) => Ok(state),
            other => Err(other),
        })
    }

    pub(crate) fn recv_worm_update(&self, from: usize) -> Result<GameInfo, SimError> {
        self.recv_expected(from, "worm update", |message| match message {
            Message::WormUpdate(game) => Ok(game),
            other => Err(other),
        })
    }

    pub(crate) fn recv_gather(&self, from: usize) -> Result<Vec<u8>, SimError> {
        self.recv_expected(from, "gather", |message| match message {
            Message::Gather(bits) => Ok(bits),
            other => Err(other),
        })
    }
}
