use duet_core::{Phase, ProtocolError, RoundId};
use thiserror::Error;

/// A local action or inbound event does not fit the current room state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("cannot {action} while in phase `{phase}`")]
    InvalidTransition { phase: Phase, action: &'static str },

    #[error("only the host may {0}")]
    NotHost(&'static str),

    #[error("round index {index} is out of range for {len} cached rounds")]
    RoundOutOfRange { index: usize, len: usize },

    #[error("no round has been entered yet")]
    NoCurrentRound,

    #[error("all {0} rounds have already been played")]
    NoMoreRounds(usize),

    #[error("a choice was already submitted for round {0}")]
    AlreadySubmitted(RoundId),

    #[error("a different game is already in progress")]
    GameAlreadyStarted,
}

/// Failure while applying one inbound message. Never fatal to the room.
#[derive(Debug, Error)]
pub enum InboundError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    State(#[from] StateError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error("room view is closed")]
    Closed,

    #[error("room command queue is full")]
    Busy,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect: {0:#}")]
    Connect(anyhow::Error),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("broker rejected the session: {0}")]
    Rejected(String),

    #[error("connection closed")]
    Closed,

    #[error("no heartbeat from broker for {0:?}")]
    HeartbeatTimeout(std::time::Duration),

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

impl TransportError {
    /// Fatal errors end the session instead of triggering a reconnect.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::Rejected(_))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("room capacity must be greater than zero")]
    ZeroCapacity,

    #[error("room capacity must be even to split between categories, got {0}")]
    OddCapacity(usize),

    #[error("environment variable `{0}` is not set")]
    MissingVar(String),

    #[error("no credential configured for deployment `{0}`")]
    UnknownDeployment(String),

    #[error("invalid value `{value}` for `{name}`")]
    InvalidValue { name: String, value: String },
}
