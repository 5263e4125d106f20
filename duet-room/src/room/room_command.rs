use crate::error::StateError;
use duet_core::ChoiceNum;
use tokio::sync::oneshot;

/// Local user actions delivered to the room view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomCommand {
    StartMeeting,
    StartGame,
    /// The current screen finished loading.
    Ready,
    StartPlay,
    Submit { choice: ChoiceNum },
    NextRound,
    Stop,
    RequestResults,
}

impl RoomCommand {
    pub fn name(&self) -> &'static str {
        match self {
            RoomCommand::StartMeeting => "start_meeting",
            RoomCommand::StartGame => "start_game",
            RoomCommand::Ready => "ready",
            RoomCommand::StartPlay => "start_play",
            RoomCommand::Submit { .. } => "submit",
            RoomCommand::NextRound => "next_round",
            RoomCommand::Stop => "stop",
            RoomCommand::RequestResults => "request_results",
        }
    }
}

/// A command plus an optional channel for the outcome.
#[derive(Debug)]
pub struct RoomRequest {
    pub command: RoomCommand,
    pub reply: Option<oneshot::Sender<Result<(), StateError>>>,
}

impl From<RoomCommand> for RoomRequest {
    fn from(command: RoomCommand) -> Self {
        Self {
            command,
            reply: None,
        }
    }
}
