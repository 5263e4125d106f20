use crate::layout::VideoLayout;
use crate::room::session::Role;
use crate::transport::ConnectionStatus;
use duet_core::{Phase, ResultTally, Round};

/// Everything a renderer needs, published after each change of the room view.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub phase: Phase,
    pub round_index: usize,
    pub meeting_started: bool,
    pub role: Role,
    pub current_round: Option<Round>,
    pub round_count: usize,
    pub tally: ResultTally,
    pub connection: ConnectionStatus,
    pub remaining_secs: u64,
    pub layout: VideoLayout,
}

impl RoomSnapshot {
    pub fn initial(entry_phase: Phase, remaining_secs: u64) -> Self {
        Self {
            phase: entry_phase,
            round_index: 0,
            meeting_started: false,
            role: Role::default(),
            current_round: None,
            round_count: 0,
            tally: ResultTally::default(),
            connection: ConnectionStatus::Connecting,
            remaining_secs,
            layout: VideoLayout::default(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionStatus::Connected
    }
}
