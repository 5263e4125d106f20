use crate::error::StateError;
use duet_core::Phase;
use tracing::debug;

/// Outcome of a successful transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed { from: Phase, to: Phase },
    /// Already in the target shape; repeated requests and self-echoes land here.
    Unchanged,
}

impl Transition {
    pub fn is_changed(&self) -> bool {
        matches!(self, Transition::Changed { .. })
    }
}

/// Phase tracker for one room view.
///
/// Knows nothing about host identity. The two ways of entering `play` are
/// separate rules: [`host_enter_play`](Self::host_enter_play) for the member
/// that issued the start, [`participant_enter_play`](Self::participant_enter_play)
/// for everyone reacting to the broadcast.
#[derive(Debug, Clone)]
pub struct RoomStateMachine {
    phase: Phase,
    round_index: usize,
    meeting_started: bool,
}

impl RoomStateMachine {
    pub fn new(entry: Phase) -> Self {
        Self {
            phase: entry,
            round_index: 0,
            meeting_started: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of rounds entered so far. Never decreases.
    pub fn round_index(&self) -> usize {
        self.round_index
    }

    pub fn meeting_started(&self) -> bool {
        self.meeting_started
    }

    pub fn start_meeting(&mut self) -> Transition {
        self.meeting_started = true;
        match self.phase {
            Phase::Wait => self.enter(Phase::Active),
            _ => Transition::Unchanged,
        }
    }

    pub fn begin_loading(&mut self) -> Result<Transition, StateError> {
        match self.phase {
            Phase::Wait | Phase::Active => Ok(self.enter(Phase::Loading)),
            Phase::End if self.round_index == 0 => Ok(self.enter(Phase::Loading)),
            Phase::Loading | Phase::Game => Ok(Transition::Unchanged),
            phase => Err(StateError::InvalidTransition {
                phase,
                action: "start the game",
            }),
        }
    }

    pub fn ready(&mut self) -> Result<Transition, StateError> {
        match self.phase {
            Phase::Loading => Ok(self.enter(Phase::Game)),
            Phase::ResultLoading1 => Ok(self.enter(Phase::ResultLoading2)),
            Phase::ResultLoading2 => Ok(self.enter(Phase::Result)),
            phase => Err(StateError::InvalidTransition {
                phase,
                action: "signal ready",
            }),
        }
    }

    /// Entering `play` as the member who issued the start.
    pub fn host_enter_play(&mut self, round_count: usize) -> Result<Transition, StateError> {
        match self.phase {
            Phase::Game | Phase::Result => self.advance_round(round_count),
            phase => Err(StateError::InvalidTransition {
                phase,
                action: "start a round",
            }),
        }
    }

    /// Entering `play` on receipt of another member's start.
    ///
    /// Every start advances a round, including one that arrives while this
    /// member is still in `play`: the host does not wait for other members'
    /// submissions. Redeliveries of the same start are filtered by message id
    /// before they reach the session.
    pub fn participant_enter_play(&mut self, round_count: usize) -> Result<Transition, StateError> {
        match self.phase {
            Phase::Loading
            | Phase::Game
            | Phase::Play
            | Phase::ResultLoading1
            | Phase::ResultLoading2
            | Phase::Result => self.advance_round(round_count),
            phase => Err(StateError::InvalidTransition {
                phase,
                action: "follow a round start",
            }),
        }
    }

    pub fn submit(&mut self) -> Result<Transition, StateError> {
        match self.phase {
            Phase::Play => Ok(self.enter(Phase::ResultLoading1)),
            phase => Err(StateError::InvalidTransition {
                phase,
                action: "submit a choice",
            }),
        }
    }

    pub fn stop(&mut self) -> Result<Transition, StateError> {
        match self.phase {
            Phase::Result => Ok(self.enter(Phase::End)),
            phase => Err(StateError::InvalidTransition {
                phase,
                action: "stop the game",
            }),
        }
    }

    /// Unconditional move to `end`, used when the channel is lost for good.
    pub fn terminate(&mut self) -> Transition {
        match self.phase {
            Phase::End => Transition::Unchanged,
            _ => self.enter(Phase::End),
        }
    }

    fn advance_round(&mut self, round_count: usize) -> Result<Transition, StateError> {
        if self.round_index >= round_count {
            return Err(StateError::NoMoreRounds(round_count));
        }
        self.round_index += 1;
        Ok(self.enter(Phase::Play))
    }

    fn enter(&mut self, to: Phase) -> Transition {
        let from = self.phase;
        self.phase = to;
        debug!(%from, %to, round_index = self.round_index, "Phase transition");
        Transition::Changed { from, to }
    }
}
