use crate::error::{InboundError, StateError};
use crate::room::state_machine::{RoomStateMachine, Transition};
use crate::transport::EventSink;
use duet_core::{
    ChoiceNum, ChoiceSubmission, ClientEvent, MemberId, Phase, ResultTally, Round, RoundId,
    ServerEvent,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Authority of the local member, derived from the presence host flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    Host,
    #[default]
    Participant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => f.write_str("host"),
            Role::Participant => f.write_str("participant"),
        }
    }
}

/// Game session controller for one room view.
///
/// Local actions apply their transition optimistically and publish exactly one
/// event. Inbound events go through [`GameSession::on_message`] and are safe to
/// apply on top of the optimistic state, since every sender also receives its
/// own echo.
pub struct GameSession {
    machine: RoomStateMachine,
    rounds: Vec<Round>,
    tally: ResultTally,
    submitted: HashSet<RoundId>,
    role: Role,
    local_member: MemberId,
    sink: Arc<dyn EventSink>,
}

impl GameSession {
    pub fn new(local_member: MemberId, entry_phase: Phase, sink: Arc<dyn EventSink>) -> Self {
        Self {
            machine: RoomStateMachine::new(entry_phase),
            rounds: Vec::new(),
            tally: ResultTally::default(),
            submitted: HashSet::new(),
            role: Role::default(),
            local_member,
            sink,
        }
    }

    pub fn set_role(&mut self, role: Role) {
        if self.role != role {
            info!(member = %self.local_member, %role, "Local role changed");
            self.role = role;
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_host(&self) -> bool {
        self.role == Role::Host
    }

    pub fn local_member(&self) -> MemberId {
        self.local_member
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn round_index(&self) -> usize {
        self.machine.round_index()
    }

    pub fn meeting_started(&self) -> bool {
        self.machine.meeting_started()
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn tally(&self) -> &ResultTally {
        &self.tally
    }

    pub fn has_submitted(&self, round: RoundId) -> bool {
        self.submitted.contains(&round)
    }

    /// Cached round at `index` (0-based).
    pub fn round(&self, index: usize) -> Result<&Round, StateError> {
        self.rounds.get(index).ok_or(StateError::RoundOutOfRange {
            index,
            len: self.rounds.len(),
        })
    }

    /// The round entered by the most recent move into `play`.
    pub fn current_round(&self) -> Result<&Round, StateError> {
        match self.machine.round_index() {
            0 => Err(StateError::NoCurrentRound),
            index => self.round(index - 1),
        }
    }

    pub fn start_meeting(&mut self) -> Transition {
        let transition = self.machine.start_meeting();
        self.sink.publish(ClientEvent::RoomStart);
        transition
    }

    pub fn start_game(&mut self) -> Result<Transition, StateError> {
        self.require_host("start the game")?;
        let transition = self.machine.begin_loading()?;
        self.sink.publish(ClientEvent::GameStart);
        Ok(transition)
    }

    /// Local "ready" signal, raised once the current screen has finished loading.
    pub fn ready(&mut self) -> Result<Transition, StateError> {
        let transition = self.machine.ready()?;
        if self.is_host()
            && transition
                == (Transition::Changed {
                    from: Phase::ResultLoading1,
                    to: Phase::ResultLoading2,
                })
        {
            self.sink.publish(ClientEvent::GetResult);
        }
        Ok(transition)
    }

    pub fn start_play(&mut self) -> Result<Transition, StateError> {
        self.require_host("start a round")?;
        let transition = self.machine.host_enter_play(self.rounds.len())?;
        self.sink.publish(ClientEvent::ChoiceStart);
        Ok(transition)
    }

    pub fn next_round(&mut self) -> Result<Transition, StateError> {
        self.require_host("advance to the next round")?;
        if self.phase() != Phase::Result {
            return Err(StateError::InvalidTransition {
                phase: self.phase(),
                action: "advance to the next round",
            });
        }
        self.start_play()
    }

    pub fn stop(&mut self) -> Result<Transition, StateError> {
        self.machine.stop()
    }

    pub fn submit_choice(&mut self, choice: ChoiceNum) -> Result<Transition, StateError> {
        let round = self.current_round()?.id();
        if self.submitted.contains(&round) {
            return Err(StateError::AlreadySubmitted(round));
        }
        let transition = self.machine.submit()?;
        self.submitted.insert(round);
        self.sink.publish(ClientEvent::Submit(ChoiceSubmission {
            balance_game_id: round,
            member_id: self.local_member,
            choice_num: choice,
        }));
        Ok(transition)
    }

    pub fn request_results(&mut self) -> Result<(), StateError> {
        self.require_host("request results")?;
        self.sink.publish(ClientEvent::GetResult);
        Ok(())
    }

    pub fn terminate(&mut self) -> Transition {
        self.machine.terminate()
    }

    /// Single inbound entry point. A failing message leaves the session untouched.
    pub fn on_message(&mut self, payload: &[u8]) -> Result<(), InboundError> {
        match ServerEvent::decode(payload)? {
            Some(event) => Ok(self.apply(event)?),
            None => {
                debug!("Ignoring message with unknown discriminator");
                Ok(())
            }
        }
    }

    pub fn apply(&mut self, event: ServerEvent) -> Result<(), StateError> {
        match event {
            ServerEvent::MeetingStarted => {
                self.machine.start_meeting();
            }

            ServerEvent::GameStarted { rounds } => self.on_game_started(rounds)?,

            ServerEvent::ChoicePhaseStarted => {
                if self.is_host() {
                    debug!("Round start echo; host already advanced");
                } else {
                    self.machine.participant_enter_play(self.rounds.len())?;
                }
            }

            ServerEvent::ChoiceSubmitted { echo } => {
                debug!(%echo, "Choice submission acknowledged");
            }

            ServerEvent::ResultRetrieved { records } => {
                self.tally = ResultTally::from_records(&records);
                info!(
                    records = records.len(),
                    rounds = self.tally.rounds().count(),
                    "Result tally rebuilt"
                );
            }
        }
        Ok(())
    }

    fn on_game_started(&mut self, rounds: Vec<Round>) -> Result<(), StateError> {
        if !self.rounds.is_empty() && self.rounds == rounds {
            debug!("Duplicate game start ignored");
            return Ok(());
        }
        if self.machine.round_index() > 0 {
            warn!("Game start received for a different game mid-play");
            return Err(StateError::GameAlreadyStarted);
        }

        self.machine.begin_loading()?;
        info!(rounds = rounds.len(), "Rounds cached");
        self.rounds = rounds;
        self.tally = ResultTally::default();
        self.submitted.clear();
        Ok(())
    }

    fn require_host(&self, action: &'static str) -> Result<(), StateError> {
        if self.is_host() {
            Ok(())
        } else {
            Err(StateError::NotHost(action))
        }
    }
}
