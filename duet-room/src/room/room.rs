use crate::config::RoomConfig;
use crate::error::StateError;
use crate::layout::VideoLayout;
use crate::presence::{Participant, ParticipantDirectory};
use crate::room::room_command::{RoomCommand, RoomRequest};
use crate::room::session::{GameSession, Role};
use crate::room::snapshot::RoomSnapshot;
use crate::timer::RoundTimer;
use crate::transport::{ConnectionStatus, EventSink, TransportEvent};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

const COMMAND_CAPACITY: usize = 64;

/// Event loop of one room view.
///
/// Commands, inbound messages, presence updates and timer ticks are handled one
/// at a time on this task, so the session never sees two inputs concurrently.
pub struct RoomView {
    config: RoomConfig,
    session: GameSession,
    command_rx: mpsc::Receiver<RoomRequest>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    presence_rx: watch::Receiver<Vec<Participant>>,
    directory: ParticipantDirectory,
    connection: ConnectionStatus,
    snapshot_tx: watch::Sender<RoomSnapshot>,
}

impl RoomView {
    pub fn new(
        config: RoomConfig,
        sink: Arc<dyn EventSink>,
        transport_rx: mpsc::Receiver<TransportEvent>,
        presence_rx: watch::Receiver<Vec<Participant>>,
    ) -> (
        Self,
        mpsc::Sender<RoomRequest>,
        watch::Receiver<RoomSnapshot>,
    ) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(RoomSnapshot::initial(
            config.entry_phase,
            config.timer_duration.as_secs(),
        ));

        let view = Self {
            session: GameSession::new(config.local_member, config.entry_phase, sink),
            config,
            command_rx,
            transport_rx,
            presence_rx,
            directory: ParticipantDirectory::default(),
            connection: ConnectionStatus::Connecting,
            snapshot_tx,
        };
        (view, command_tx, snapshot_rx)
    }

    pub async fn run(mut self) {
        let room = self.config.room_id;
        info!(room = %room, member = %self.config.local_member, "Room view started");

        let timer = RoundTimer::start(self.config.timer_duration, move || {
            info!(room = %room, "Room timer elapsed");
        });
        let mut timer_rx = timer.subscribe();
        let mut transport_open = true;
        let mut presence_open = true;
        let mut timer_open = true;

        self.refresh_presence();
        let remaining = *timer_rx.borrow_and_update();
        self.publish_snapshot(remaining);

        loop {
            tokio::select! {
                request = self.command_rx.recv() => match request {
                    Some(request) => self.handle_request(request),
                    None => {
                        info!(room = %room, "Command channel closed. Shutting down room view.");
                        break;
                    }
                },

                event = self.transport_rx.recv(), if transport_open => match event {
                    Some(event) => self.handle_transport_event(event),
                    None => {
                        warn!(room = %room, "Transport channel closed");
                        transport_open = false;
                    }
                },

                changed = self.presence_rx.changed(), if presence_open => match changed {
                    Ok(()) => self.refresh_presence(),
                    Err(_) => presence_open = false,
                },

                changed = timer_rx.changed(), if timer_open => {
                    if changed.is_err() {
                        timer_open = false;
                    }
                }
            }

            let remaining = *timer_rx.borrow_and_update();
            self.publish_snapshot(remaining);
        }

        timer.cancel();
        info!(room = %room, "Room view finished");
    }

    fn handle_request(&mut self, request: RoomRequest) {
        let RoomRequest { command, reply } = request;
        let result = self.execute(command);
        if let Err(e) = &result {
            warn!(room = %self.config.room_id, command = command.name(), "Command rejected: {}", e);
        }
        if let Some(reply) = reply {
            let _ = reply.send(result);
        }
    }

    fn execute(&mut self, command: RoomCommand) -> Result<(), StateError> {
        match command {
            RoomCommand::StartMeeting => {
                self.session.start_meeting();
            }
            RoomCommand::StartGame => {
                self.session.start_game()?;
            }
            RoomCommand::Ready => {
                self.session.ready()?;
            }
            RoomCommand::StartPlay => {
                self.session.start_play()?;
            }
            RoomCommand::Submit { choice } => {
                self.session.submit_choice(choice)?;
            }
            RoomCommand::NextRound => {
                self.session.next_round()?;
            }
            RoomCommand::Stop => {
                self.session.stop()?;
            }
            RoomCommand::RequestResults => self.session.request_results()?,
        }
        Ok(())
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Message(payload) => {
                if let Err(e) = self.session.on_message(&payload) {
                    warn!(room = %self.config.room_id, "Discarding inbound message: {}", e);
                }
            }

            TransportEvent::Status(status) => {
                match &status {
                    ConnectionStatus::Failed { reason } => {
                        error!(room = %self.config.room_id, "Channel failed permanently: {}", reason);
                        self.session.terminate();
                    }
                    ConnectionStatus::Reconnecting { attempt } => {
                        warn!(room = %self.config.room_id, attempt, "Channel reconnecting");
                    }
                    other => info!(room = %self.config.room_id, status = ?other, "Channel status"),
                }
                self.connection = status;
            }
        }
    }

    fn refresh_presence(&mut self) {
        let participants = self.presence_rx.borrow_and_update().clone();
        self.directory = ParticipantDirectory::new(participants);

        let role = if self.directory.is_host(self.config.local_member) {
            Role::Host
        } else {
            Role::Participant
        };
        self.session.set_role(role);
    }

    fn snapshot(&self, remaining_secs: u64) -> RoomSnapshot {
        RoomSnapshot {
            phase: self.session.phase(),
            round_index: self.session.round_index(),
            meeting_started: self.session.meeting_started(),
            role: self.session.role(),
            current_round: self.session.current_round().ok().cloned(),
            round_count: self.session.rounds().len(),
            tally: self.session.tally().clone(),
            connection: self.connection.clone(),
            remaining_secs,
            layout: VideoLayout::build(&self.directory, self.config.slots_per_category()),
        }
    }

    fn publish_snapshot(&self, remaining_secs: u64) {
        let next = self.snapshot(remaining_secs);
        self.snapshot_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}
