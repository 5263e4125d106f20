use crate::config::RoomConfig;
use crate::error::{ConfigError, RoomError};
use crate::layout::{Slot, VideoLayout};
use crate::presence::{PresenceProvider, TrackHandle};
use crate::room::room::RoomView;
use crate::room::room_command::{RoomCommand, RoomRequest};
use crate::room::snapshot::RoomSnapshot;
use crate::transport::{Connector, TransportAdapter, TransportConfig};
use duet_core::RoomId;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::info;

/// Owner of a running room view and its channel.
///
/// Dropping the handle, or calling [`RoomHandle::teardown`], releases the
/// transport and the timer. Nothing is delivered to the view afterwards.
pub struct RoomHandle {
    room_id: RoomId,
    command_tx: mpsc::Sender<RoomRequest>,
    snapshot_rx: watch::Receiver<RoomSnapshot>,
    transport: Arc<TransportAdapter>,
    presence: Arc<dyn PresenceProvider>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RoomHandle {
    /// Connects the room channel and starts the view. Must be called from within
    /// a Tokio runtime. Connection failures are reported through the snapshot's
    /// connection status, never as an error here.
    pub fn open(
        config: RoomConfig,
        transport_config: TransportConfig,
        connector: Arc<dyn Connector>,
        presence: Arc<dyn PresenceProvider>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let room_id = config.room_id;

        let (adapter, transport_rx) = TransportAdapter::connect(connector, room_id, transport_config);
        let transport = Arc::new(adapter);
        let (view, command_tx, snapshot_rx) =
            RoomView::new(config, transport.clone(), transport_rx, presence.subscribe());
        let task = tokio::spawn(view.run());

        info!(room = %room_id, "Room opened");
        Ok(Self {
            room_id,
            command_tx,
            snapshot_rx,
            transport,
            presence,
            task: Mutex::new(Some(task)),
        })
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Runs `command` on the view and waits for its outcome.
    pub async fn execute(&self, command: RoomCommand) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = RoomRequest {
            command,
            reply: Some(reply_tx),
        };
        self.command_tx
            .send(request)
            .await
            .map_err(|_| RoomError::Closed)?;
        reply_rx.await.map_err(|_| RoomError::Closed)??;
        Ok(())
    }

    /// Queues `command` without waiting for its outcome. A full queue
    /// rejects the command with [`RoomError::Busy`].
    pub fn send(&self, command: RoomCommand) -> Result<(), RoomError> {
        self.command_tx
            .try_send(command.into())
            .map_err(|e| match e {
                TrySendError::Full(_) => RoomError::Busy,
                TrySendError::Closed(_) => RoomError::Closed,
            })
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RoomSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn layout(&self) -> VideoLayout {
        self.snapshot_rx.borrow().layout.clone()
    }

    pub fn track(&self, slot: &Slot) -> Option<TrackHandle> {
        slot.track(self.presence.as_ref())
    }

    /// Disconnects the channel and stops the view. Safe to call more than once.
    pub async fn teardown(&self) {
        self.transport.disconnect().await;

        let task = match self.task.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(task) = task else {
            return;
        };
        task.abort();
        let _ = task.await;
        info!(room = %self.room_id, "Room torn down");
    }
}

impl Drop for RoomHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().ok().and_then(Option::take) {
            task.abort();
        }
    }
}
