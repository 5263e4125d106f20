use crate::error::TransportError;
use crate::transport::connector::{Connection, Connector};
use crate::transport::event_sink::EventSink;
use crate::transport::transport_config::TransportConfig;
use crate::transport::transport_event::{ConnectionStatus, LinkEvent, TransportEvent};
use bytes::Bytes;
use duet_core::{ClientEvent, RoomId};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Owns the room channel for the lifetime of one room view.
///
/// A background task keeps one subscribed connection alive: it reconnects
/// after a fixed delay, sends and checks heartbeats, and forwards inbound
/// payloads in arrival order. Publishing never blocks; payloads published
/// while no connection is up are dropped.
pub struct TransportAdapter {
    room: RoomId,
    publish_tx: mpsc::UnboundedSender<Bytes>,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TransportAdapter {
    /// Starts the connection task. Must be called from within a Tokio runtime.
    pub fn connect(
        connector: Arc<dyn Connector>,
        room: RoomId,
        config: TransportConfig,
    ) -> (Self, mpsc::Receiver<TransportEvent>) {
        let (publish_tx, publish_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = AdapterLoop {
            connector,
            room,
            recent: RecentIds::new(config.dedup_window),
            config,
            publish_rx,
            event_tx,
            shutdown_rx,
        };
        let task = tokio::spawn(worker.run());

        let adapter = Self {
            room,
            publish_tx,
            shutdown_tx,
            task: Mutex::new(Some(task)),
        };
        (adapter, event_rx)
    }

    pub fn publish_raw(&self, payload: Bytes) {
        if self.publish_tx.send(payload).is_err() {
            debug!(room = %self.room, "Publish on closed transport ignored");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.publish_tx.is_closed()
    }

    /// Stops the connection task and waits for it to release the connection.
    /// Safe to call more than once.
    pub async fn disconnect(&self) {
        self.shutdown_tx.send_replace(true);

        let task = match self.task.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(mut task) = task else {
            return;
        };

        match time::timeout(SHUTDOWN_TIMEOUT, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(room = %self.room, "Transport task ended abnormally: {}", e),
            Err(_) => {
                warn!(room = %self.room, "Transport task did not stop in time; aborting");
                task.abort();
            }
        }
        info!(room = %self.room, "Transport disconnected");
    }
}

impl EventSink for TransportAdapter {
    fn publish(&self, event: ClientEvent) {
        self.publish_raw(Bytes::from(event.encode()));
    }
}

impl Drop for TransportAdapter {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
        if let Some(task) = self.task.get_mut().ok().and_then(Option::take) {
            task.abort();
        }
    }
}

enum Exit {
    Shutdown,
    Lost(TransportError),
}

struct AdapterLoop {
    connector: Arc<dyn Connector>,
    room: RoomId,
    config: TransportConfig,
    publish_rx: mpsc::UnboundedReceiver<Bytes>,
    event_tx: mpsc::Sender<TransportEvent>,
    shutdown_rx: watch::Receiver<bool>,
    recent: RecentIds,
}

impl AdapterLoop {
    async fn run(mut self) {
        info!(room = %self.room, "Transport adapter started");
        let mut attempt: u32 = 0;

        loop {
            let status = if attempt == 0 {
                ConnectionStatus::Connecting
            } else {
                ConnectionStatus::Reconnecting { attempt }
            };
            if !self.emit(TransportEvent::Status(status)).await {
                break;
            }

            let (link_tx, link_rx) = mpsc::channel(self.config.event_capacity.max(1));
            let Some(outcome) = self.establish(link_tx).await else {
                break;
            };

            match outcome {
                Ok(connection) => {
                    info!(room = %self.room, "Connected to broker");
                    attempt = 0;
                    if !self.emit(TransportEvent::Status(ConnectionStatus::Connected)).await {
                        connection.close().await;
                        break;
                    }
                    match self.pump(connection, link_rx).await {
                        Exit::Shutdown => break,
                        Exit::Lost(e) => warn!(room = %self.room, "Connection lost: {}", e),
                    }
                }
                Err(e) if e.is_fatal() => {
                    error!(room = %self.room, "Giving up on broker: {}", e);
                    let reason = e.to_string();
                    let _ = self
                        .emit(TransportEvent::Status(ConnectionStatus::Failed { reason }))
                        .await;
                    return;
                }
                Err(e) => warn!(room = %self.room, attempt, "Connect attempt failed: {}", e),
            }

            attempt = attempt.saturating_add(1);
            if !self.backoff().await {
                break;
            }
        }

        let _ = self
            .event_tx
            .try_send(TransportEvent::Status(ConnectionStatus::Closed));
        info!(room = %self.room, "Transport adapter stopped");
    }

    async fn emit(&self, event: TransportEvent) -> bool {
        self.event_tx.send(event).await.is_ok()
    }

    /// Runs one connect attempt. `None` means shutdown was requested meanwhile,
    /// in which case the attempt is dropped before it can deliver anything.
    async fn establish(
        &mut self,
        link_tx: mpsc::Sender<LinkEvent>,
    ) -> Option<Result<Box<dyn Connection>, TransportError>> {
        let connector = Arc::clone(&self.connector);
        let config = self.config.clone();
        let room = self.room;
        let limit = self.config.connect_timeout;

        let attempt = async move {
            match time::timeout(limit, connector.connect(room, &config, link_tx)).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Handshake(format!(
                    "no session after {:?}",
                    limit
                ))),
            }
        };
        tokio::pin!(attempt);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut self.shutdown_rx) => return None,
                result = &mut attempt => return Some(result),
                dropped = self.publish_rx.recv() => match dropped {
                    Some(_) => warn!(room = %self.room, "Dropping publish while connecting"),
                    None => return None,
                },
            }
        }
    }

    /// Waits out the reconnect delay. `false` means shutdown was requested.
    async fn backoff(&mut self) -> bool {
        let delay = time::sleep(self.config.reconnect_delay);
        tokio::pin!(delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut self.shutdown_rx) => return false,
                _ = &mut delay => return true,
                dropped = self.publish_rx.recv() => match dropped {
                    Some(_) => warn!(room = %self.room, "Dropping publish while disconnected"),
                    None => return false,
                },
            }
        }
    }

    async fn pump(
        &mut self,
        connection: Box<dyn Connection>,
        mut link_rx: mpsc::Receiver<LinkEvent>,
    ) -> Exit {
        let policy = connection.heartbeat();
        let budget = policy.incoming.unwrap_or_default() * self.config.heartbeat_tolerance.max(1);
        let mut outgoing = policy.outgoing.map(heartbeat_interval);
        let mut watchdog = policy.incoming.map(heartbeat_interval);
        let mut last_seen = Instant::now();

        let exit = loop {
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut self.shutdown_rx) => break Exit::Shutdown,

                event = link_rx.recv() => match event {
                    Some(LinkEvent::Message { id, payload }) => {
                        last_seen = Instant::now();
                        if !self.recent.first_sighting(id.as_deref()) {
                            debug!(room = %self.room, ?id, "Dropping redelivered message");
                        } else if self.event_tx.send(TransportEvent::Message(payload)).await.is_err() {
                            break Exit::Shutdown;
                        }
                    }
                    Some(LinkEvent::Heartbeat) => last_seen = Instant::now(),
                    Some(LinkEvent::Error(reason)) => {
                        break Exit::Lost(TransportError::Io(anyhow::anyhow!("broker error: {}", reason)));
                    }
                    Some(LinkEvent::Disconnected) | None => break Exit::Lost(TransportError::Closed),
                },

                payload = self.publish_rx.recv() => match payload {
                    Some(payload) => {
                        if let Err(e) = connection.publish(payload).await {
                            break Exit::Lost(e);
                        }
                    }
                    None => break Exit::Shutdown,
                },

                _ = tick(&mut outgoing) => {
                    if let Err(e) = connection.send_heartbeat().await {
                        break Exit::Lost(e);
                    }
                }

                _ = tick(&mut watchdog) => {
                    if last_seen.elapsed() > budget {
                        break Exit::Lost(TransportError::HeartbeatTimeout(budget));
                    }
                }
            }
        };

        connection.close().await;
        exit
    }
}

async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn heartbeat_interval(period: Duration) -> Interval {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Bounded memory of recently delivered broker message ids.
struct RecentIds {
    capacity: usize,
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl RecentIds {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Returns `false` if `id` was already delivered within the window.
    /// Messages without an id are always delivered.
    fn first_sighting(&mut self, id: Option<&str>) -> bool {
        let Some(id) = id else {
            return true;
        };
        if self.capacity == 0 {
            return true;
        }
        if self.seen.contains(id) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.order.push_back(id.to_owned());
        self.seen.insert(id.to_owned());
        true
    }
}
