use async_trait::async_trait;
use bytes::Bytes;
use duet_core::{ChoiceRecord, ChoiceSubmission, ClientEvent, RoomId, Round, ServerEvent};
use duet_room::TransportError;
use duet_room::transport::{Connection, Connector, HeartbeatPolicy, LinkEvent, TransportConfig};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{Notify, mpsc};

/// Outcome of one scripted connect attempt.
#[derive(Clone)]
pub enum ConnectBehavior {
    Succeed,
    Fail,
    Reject(String),
    /// Succeeds once the gate is notified.
    Gate(Arc<Notify>),
}

/// In-memory pub/sub broker shared by every connection it hands out.
///
/// Every live link receives every broadcast, including the publisher's own
/// link. With echo enabled the broker answers client events the way the real
/// game server does.
#[derive(Clone)]
pub struct MockBroker {
    state: Arc<BrokerState>,
}

struct BrokerState {
    script: Mutex<VecDeque<ConnectBehavior>>,
    attempts: AtomicUsize,
    next_link: AtomicU64,
    next_message: AtomicU64,
    links: Mutex<Vec<(u64, mpsc::Sender<LinkEvent>)>>,
    published: Mutex<Vec<ClientEvent>>,
    submissions: Mutex<Vec<ChoiceSubmission>>,
    echo_rounds: Mutex<Option<Vec<Round>>>,
    heartbeat: Mutex<HeartbeatPolicy>,
}

impl MockBroker {
    /// A broker that records publishes but never answers them.
    pub fn new() -> Self {
        Self {
            state: Arc::new(BrokerState {
                script: Mutex::new(VecDeque::new()),
                attempts: AtomicUsize::new(0),
                next_link: AtomicU64::new(1),
                next_message: AtomicU64::new(1),
                links: Mutex::new(Vec::new()),
                published: Mutex::new(Vec::new()),
                submissions: Mutex::new(Vec::new()),
                echo_rounds: Mutex::new(None),
                heartbeat: Mutex::new(HeartbeatPolicy {
                    outgoing: None,
                    incoming: None,
                }),
            }),
        }
    }

    /// A broker that answers client events, handing out `rounds` on game start.
    pub fn echoing(rounds: Vec<Round>) -> Self {
        let broker = Self::new();
        *broker.state.echo_rounds.lock().unwrap() = Some(rounds);
        broker
    }

    pub fn connector(&self) -> Arc<dyn Connector> {
        Arc::new(MockConnector {
            state: Arc::clone(&self.state),
        })
    }

    /// Queues outcomes for the next connect attempts. Unscripted attempts succeed.
    pub fn script(&self, behaviors: impl IntoIterator<Item = ConnectBehavior>) {
        self.state.script.lock().unwrap().extend(behaviors);
    }

    pub fn set_heartbeat(&self, policy: HeartbeatPolicy) {
        *self.state.heartbeat.lock().unwrap() = policy;
    }

    pub fn attempts(&self) -> usize {
        self.state.attempts.load(Ordering::SeqCst)
    }

    pub fn live_links(&self) -> usize {
        self.state.links.lock().unwrap().len()
    }

    pub fn published(&self) -> Vec<ClientEvent> {
        self.state.published.lock().unwrap().clone()
    }

    /// Broadcasts a raw payload to every live link. Returns how many received it.
    pub async fn inject(&self, payload: impl Into<Bytes>) -> usize {
        self.state.broadcast(payload.into(), None).await
    }

    /// Broadcasts with a fixed broker message id, as a redelivery would.
    pub async fn inject_with_id(&self, id: &str, payload: impl Into<Bytes>) -> usize {
        self.state.broadcast(payload.into(), Some(id)).await
    }

    /// Simulates the broker dropping every connection.
    pub async fn drop_links(&self) {
        let links: Vec<_> = std::mem::take(&mut *self.state.links.lock().unwrap());
        for (_, tx) in links {
            let _ = tx.send(LinkEvent::Disconnected).await;
        }
    }

    pub async fn wait_for_published(&self, count: usize, timeout_ms: u64) -> bool {
        wait_until(timeout_ms, || self.published().len() >= count).await
    }

    pub async fn wait_for_links(&self, count: usize, timeout_ms: u64) -> bool {
        wait_until(timeout_ms, || self.live_links() >= count).await
    }

    pub async fn wait_for_attempts(&self, count: usize, timeout_ms: u64) -> bool {
        wait_until(timeout_ms, || self.attempts() >= count).await
    }
}

impl Default for MockBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerState {
    async fn broadcast(&self, payload: Bytes, fixed_id: Option<&str>) -> usize {
        let links: Vec<_> = self
            .links
            .lock()
            .unwrap()
            .iter()
            .map(|(_, tx)| tx.clone())
            .collect();

        let mut delivered = 0;
        for tx in links {
            let id = match fixed_id {
                Some(id) => id.to_owned(),
                None => format!("msg-{}", self.next_message.fetch_add(1, Ordering::SeqCst)),
            };
            let event = LinkEvent::Message {
                id: Some(id),
                payload: payload.clone(),
            };
            if tx.send(event).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    fn reply_to(&self, event: ClientEvent) -> Option<ServerEvent> {
        let rounds = self.echo_rounds.lock().unwrap().clone()?;

        let reply = match event {
            ClientEvent::RoomStart => ServerEvent::MeetingStarted,
            ClientEvent::GameStart => ServerEvent::GameStarted { rounds },
            ClientEvent::ChoiceStart => ServerEvent::ChoicePhaseStarted,
            ClientEvent::Submit(submission) => {
                self.submissions.lock().unwrap().push(submission);
                ServerEvent::ChoiceSubmitted {
                    echo: serde_json::to_value(submission).unwrap_or_default(),
                }
            }
            ClientEvent::GetResult => {
                let records = self
                    .submissions
                    .lock()
                    .unwrap()
                    .iter()
                    .map(|s| ChoiceRecord {
                        balance_game_id: s.balance_game_id,
                        balance_game_choice_id: 0,
                        choice_content: rounds
                            .iter()
                            .find(|r| r.id() == s.balance_game_id)
                            .map(|r| r.choice(s.choice_num).content.clone())
                            .unwrap_or_default(),
                        choice_num: s.choice_num,
                        member_id: s.member_id,
                        video_room_id: None,
                    })
                    .collect();
                ServerEvent::ResultRetrieved { records }
            }
        };
        Some(reply)
    }
}

struct MockConnector {
    state: Arc<BrokerState>,
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        room: RoomId,
        _config: &TransportConfig,
        event_tx: mpsc::Sender<LinkEvent>,
    ) -> Result<Box<dyn Connection>, TransportError> {
        let attempt = self.state.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let behavior = self
            .state
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConnectBehavior::Succeed);
        tracing::info!("[MockBroker] connect attempt {} for room {}", attempt, room);

        match behavior {
            ConnectBehavior::Succeed => {}
            ConnectBehavior::Fail => {
                return Err(TransportError::Connect(anyhow::anyhow!("connection refused")));
            }
            ConnectBehavior::Reject(reason) => return Err(TransportError::Rejected(reason)),
            ConnectBehavior::Gate(gate) => gate.notified().await,
        }

        let id = self.state.next_link.fetch_add(1, Ordering::SeqCst);
        self.state.links.lock().unwrap().push((id, event_tx));
        Ok(Box::new(MockConnection {
            id,
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockConnection {
    id: u64,
    state: Arc<BrokerState>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn publish(&self, payload: Bytes) -> Result<(), TransportError> {
        let event = ClientEvent::decode(&payload).map_err(|e| TransportError::Io(e.into()))?;
        tracing::info!("[MockBroker] link {} published {:?}", self.id, event);
        self.state.published.lock().unwrap().push(event);

        if let Some(reply) = self.state.reply_to(event) {
            self.state.broadcast(Bytes::from(reply.encode()), None).await;
        }
        Ok(())
    }

    async fn send_heartbeat(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn close(&self) {
        self.state
            .links
            .lock()
            .unwrap()
            .retain(|(id, _)| *id != self.id);
    }

    fn heartbeat(&self) -> HeartbeatPolicy {
        *self.state.heartbeat.lock().unwrap()
    }
}

async fn wait_until(timeout_ms: u64, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    loop {
        if condition() {
            return true;
        }
        if start.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
