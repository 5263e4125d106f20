use crate::error::TransportError;
use crate::transport::transport_config::TransportConfig;
use crate::transport::transport_event::LinkEvent;
use async_trait::async_trait;
use bytes::Bytes;
use duet_core::RoomId;
use std::time::Duration;
use tokio::sync::mpsc;

/// Negotiated heartbeat intervals of a live connection. `None` disables that direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatPolicy {
    pub outgoing: Option<Duration>,
    pub incoming: Option<Duration>,
}

impl HeartbeatPolicy {
    pub fn from_config(config: &TransportConfig) -> Self {
        let non_zero = |d: Duration| (!d.is_zero()).then_some(d);
        Self {
            outgoing: non_zero(config.heartbeat_outgoing),
            incoming: non_zero(config.heartbeat_incoming),
        }
    }
}

/// Opens connections to the message broker.
///
/// A connection pushes everything it receives into `event_tx`; once the
/// receiving side is dropped the connection must stop delivering.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(
        &self,
        room: RoomId,
        config: &TransportConfig,
        event_tx: mpsc::Sender<LinkEvent>,
    ) -> Result<Box<dyn Connection>, TransportError>;
}

/// One established, subscribed session with the broker.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn publish(&self, payload: Bytes) -> Result<(), TransportError>;

    async fn send_heartbeat(&self) -> Result<(), TransportError>;

    async fn close(&self);

    fn heartbeat(&self) -> HeartbeatPolicy;
}
