use bytes::Bytes;

/// Passive connection indicator exposed to the room view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Closed,
    /// The broker refused the session; no further attempts are made.
    Failed { reason: String },
}

/// What the adapter hands to the room, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Status(ConnectionStatus),
    Message(Bytes),
}

/// Raw events produced by a single live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Message { id: Option<String>, payload: Bytes },
    Heartbeat,
    /// Broker-reported error after the session was established.
    Error(String),
    Disconnected,
}
