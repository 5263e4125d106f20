use crate::config::{Credential, parse_millis};
use crate::error::ConfigError;
use duet_core::RoomId;
use std::time::Duration;

/// Connection settings for the room channel.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub broker_url: String,
    pub credential: Option<Credential>,
    pub publish_prefix: String,
    pub subscribe_prefix: String,
    pub reconnect_delay: Duration,
    pub heartbeat_outgoing: Duration,
    pub heartbeat_incoming: Duration,
    /// Missed-heartbeat budget, as a multiple of the incoming interval.
    pub heartbeat_tolerance: u32,
    pub connect_timeout: Duration,
    pub event_capacity: usize,
    /// How many recent broker message ids are remembered for duplicate suppression.
    pub dedup_window: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            broker_url: "ws://localhost:8080/stomp/chat".to_owned(),
            credential: None,
            publish_prefix: "/pub".to_owned(),
            subscribe_prefix: "/sub".to_owned(),
            reconnect_delay: Duration::from_millis(5000),
            heartbeat_outgoing: Duration::from_millis(4000),
            heartbeat_incoming: Duration::from_millis(4000),
            heartbeat_tolerance: 2,
            connect_timeout: Duration::from_secs(10),
            event_capacity: 256,
            dedup_window: 256,
        }
    }
}

impl TransportConfig {
    pub fn new(broker_url: impl Into<String>) -> Self {
        Self {
            broker_url: broker_url.into(),
            ..Default::default()
        }
    }

    /// Reads `DUET_BROKER_URL` (required) plus the optional
    /// `DUET_RECONNECT_DELAY_MS` and `DUET_HEARTBEAT_MS` overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let broker_url =
            lookup("DUET_BROKER_URL").ok_or_else(|| ConfigError::MissingVar("DUET_BROKER_URL".into()))?;
        let mut config = Self::new(broker_url);

        if let Some(value) = lookup("DUET_RECONNECT_DELAY_MS") {
            config.reconnect_delay = parse_millis("DUET_RECONNECT_DELAY_MS", &value)?;
        }
        if let Some(value) = lookup("DUET_HEARTBEAT_MS") {
            let interval = parse_millis("DUET_HEARTBEAT_MS", &value)?;
            config.heartbeat_outgoing = interval;
            config.heartbeat_incoming = interval;
        }
        Ok(config)
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_heartbeat(mut self, outgoing: Duration, incoming: Duration) -> Self {
        self.heartbeat_outgoing = outgoing;
        self.heartbeat_incoming = incoming;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn publish_destination(&self, room: RoomId) -> String {
        format!("{}/{}", self.publish_prefix, room.topic())
    }

    pub fn subscribe_destination(&self, room: RoomId) -> String {
        format!("{}/{}", self.subscribe_prefix, room.topic())
    }
}
