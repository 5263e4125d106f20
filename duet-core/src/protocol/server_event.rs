use crate::model::{ChoiceRecord, Round};
use crate::protocol::error::ProtocolError;
use serde::de::{DeserializeOwned, Error as _};
use serde_json::{Map, Value, json};

/// Kind of broker-to-client event, keyed by the `message` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MeetingStarted,
    GameStarted,
    ChoicePhaseStarted,
    ChoiceSubmitted,
    ResultRetrieved,
}

impl EventKind {
    const ALL: [EventKind; 5] = [
        EventKind::MeetingStarted,
        EventKind::GameStarted,
        EventKind::ChoicePhaseStarted,
        EventKind::ChoiceSubmitted,
        EventKind::ResultRetrieved,
    ];

    pub fn discriminator(&self) -> &'static str {
        match self {
            EventKind::MeetingStarted => "meeting room start succeeded",
            EventKind::GameStarted => "game start succeeded",
            EventKind::ChoicePhaseStarted => "choice phase started",
            EventKind::ChoiceSubmitted => "choice submission completed",
            EventKind::ResultRetrieved => "game result retrieved",
        }
    }

    /// Discriminators emitted by the localized deployment of the broker.
    fn legacy_discriminator(&self) -> &'static str {
        match self {
            EventKind::MeetingStarted => "미팅룸 시작을 성공했습니다.",
            EventKind::GameStarted => "게임 시작을 성공했습니다.",
            EventKind::ChoicePhaseStarted => "선택지 선택을 시작했습니다.",
            EventKind::ChoiceSubmitted => "선택을 완료했습니다.",
            EventKind::ResultRetrieved => "게임 결과를 조회했습니다.",
        }
    }

    pub fn from_discriminator(message: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.discriminator() == message || kind.legacy_discriminator() == message)
    }
}

/// Closed set of inbound events understood by the room.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    MeetingStarted,
    GameStarted { rounds: Vec<Round> },
    ChoicePhaseStarted,
    /// Broker acknowledgement of a submission. Carries the echoed fields as-is.
    ChoiceSubmitted { echo: Value },
    ResultRetrieved { records: Vec<ChoiceRecord> },
}

impl ServerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ServerEvent::MeetingStarted => EventKind::MeetingStarted,
            ServerEvent::GameStarted { .. } => EventKind::GameStarted,
            ServerEvent::ChoicePhaseStarted => EventKind::ChoicePhaseStarted,
            ServerEvent::ChoiceSubmitted { .. } => EventKind::ChoiceSubmitted,
            ServerEvent::ResultRetrieved { .. } => EventKind::ResultRetrieved,
        }
    }

    /// Decodes one inbound payload.
    ///
    /// Returns `Ok(None)` when the discriminator is well-formed but unknown, so
    /// newer brokers can add events without breaking older rooms.
    pub fn decode(payload: &[u8]) -> Result<Option<Self>, ProtocolError> {
        let value: Value = serde_json::from_slice(payload).map_err(ProtocolError::InvalidJson)?;
        let Value::Object(mut fields) = value else {
            return Err(ProtocolError::NotAnObject);
        };
        let Some(Value::String(message)) = fields.remove("message") else {
            return Err(ProtocolError::MissingDiscriminator);
        };
        let Some(kind) = EventKind::from_discriminator(&message) else {
            return Ok(None);
        };

        let event = match kind {
            EventKind::MeetingStarted => ServerEvent::MeetingStarted,
            EventKind::GameStarted => ServerEvent::GameStarted {
                rounds: take_result(&mut fields, kind)?,
            },
            EventKind::ChoicePhaseStarted => ServerEvent::ChoicePhaseStarted,
            EventKind::ChoiceSubmitted => ServerEvent::ChoiceSubmitted {
                echo: Value::Object(fields),
            },
            EventKind::ResultRetrieved => ServerEvent::ResultRetrieved {
                records: take_result(&mut fields, kind)?,
            },
        };
        Ok(Some(event))
    }

    pub fn to_json(&self) -> Value {
        let message = self.kind().discriminator();
        match self {
            ServerEvent::MeetingStarted | ServerEvent::ChoicePhaseStarted => {
                json!({ "message": message })
            }
            ServerEvent::GameStarted { rounds } => json!({ "message": message, "result": rounds }),
            ServerEvent::ResultRetrieved { records } => {
                json!({ "message": message, "result": records })
            }
            ServerEvent::ChoiceSubmitted { echo } => {
                let mut fields = match echo {
                    Value::Object(fields) => fields.clone(),
                    Value::Null => Map::new(),
                    other => {
                        let mut fields = Map::new();
                        fields.insert("result".to_owned(), other.clone());
                        fields
                    }
                };
                fields.insert("message".to_owned(), Value::from(message));
                Value::Object(fields)
            }
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_json().to_string().into_bytes()
    }
}

fn take_result<T: DeserializeOwned>(
    fields: &mut Map<String, Value>,
    kind: EventKind,
) -> Result<T, ProtocolError> {
    let message = kind.discriminator();
    let value = fields.remove("result").ok_or_else(|| ProtocolError::Malformed {
        message,
        source: serde_json::Error::missing_field("result"),
    })?;
    serde_json::from_value(value).map_err(|source| ProtocolError::Malformed { message, source })
}
