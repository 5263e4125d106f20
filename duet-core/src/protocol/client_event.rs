use crate::model::ChoiceSubmission;
use crate::protocol::error::ProtocolError;
use serde_json::{Value, json};

/// Closed set of outbound events a room member publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    RoomStart,
    GameStart,
    ChoiceStart,
    Submit(ChoiceSubmission),
    GetResult,
}

impl ClientEvent {
    pub fn to_json(&self) -> Value {
        match self {
            ClientEvent::RoomStart => json!({ "isRoomStart": true }),
            ClientEvent::GameStart => json!({ "isGameStart": true }),
            ClientEvent::ChoiceStart => json!({ "isChoiceStart": true }),
            ClientEvent::GetResult => json!({ "getResult": true }),
            ClientEvent::Submit(submission) => json!(submission),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_json().to_string().into_bytes()
    }

    /// Inverse of [`ClientEvent::encode`]; used by brokers and test doubles.
    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_slice(payload).map_err(ProtocolError::InvalidJson)?;
        if !value.is_object() {
            return Err(ProtocolError::NotAnObject);
        }

        let flag = |name: &str| value.get(name).and_then(Value::as_bool).unwrap_or(false);
        if flag("isRoomStart") {
            return Ok(ClientEvent::RoomStart);
        }
        if flag("isGameStart") {
            return Ok(ClientEvent::GameStart);
        }
        if flag("isChoiceStart") {
            return Ok(ClientEvent::ChoiceStart);
        }
        if flag("getResult") {
            return Ok(ClientEvent::GetResult);
        }

        serde_json::from_value::<ChoiceSubmission>(value)
            .map(ClientEvent::Submit)
            .map_err(|_| ProtocolError::UnknownClientEvent)
    }
}
