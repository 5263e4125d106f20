use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload has no `message` discriminator")]
    MissingDiscriminator,

    #[error("malformed `{message}` payload: {source}")]
    Malformed {
        message: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unrecognized outbound payload")]
    UnknownClientEvent,
}
