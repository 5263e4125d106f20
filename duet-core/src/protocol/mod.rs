mod client_event;
mod error;
mod server_event;

pub use client_event::ClientEvent;
pub use error::ProtocolError;
pub use server_event::{EventKind, ServerEvent};
