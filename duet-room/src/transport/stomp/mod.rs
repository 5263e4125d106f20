//! STOMP 1.2 over WebSocket, the wire format spoken by the room broker.

mod frame;
mod stomp_connector;

pub use frame::{Command, Frame, FrameError, Incoming};
pub use stomp_connector::{StompConnector, negotiate_heartbeat};
