mod adapter;
mod connector;
mod event_sink;
pub mod stomp;
mod transport_config;
mod transport_event;

pub use adapter::TransportAdapter;
pub use connector::{Connection, Connector, HeartbeatPolicy};
pub use event_sink::EventSink;
pub use stomp::StompConnector;
pub use transport_config::TransportConfig;
pub use transport_event::{ConnectionStatus, LinkEvent, TransportEvent};
