mod config;
mod error;
mod layout;
mod presence;
mod room;
mod timer;
pub mod transport;

pub use config::*;
pub use error::*;
pub use layout::*;
pub use presence::*;
pub use room::*;
pub use timer::*;
pub use transport::{
    ConnectionStatus, Connector, EventSink, StompConnector, TransportAdapter, TransportConfig,
    TransportEvent,
};
