pub mod mock_broker;
pub mod stomp_broker;

pub use mock_broker::*;
pub use recording_sink::*;
pub use room_fixtures::*;
pub use stomp_broker::*;
