mod room;
mod room_command;
mod room_handle;
mod session;
mod snapshot;
mod state_machine;

pub use room::*;
pub use room_command::*;
pub use room_handle::*;
pub use session::*;
pub use snapshot::*;
pub use state_machine::*;
