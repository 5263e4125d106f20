mod directory;
mod live_presence;
mod participant;
mod presence_provider;

pub use directory::ParticipantDirectory;
pub use live_presence::LivePresence;
pub use participant::{Participant, TrackHandle};
pub use presence_provider::PresenceProvider;
