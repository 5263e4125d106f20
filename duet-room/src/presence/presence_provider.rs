use crate::presence::participant::{Participant, TrackHandle};
use duet_core::MemberId;
use tokio::sync::watch;

/// Source of the live participant set.
///
/// Updates arrive independently of game messages. Consumers read snapshots and
/// never assume they line up with the room phase.
pub trait PresenceProvider: Send + Sync {
    fn subscribe(&self) -> watch::Receiver<Vec<Participant>>;

    /// Current media track of `member`, looked up at render time.
    fn video_track(&self, member: MemberId) -> Option<TrackHandle>;
}
