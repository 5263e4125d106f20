use duet_core::{Category, MemberId};
use std::fmt;
use std::sync::Arc;

/// Opaque reference to a participant's live media track.
///
/// Owned by the presence provider; the room only carries it through to whoever
/// renders the slot.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TrackHandle(Arc<str>);

impl TrackHandle {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TrackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrackHandle({})", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub member_id: MemberId,
    pub nickname: String,
    pub category: Category,
    pub is_host: bool,
    pub video: Option<TrackHandle>,
}

impl Participant {
    pub fn new(member_id: MemberId, nickname: impl Into<String>, category: Category) -> Self {
        Self {
            member_id,
            nickname: nickname.into(),
            category,
            is_host: false,
            video: None,
        }
    }

    pub fn host(mut self) -> Self {
        self.is_host = true;
        self
    }

    pub fn with_video(mut self, track: TrackHandle) -> Self {
        self.video = Some(track);
        self
    }
}
