use crate::presence::{ParticipantDirectory, PresenceProvider, TrackHandle};
use duet_core::{Category, MemberId};
use tracing::warn;

/// One presentation tile of the video grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Occupied {
        member_id: MemberId,
        display_name: String,
        is_host: bool,
    },
    Vacant,
}

impl Slot {
    pub fn is_vacant(&self) -> bool {
        matches!(self, Slot::Vacant)
    }

    pub fn member_id(&self) -> Option<MemberId> {
        match self {
            Slot::Occupied { member_id, .. } => Some(*member_id),
            Slot::Vacant => None,
        }
    }

    /// Resolves the media track at render time; tracks are never cached in the layout.
    pub fn track(&self, presence: &dyn PresenceProvider) -> Option<TrackHandle> {
        self.member_id().and_then(|member| presence.video_track(member))
    }
}

/// Maps the participants of one category onto `slots` tiles, in directory order,
/// padding with vacant tiles.
///
/// Extra participants beyond `slots` are still rendered: the result is never
/// truncated, so its length is `max(slots, participants)`.
pub fn allocate(directory: &ParticipantDirectory, category: Category, slots: usize) -> Vec<Slot> {
    let mut tiles: Vec<Slot> = directory
        .in_category(category)
        .map(|p| Slot::Occupied {
            member_id: p.member_id,
            display_name: p.nickname.clone(),
            is_host: p.is_host,
        })
        .collect();

    if tiles.len() > slots {
        warn!(
            %category,
            participants = tiles.len(),
            slots,
            "More participants than slots; rendering overflow"
        );
    }
    tiles.resize(slots.max(tiles.len()), Slot::Vacant);
    tiles
}

/// Both category columns of the video grid.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VideoLayout {
    pub male: Vec<Slot>,
    pub female: Vec<Slot>,
}

impl VideoLayout {
    pub fn build(directory: &ParticipantDirectory, slots_per_category: usize) -> Self {
        Self {
            male: allocate(directory, Category::Male, slots_per_category),
            female: allocate(directory, Category::Female, slots_per_category),
        }
    }

    pub fn column(&self, category: Category) -> &[Slot] {
        match category {
            Category::Male => &self.male,
            Category::Female => &self.female,
        }
    }
}
