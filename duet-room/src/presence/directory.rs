use crate::presence::participant::Participant;
use duet_core::{Category, MemberId};

/// Read-only view over one presence snapshot.
#[derive(Debug, Clone, Default)]
pub struct ParticipantDirectory {
    participants: Vec<Participant>,
}

impl ParticipantDirectory {
    pub fn new(participants: Vec<Participant>) -> Self {
        Self { participants }
    }

    /// The first participant flagged as host, in presence order.
    pub fn host(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.is_host)
    }

    pub fn is_host(&self, member: MemberId) -> bool {
        self.get(member).is_some_and(|p| p.is_host)
    }

    pub fn get(&self, member: MemberId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.member_id == member)
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Participant> {
        self.participants
            .iter()
            .filter(move |p| p.category == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

impl From<Vec<Participant>> for ParticipantDirectory {
    fn from(participants: Vec<Participant>) -> Self {
        Self::new(participants)
    }
}
