use crate::presence::participant::{Participant, TrackHandle};
use crate::presence::presence_provider::PresenceProvider;
use duet_core::MemberId;
use tokio::sync::watch;
use tracing::{debug, warn};

/// In-process presence set fed by whatever owns the media session.
pub struct LivePresence {
    tx: watch::Sender<Vec<Participant>>,
}

impl Default for LivePresence {
    fn default() -> Self {
        Self::new()
    }
}

impl LivePresence {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self { tx }
    }

    pub fn with_participants(participants: Vec<Participant>) -> Self {
        let presence = Self::new();
        presence.replace(participants);
        presence
    }

    /// Adds or updates a participant, keyed by member id. Returns `false` if
    /// the nickname already belongs to another member.
    pub fn join(&self, participant: Participant) -> bool {
        let mut accepted = true;
        self.tx.send_modify(|list| {
            if list
                .iter()
                .any(|p| p.nickname == participant.nickname && p.member_id != participant.member_id)
            {
                warn!(nickname = %participant.nickname, "Nickname already taken; join ignored");
                accepted = false;
                return;
            }
            debug!(member = %participant.member_id, nickname = %participant.nickname, "Participant joined");
            match list.iter_mut().find(|p| p.member_id == participant.member_id) {
                Some(existing) => *existing = participant,
                None => list.push(participant),
            }
        });
        accepted
    }

    pub fn leave(&self, member: MemberId) -> Option<Participant> {
        let mut removed = None;
        self.tx.send_if_modified(|list| {
            let index = list.iter().position(|p| p.member_id == member);
            removed = index.map(|i| list.remove(i));
            removed.is_some()
        });
        if removed.is_some() {
            debug!(member = %member, "Participant left");
        }
        removed
    }

    pub fn replace(&self, participants: Vec<Participant>) {
        self.tx.send_replace(participants);
    }

    pub fn set_track(&self, member: MemberId, track: Option<TrackHandle>) -> bool {
        self.tx.send_if_modified(|list| match list.iter_mut().find(|p| p.member_id == member) {
            Some(participant) if participant.video != track => {
                participant.video = track;
                true
            }
            _ => false,
        })
    }

    pub fn snapshot(&self) -> Vec<Participant> {
        self.tx.borrow().clone()
    }
}

impl PresenceProvider for LivePresence {
    fn subscribe(&self) -> watch::Receiver<Vec<Participant>> {
        self.tx.subscribe()
    }

    fn video_track(&self, member: MemberId) -> Option<TrackHandle> {
        self.tx
            .borrow()
            .iter()
            .find(|p| p.member_id == member)
            .and_then(|p| p.video.clone())
    }
}
