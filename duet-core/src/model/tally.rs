use crate::model::member::MemberId;
use crate::model::round::{ChoiceNum, ChoiceRecord, RoundId};
use std::collections::BTreeMap;

/// Aggregated picks: round → member → choice.
///
/// A tally is always rebuilt from a complete result payload; it is never merged
/// with a previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTally {
    rounds: BTreeMap<RoundId, BTreeMap<MemberId, ChoiceNum>>,
}

impl ResultTally {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ChoiceRecord>,
    {
        let mut rounds: BTreeMap<RoundId, BTreeMap<MemberId, ChoiceNum>> = BTreeMap::new();
        for record in records {
            rounds
                .entry(record.balance_game_id)
                .or_default()
                .insert(record.member_id, record.choice_num);
        }
        Self { rounds }
    }

    pub fn round(&self, round: RoundId) -> Option<&BTreeMap<MemberId, ChoiceNum>> {
        self.rounds.get(&round)
    }

    pub fn choice_of(&self, round: RoundId, member: MemberId) -> Option<ChoiceNum> {
        self.rounds.get(&round)?.get(&member).copied()
    }

    /// Number of members who picked `choice` in `round`.
    pub fn count(&self, round: RoundId, choice: ChoiceNum) -> usize {
        self.rounds
            .get(&round)
            .map(|picks| picks.values().filter(|c| **c == choice).count())
            .unwrap_or(0)
    }

    pub fn rounds(&self) -> impl Iterator<Item = RoundId> + '_ {
        self.rounds.keys().copied()
    }

    /// Total number of (round, member) entries.
    pub fn len(&self) -> usize {
        self.rounds.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}
