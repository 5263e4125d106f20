use crate::model::member::MemberId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier of one round (`balanceGameId` on the wire). Monotonic per room.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct RoundId(pub u64);

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of the two scenarios a participant picked.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(try_from = "u8", into = "u8")]
pub enum ChoiceNum {
    First,
    Second,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("choice number must be 1 or 2, got {0}")]
pub struct InvalidChoiceNum(pub u8);

impl TryFrom<u8> for ChoiceNum {
    type Error = InvalidChoiceNum;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ChoiceNum::First),
            2 => Ok(ChoiceNum::Second),
            other => Err(InvalidChoiceNum(other)),
        }
    }
}

impl From<ChoiceNum> for u8 {
    fn from(value: ChoiceNum) -> Self {
        match value {
            ChoiceNum::First => 1,
            ChoiceNum::Second => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub choice_num: ChoiceNum,
    #[serde(default, alias = "choiceContent")]
    pub content: String,
}

/// A two-choice scenario presented to every participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub balance_game_id: RoundId,
    pub content: String,
    pub scenario1: Choice,
    pub scenario2: Choice,
}

impl Round {
    pub fn id(&self) -> RoundId {
        self.balance_game_id
    }

    pub fn choice(&self, num: ChoiceNum) -> &Choice {
        match num {
            ChoiceNum::First => &self.scenario1,
            ChoiceNum::Second => &self.scenario2,
        }
    }
}

/// Outbound pick for a round. At most one per member per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceSubmission {
    pub balance_game_id: RoundId,
    pub member_id: MemberId,
    pub choice_num: ChoiceNum,
}

/// One stored pick as returned by the result query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceRecord {
    pub balance_game_id: RoundId,
    #[serde(default)]
    pub balance_game_choice_id: u64,
    #[serde(default)]
    pub choice_content: String,
    pub choice_num: ChoiceNum,
    pub member_id: MemberId,
    #[serde(default)]
    pub video_room_id: Option<RoomId>,
}
