use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stage of the room's game lifecycle.
///
/// The regular path is `Wait → Active → Loading → Game → Play → ResultLoading1 →
/// ResultLoading2 → Result`, after which the room either cycles back to `Play`
/// for the next round or stops at `End`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Wait,
    Active,
    Loading,
    Game,
    Play,
    ResultLoading1,
    ResultLoading2,
    Result,
    End,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Wait => "wait",
            Phase::Active => "active",
            Phase::Loading => "loading",
            Phase::Game => "game",
            Phase::Play => "play",
            Phase::ResultLoading1 => "resultLoading1",
            Phase::ResultLoading2 => "resultLoading2",
            Phase::Result => "result",
            Phase::End => "end",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown phase `{0}`")]
pub struct ParsePhaseError(pub String);

impl FromStr for Phase {
    type Err = ParsePhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let phase = match s {
            "wait" => Phase::Wait,
            "active" => Phase::Active,
            "loading" => Phase::Loading,
            "game" => Phase::Game,
            "play" => Phase::Play,
            "resultLoading1" => Phase::ResultLoading1,
            "resultLoading2" => Phase::ResultLoading2,
            "result" => Phase::Result,
            "end" => Phase::End,
            other => return Err(ParsePhaseError(other.to_owned())),
        };
        Ok(phase)
    }
}
