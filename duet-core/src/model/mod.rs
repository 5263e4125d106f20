mod member;
mod phase;
mod room;
mod round;
mod tally;

pub use member::{Category, MemberId};
pub use phase::{ParsePhaseError, Phase};
pub use room::RoomId;
pub use round::{Choice, ChoiceNum, ChoiceRecord, ChoiceSubmission, InvalidChoiceNum, Round, RoundId};
pub use tally::ResultTally;
