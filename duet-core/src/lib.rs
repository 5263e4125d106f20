pub mod model;
pub mod protocol;

pub use model::{
    Category, Choice, ChoiceNum, ChoiceRecord, ChoiceSubmission, MemberId, Phase, ResultTally,
    RoomId, Round, RoundId,
};
pub use protocol::{ClientEvent, ProtocolError, ServerEvent};
