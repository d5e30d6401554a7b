//! Shared vocabulary for quizduel.
//!
//! This crate defines the values that every other layer passes around:
//!
//! - **Identity** ([`PlayerId`], [`RoomId`]): who is playing, and where.
//! - **Questions** ([`QuestionRecord`]): the catalog's record format.
//! - **Status** ([`StatusReport`] and friends): what a polling client is
//!   told to do next, and the payloads behind each screen.
//! - **Codec** ([`Codec`], [`JsonCodec`]): how those values become bytes.
//!
//! It knows nothing about queues, rooms, or timing.

mod codec;
mod error;
mod status;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use status::{
    AnswerOutcome, AnswerProgress, LevelChoice, MatchOutcome, MatchResult,
    NextAction, QuestionView, RoundStarted, SelectionMenu, Standing,
    StatusReport, TopicChoice,
};
pub use types::{
    BONUS_LEVEL, OPTIONS_PER_QUESTION, PlayerId, QuestionRecord, RoomId,
};
