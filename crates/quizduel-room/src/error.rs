//! Error types for the room layer.

use quizduel_protocol::{PlayerId, RoomId};

use crate::RoomPhase;

/// Why a topic selection was refused. The turn does not advance; the
/// selecting player must submit again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionRejection {
    #[error("unknown topic {0:?}")]
    UnknownTopic(String),

    #[error("topic {topic:?} has no level {level}")]
    UnknownLevel { topic: String, level: u8 },

    /// The player already picked this (topic, level) earlier in the room.
    #[error("combination {topic:?} level {level} already used")]
    CombinationUsed { topic: String, level: u8 },

    /// The player already spent their bonus pick.
    #[error("bonus question already used")]
    BonusUsed,

    #[error(
        "only {available} questions for {topic:?} level {level}, need {required}"
    )]
    InsufficientQuestions {
        topic: String,
        level: u8,
        available: usize,
        required: usize,
    },
}

/// Why an answer was refused. Nothing about the room changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnswerRejection {
    #[error("option {option} out of range (question has {options} options)")]
    OptionOutOfRange { option: usize, options: usize },

    /// The player already answered every question of this round.
    #[error("no unanswered question left this round")]
    NothingToAnswer,
}

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (never created, or already removed).
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room outlived its TTL. Treated exactly like `NotFound`.
    #[error("room {0} expired")]
    Expired(RoomId),

    /// The player is not one of the room's two players.
    #[error("player {0} not in room {1}")]
    NotMember(PlayerId, RoomId),

    /// The player already belongs to a room that isn't finished.
    #[error("player {0} is already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// A room needs two distinct players.
    #[error("player {0} cannot duel themselves")]
    SamePlayer(PlayerId),

    /// Someone other than the turn holder tried to select.
    #[error("not {0}'s turn to select in room {1}")]
    NotYourTurn(PlayerId, RoomId),

    /// The room's phase doesn't allow this operation, e.g. answering
    /// while waiting for a selection, or anything after `Finished`.
    #[error("cannot {operation} in room {room_id} while {phase}")]
    InvalidPhase {
        room_id: RoomId,
        phase: RoomPhase,
        operation: &'static str,
    },

    #[error("invalid selection: {0}")]
    InvalidSelection(#[from] SelectionRejection),

    #[error("invalid answer: {0}")]
    InvalidAnswer(#[from] AnswerRejection),

    /// The room actor's command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

impl RoomError {
    /// Returns `true` for every error a caller should treat as "no such
    /// room for you": unknown, expired, not a member, or gone.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Expired(_)
                | Self::NotMember(..)
                | Self::Unavailable(_)
        )
    }
}
