//! Duel configuration and the room phase state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of questions drawn for every round. Each player answers all of
/// them, in order, at their own pace.
pub const QUESTIONS_PER_ROUND: usize = 3;

// ---------------------------------------------------------------------------
// DuelConfig
// ---------------------------------------------------------------------------

/// Rules shared by every room a store creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuelConfig {
    /// Rounds per duel. Selection strictly alternates, so an even number
    /// gives both players the same number of picks.
    pub total_rounds: u32,

    /// Rooms older than this are evicted regardless of phase.
    pub room_ttl: Duration,

    /// The category name of the bonus topic. Selecting it forces
    /// [`BONUS_LEVEL`](quizduel_protocol::BONUS_LEVEL) and spends the
    /// selecting player's one bonus pick.
    pub bonus_topic: String,

    /// Points for a correct answer in a bonus round, whatever level the
    /// question record declares.
    pub bonus_points: u32,

    /// Capacity of each room actor's command channel. Callers wait when
    /// it is full.
    pub channel_size: usize,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            total_rounds: 6,
            room_ttl: Duration::from_secs(3600),
            bonus_topic: "10-Point Question".to_string(),
            bonus_points: 10,
            channel_size: 64,
        }
    }
}

impl DuelConfig {
    /// Returns `true` if `topic` names the bonus category.
    pub fn is_bonus_topic(&self, topic: &str) -> bool {
        topic == self.bonus_topic
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// Where a room is in its duel.
///
/// ```text
///            ┌────────── select_topic ──────────┐
///            │                                  ▼
/// WaitingForTopicSelection ◄── round done ── InProgress
///            │                                  │
///            └──(abandoned)──► Finished ◄───────┘ (last round done / abandoned)
/// ```
///
/// - **WaitingForTopicSelection**: only the player holding the turn may
///   pick a topic. Initial phase, and re-entered after every round but
///   the last.
/// - **InProgress**: both players answer the round's questions
///   independently.
/// - **Finished**: terminal. Only the result can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    WaitingForTopicSelection,
    InProgress,
    Finished,
}

impl RoomPhase {
    /// Returns `true` if a topic selection may be submitted.
    pub fn is_accepting_selection(&self) -> bool {
        matches!(self, Self::WaitingForTopicSelection)
    }

    /// Returns `true` if answers may be submitted.
    pub fn is_answering(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// Returns `true` once the duel is over.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Returns `true` if moving to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        use RoomPhase::*;
        matches!(
            (self, target),
            (WaitingForTopicSelection, InProgress)
                | (WaitingForTopicSelection, Finished)
                | (InProgress, WaitingForTopicSelection)
                | (InProgress, Finished)
        )
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForTopicSelection => {
                write!(f, "WaitingForTopicSelection")
            }
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
