//! The vocabulary a presentation layer polls for.
//!
//! There is no push channel to the client. Instead the client asks "what
//! now?" over and over, and the core answers with a [`StatusReport`]. The
//! remaining types here are the payloads behind each screen: the topic
//! menu, the next question, the result of an answer, and the final score.

use serde::{Deserialize, Serialize};

use crate::{PlayerId, RoomId};

// ---------------------------------------------------------------------------
// StatusReport
// ---------------------------------------------------------------------------

/// Where the client should go after a matchmaking poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    /// The caller picks this round's topic.
    SelectTopic,
    /// The opponent is picking; wait.
    WaitForSelection,
    /// A round is running; answer questions.
    AnswerQuestions,
    /// The duel is over; show the result.
    ViewResult,
}

/// The answer to a status poll.
///
/// Internally tagged, so `StatusReport::MyTurnToSelect` is
/// `{ "status": "my_turn_to_select" }` on the wire and
/// `FoundMatch` carries its fields alongside the tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusReport {
    /// Still in the matchmaking queue.
    Waiting,
    /// Paired (now or earlier) into `room_id`.
    FoundMatch {
        room_id: RoomId,
        next_action: NextAction,
    },
    MyTurnToSelect,
    WaitingForOpponentToSelect,
    /// The caller has unanswered questions in the current round.
    GoToQuestions,
    /// The caller is done with the round; the opponent is not.
    WaitingForOpponentToAnswer,
    /// The caller's answer closed the round and another round follows.
    RoundComplete,
    MatchFinished,
    /// The room is unknown, expired, or the caller is not one of its
    /// players.
    RoomNotFoundOrNotMember,
}

// ---------------------------------------------------------------------------
// Topic selection
// ---------------------------------------------------------------------------

/// One selectable level of a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChoice {
    pub level: u8,
    /// How many questions the source holds for this (topic, level).
    /// Fewer than a round's worth means the selection will be rejected.
    pub question_count: usize,
    /// The caller already picked this combination earlier in the room.
    pub used: bool,
}

/// One topic on the selection menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicChoice {
    pub topic: String,
    /// `true` for the bonus category, whose level is fixed.
    pub is_bonus: bool,
    pub levels: Vec<LevelChoice>,
}

/// Everything the selecting player needs to render the topic screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionMenu {
    pub room_id: RoomId,
    /// The round this selection will start (1-based).
    pub round: u32,
    pub total_rounds: u32,
    /// The player whose turn it is to select.
    pub turn: PlayerId,
    pub is_my_turn: bool,
    /// Whether the caller has already spent their bonus pick.
    pub bonus_used: bool,
    pub topics: Vec<TopicChoice>,
}

/// Confirmation that a topic selection started a new round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStarted {
    pub round: u32,
    pub topic: String,
    pub level: u8,
}

// ---------------------------------------------------------------------------
// Answering
// ---------------------------------------------------------------------------

/// A question as shown to a player, without the correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub round: u32,
    /// 1-based position of this question within the round.
    pub number: usize,
    /// Questions per round.
    pub of: usize,
    pub topic: String,
    pub level: u8,
    pub text: String,
    pub options: Vec<String>,
    pub time_limit_secs: u32,
}

/// What happens next for the player who just answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerProgress {
    /// The caller has more questions in this round.
    MoreQuestions,
    /// The caller is done; the opponent is still answering.
    WaitingForOpponent,
    /// This answer closed the round; the next selection is pending.
    RoundComplete,
    /// This answer closed the final round.
    MatchFinished,
}

/// The result of one answer submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub correct_option: usize,
    pub points_awarded: u32,
    /// The caller's room score after this answer.
    pub score: u32,
    pub progress: AnswerProgress,
}

impl AnswerOutcome {
    /// Maps the outcome onto the status a poll would report next.
    pub fn status(&self) -> StatusReport {
        match self.progress {
            AnswerProgress::MoreQuestions => StatusReport::GoToQuestions,
            AnswerProgress::WaitingForOpponent => {
                StatusReport::WaitingForOpponentToAnswer
            }
            AnswerProgress::RoundComplete => StatusReport::RoundComplete,
            AnswerProgress::MatchFinished => StatusReport::MatchFinished,
        }
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// A player's final room score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub player: PlayerId,
    pub score: u32,
}

/// Who won. A strictly higher score wins; equal scores draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "player", rename_all = "snake_case")]
pub enum MatchOutcome {
    Winner(PlayerId),
    Draw,
}

/// The settled result of a finished duel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub room_id: RoomId,
    /// Both players in seat order.
    pub standings: [Standing; 2],
    pub outcome: MatchOutcome,
    pub rounds_played: u32,
    pub total_rounds: u32,
    /// Set when the duel ended because this player stopped responding.
    pub abandoned_by: Option<PlayerId>,
}

impl MatchResult {
    /// Returns the room score of `player`, if they took part.
    pub fn score_of(&self, player: &PlayerId) -> Option<u32> {
        self.standings
            .iter()
            .find(|s| &s.player == player)
            .map(|s| s.score)
    }
}
