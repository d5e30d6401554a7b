//! Core data types shared by every layer of quizduel.
//!
//! These are the values that cross layer boundaries: who a player is,
//! which room they are in, and what a question looks like. They are all
//! serializable so a presentation layer can hand them straight to a
//! client.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// This is the authenticated account name. quizduel never interprets it;
/// it only compares, hashes, and displays it. Authentication happens
/// upstream; by the time a `PlayerId` reaches the core it is trusted.
///
/// `#[serde(transparent)]` serializes this as the bare string, so
/// `PlayerId::new("alice")` becomes `"alice"` in JSON.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Wraps an account name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the account name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A unique identifier for a room (one duel between two players).
///
/// Room IDs are assigned from a monotonically increasing counter and are
/// never reused while the process lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room_{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

/// The reserved difficulty level of the bonus category.
///
/// Normal questions use levels 1 through 9. Questions filed under the bonus
/// category always carry this level, and the room layer forces it when the
/// bonus topic is selected.
pub const BONUS_LEVEL: u8 = 10;

/// Number of answer options every question carries.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// A single multiple-choice question, as stored in the question catalog.
///
/// Owned by the question source and read-only to the core. The serde
/// renames match the catalog file layout (`qText`, `time`), so existing
/// catalogs load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// The question prompt.
    #[serde(rename = "qText")]
    pub text: String,

    /// Answer options, indexed from 0.
    pub options: Vec<String>,

    /// Index into `options` of the correct answer.
    pub correct: usize,

    /// Difficulty level: 1..=9, or [`BONUS_LEVEL`] for the bonus category.
    /// A correct answer is worth `level` points (bonus rounds excepted).
    pub level: u8,

    /// The topic this question belongs to.
    pub category: String,

    /// How long a player is given to answer, in seconds. Advisory only.
    #[serde(rename = "time")]
    pub time_limit_secs: u32,
}

impl QuestionRecord {
    /// Returns `true` if the record can be served in a duel: exactly four
    /// options, a correct index that points at one of them, and a level
    /// in `1..=BONUS_LEVEL`.
    pub fn is_well_formed(&self) -> bool {
        self.options.len() == OPTIONS_PER_QUESTION
            && self.correct < self.options.len()
            && (1..=BONUS_LEVEL).contains(&self.level)
    }

    /// Returns `true` if `option` is the correct answer.
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct
    }
}
