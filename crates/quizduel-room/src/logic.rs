//! The two collaborators a duel depends on.
//!
//! The room layer never stores questions or lifetime scores itself. It asks
//! a [`QuestionSource`] for question pools and tells a [`ScoreSink`] about
//! finished duels. Both are traits so the catalog can live in memory, in a
//! file, or in a database without the state machine noticing.

use std::collections::BTreeSet;
use std::sync::Arc;

use quizduel_protocol::{PlayerId, QuestionRecord};

/// Read-only access to the question catalog.
///
/// Calls are expected to be fast and synchronous: room actors call them
/// while handling a selection.
pub trait QuestionSource: Send + Sync + 'static {
    /// Every distinct topic in the catalog.
    fn list_topics(&self) -> BTreeSet<String>;

    /// Every distinct level available for `topic`. Empty for an unknown
    /// topic.
    fn list_levels(&self, topic: &str) -> BTreeSet<u8>;

    /// All questions filed under exactly this (topic, level).
    fn find(&self, topic: &str, level: u8) -> Vec<QuestionRecord>;
}

/// Where lifetime scores accumulate.
pub trait ScoreSink: Send + Sync + 'static {
    /// Adds `amount` to the player's cumulative total.
    fn add_score(&self, player: &PlayerId, amount: u32);

    /// The player's cumulative total, for display. Zero if unknown.
    fn total(&self, player: &PlayerId) -> u64;
}

/// A question source shared between the store and every room actor.
pub type SharedQuestionSource = Arc<dyn QuestionSource>;

/// A score sink shared between the store and every room actor.
pub type SharedScoreSink = Arc<dyn ScoreSink>;
