//! Score settlement for finished duels.
//!
//! Called by the room actor exactly once per room, right after the state
//! machine reaches `Finished`. Settlement credits both players' room
//! scores to the [`ScoreSink`] and decides the winner.

use std::cmp::Ordering;

use quizduel_protocol::{MatchOutcome, MatchResult, Standing};

use crate::{DuelState, ScoreSink};

/// Decides the outcome from final standings. A strictly higher score wins.
pub fn decide(standings: &[Standing; 2]) -> MatchOutcome {
    let [first, second] = standings;
    match first.score.cmp(&second.score) {
        Ordering::Greater => MatchOutcome::Winner(first.player.clone()),
        Ordering::Less => MatchOutcome::Winner(second.player.clone()),
        Ordering::Equal => MatchOutcome::Draw,
    }
}

/// Credits each player's room score to `sink` and builds the result.
///
/// The caller guarantees this runs once per room; `DuelState::needs_settlement`
/// is the guard.
pub fn settle(state: &DuelState, sink: &dyn ScoreSink) -> MatchResult {
    let standings = state.standings();
    for standing in &standings {
        sink.add_score(&standing.player, standing.score);
    }
    let outcome = decide(&standings);

    tracing::info!(
        room_id = %state.room_id(),
        ?outcome,
        first = standings[0].score,
        second = standings[1].score,
        abandoned = state.abandoned_by().is_some(),
        "duel settled"
    );

    MatchResult {
        room_id: state.room_id(),
        standings,
        outcome,
        rounds_played: state.current_round(),
        total_rounds: state.total_rounds(),
        abandoned_by: state.abandoned_by().cloned(),
    }
}
