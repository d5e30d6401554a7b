//! In-memory cumulative score ledger.

use std::collections::HashMap;

use parking_lot::RwLock;
use quizduel_protocol::PlayerId;
use quizduel_room::ScoreSink;

/// Lifetime duel scores per player, kept for the life of the process.
#[derive(Debug, Default)]
pub struct ScoreLedger {
    totals: RwLock<HashMap<PlayerId, u64>>,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from existing totals, e.g. ones loaded from elsewhere.
    pub fn with_totals(totals: impl IntoIterator<Item = (PlayerId, u64)>) -> Self {
        Self {
            totals: RwLock::new(totals.into_iter().collect()),
        }
    }

    /// The `limit` highest totals, best first. Ties are ordered by name.
    pub fn leaderboard(&self, limit: usize) -> Vec<(PlayerId, u64)> {
        let mut rows: Vec<(PlayerId, u64)> = self
            .totals
            .read()
            .iter()
            .map(|(player, total)| (player.clone(), *total))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        rows.truncate(limit);
        rows
    }

    pub fn len(&self) -> usize {
        self.totals.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.read().is_empty()
    }
}

impl ScoreSink for ScoreLedger {
    fn add_score(&self, player: &PlayerId, amount: u32) {
        let mut totals = self.totals.write();
        let total = totals.entry(player.clone()).or_default();
        *total += u64::from(amount);
        tracing::debug!(%player, amount, total = *total, "score added");
    }

    fn total(&self, player: &PlayerId) -> u64 {
        self.totals.read().get(player).copied().unwrap_or(0)
    }
}
