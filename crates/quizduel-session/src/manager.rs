//! The presence tracker: who has been heard from recently.
//!
//! Responsibilities:
//! - Stamping a player's `last_seen` on every heartbeat
//! - Recording explicit departures (logout)
//! - Answering "is this player still here?" for abandonment detection
//! - Expiring and cleaning up dead records so memory stays bounded
//!
//! # Concurrency note
//!
//! `PresenceTracker` is a plain `HashMap`. The service layer owns it behind
//! a mutex; keeping it lock-free here keeps it trivially testable.

use std::collections::HashMap;
use std::time::Duration;

use quizduel_protocol::PlayerId;
use tokio::time::Instant;

use crate::{Presence, PresenceConfig, PresenceError, PresenceState};

/// Tracks the last sign of life from every player.
///
/// ## Lifecycle
///
/// ```text
/// heartbeat() ──→ [Active] ──depart()──→ [Departed]
///                    │                       │
///                    └──── expire_stale() ───┘
///                               │
///                           [Expired] ──→ cleanup_expired()
/// ```
pub struct PresenceTracker {
    records: HashMap<PlayerId, Presence>,
    config: PresenceConfig,
}

impl PresenceTracker {
    /// Creates an empty tracker with the given config.
    pub fn new(config: PresenceConfig) -> Self {
        Self {
            records: HashMap::new(),
            config,
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    /// Records a sign of life from `player`.
    ///
    /// Creates the record on first contact. A departed or expired player
    /// who comes back becomes active again. Any grace granted earlier is
    /// dropped.
    pub fn heartbeat(&mut self, player_id: &PlayerId) {
        self.heartbeat_with_grace(player_id, Duration::ZERO);
    }

    /// Like [`heartbeat`](Self::heartbeat), but the player may then stay
    /// quiet for `grace` longer than the timeout before counting as absent.
    ///
    /// Used when a player is handed something that takes a while, such as
    /// a question with its own time allowance.
    pub fn heartbeat_with_grace(
        &mut self,
        player_id: &PlayerId,
        grace: Duration,
    ) {
        let now = Instant::now();
        match self.records.get_mut(player_id) {
            Some(presence) => {
                if !matches!(presence.state, PresenceState::Active) {
                    tracing::debug!(player = %player_id, "player returned");
                }
                presence.state = PresenceState::Active;
                presence.last_seen = now;
                presence.grace = grace;
            }
            None => {
                self.records.insert(
                    player_id.clone(),
                    Presence {
                        player_id: player_id.clone(),
                        state: PresenceState::Active,
                        last_seen: now,
                        grace,
                    },
                );
                tracing::debug!(player = %player_id, "presence recorded");
            }
        }
    }

    /// Marks a player as explicitly gone. They are absent from now on
    /// until their next heartbeat.
    ///
    /// # Errors
    /// Returns [`PresenceError::NotFound`] if the player was never seen.
    pub fn depart(
        &mut self,
        player_id: &PlayerId,
    ) -> Result<(), PresenceError> {
        let presence = self
            .records
            .get_mut(player_id)
            .ok_or_else(|| PresenceError::NotFound(player_id.clone()))?;

        presence.state = PresenceState::Departed {
            since: Instant::now(),
        };
        tracing::info!(player = %player_id, "player departed");
        Ok(())
    }

    /// Returns `true` if the player is active and was heard from within
    /// the timeout plus any grace their last heartbeat granted. Unknown
    /// players are not present.
    pub fn is_present(&self, player_id: &PlayerId) -> bool {
        self.records
            .get(player_id)
            .is_some_and(|p| p.is_fresh(self.timeout()))
    }

    /// Expires every record that is departed or has timed out.
    ///
    /// Returns the players that were expired by this call.
    pub fn expire_stale(&mut self) -> Vec<PlayerId> {
        let timeout = self.timeout();
        let mut expired = Vec::new();

        for presence in self.records.values_mut() {
            let stale = match &presence.state {
                PresenceState::Active => !presence.is_fresh(timeout),
                PresenceState::Departed { .. } => true,
                PresenceState::Expired => false,
            };
            if stale {
                presence.state = PresenceState::Expired;
                expired.push(presence.player_id.clone());
                tracing::debug!(
                    player = %presence.player_id,
                    "presence expired"
                );
            }
        }

        expired
    }

    /// Removes every expired record.
    ///
    /// Separate from `expire_stale` so callers can react to the expired
    /// list before the records disappear.
    pub fn cleanup_expired(&mut self) {
        self.records
            .retain(|_, p| !matches!(p.state, PresenceState::Expired));
    }

    /// Looks up a record.
    pub fn get(&self, player_id: &PlayerId) -> Option<&Presence> {
        self.records.get(player_id)
    }

    /// Returns the number of records (any state).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
