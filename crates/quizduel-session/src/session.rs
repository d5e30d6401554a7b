//! Presence types: the server's record of whether a player is still around.
//!
//! A duel has no push channel, so the only evidence that a player is alive
//! is that they keep asking for status. Every request counts as a
//! heartbeat. A player who stops polling for longer than the configured
//! timeout is considered gone, and their opponent's next poll can end the
//! duel instead of waiting forever.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use quizduel_protocol::PlayerId;

// ---------------------------------------------------------------------------
// PresenceConfig
// ---------------------------------------------------------------------------

/// Configuration for presence tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// How long (in seconds) a player may go without a heartbeat before
    /// they count as absent.
    ///
    /// Default: 30 seconds. Polling clients typically ask every second or
    /// two, so this tolerates a few dropped requests.
    pub timeout_secs: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

// ---------------------------------------------------------------------------
// PresenceState
// ---------------------------------------------------------------------------

/// The lifecycle of a presence record.
///
/// ```text
///   Active ──(depart)──→ Departed ──(expire_stale)──→ Expired ──→ cleanup
///     │  ↑                  │
///     │  └───(heartbeat)────┘
///     └──(timeout, expire_stale)──→ Expired
/// ```
///
/// - **Active**: the player has sent a heartbeat. Whether they are still
///   *present* depends on how long ago that was.
/// - **Departed**: the player explicitly left (logged out). Absent
///   immediately, regardless of the timeout.
/// - **Expired**: swept by [`expire_stale`](crate::PresenceTracker::expire_stale)
///   and waiting for cleanup.
#[derive(Debug, Clone)]
pub enum PresenceState {
    Active,
    Departed { since: Instant },
    Expired,
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

/// One player's presence record.
#[derive(Debug, Clone)]
pub struct Presence {
    pub player_id: PlayerId,
    pub state: PresenceState,
    /// When the last heartbeat arrived. `tokio::time::Instant` so tests can
    /// pause and advance the clock.
    pub last_seen: Instant,
    /// Extra quiet time granted by the last heartbeat on top of the
    /// timeout, e.g. the allowance of a question the player just fetched.
    pub grace: Duration,
}

impl Presence {
    /// Active and heard from within `timeout` plus this record's grace.
    pub fn is_fresh(&self, timeout: Duration) -> bool {
        matches!(self.state, PresenceState::Active)
            && self.last_seen.elapsed() <= timeout + self.grace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_config_missing_fields_use_defaults() {
        let config: PresenceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_presence_config_reads_timeout() {
        let config: PresenceConfig =
            serde_json::from_str(r#"{"timeout_secs": 5}"#).unwrap();
        assert_eq!(config.timeout_secs, 5);
    }
}
