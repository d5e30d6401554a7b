//! Error types for the presence layer.

/// Errors that can occur while tracking player presence.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    /// No presence record exists for the player. They never sent a
    /// heartbeat, or their record was already cleaned up.
    #[error("no presence record for player {0}")]
    NotFound(quizduel_protocol::PlayerId),
}
