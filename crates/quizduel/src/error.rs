//! Unified error type for quizduel.

use std::path::PathBuf;

use quizduel_protocol::ProtocolError;
use quizduel_room::RoomError;
use quizduel_session::PresenceError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `quizduel` crate, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum DuelError {
    /// Encoding, decoding, or a malformed question record.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A presence record was missing.
    #[error(transparent)]
    Presence(#[from] PresenceError),

    /// Matchmaking or gameplay refused the request.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A catalog file couldn't be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The service was built with missing or unusable settings.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DuelError {
    /// Returns `true` if the caller should be told the room doesn't exist
    /// for them.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Room(err) if err.is_not_found())
    }
}
