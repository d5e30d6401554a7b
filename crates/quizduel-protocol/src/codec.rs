//! Codec trait and implementations for turning protocol values into bytes.
//!
//! The core never talks to a client directly, but two things still need a
//! byte format: question catalogs loaded from disk, and the status payloads
//! a presentation layer ships to its clients. Both go through [`Codec`] so
//! the format can be swapped without touching the callers.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `Send + Sync + 'static` so a single codec can be shared by every
/// request-handling task for the life of the process.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented
    /// in this format.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected shape.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// This is the format of the question catalog file and the natural format
/// for a browser polling for status. Behind the `json` feature (default).
///
/// ## Example
///
/// ```rust
/// use quizduel_protocol::{Codec, JsonCodec, NextAction, RoomId, StatusReport};
///
/// let codec = JsonCodec;
/// let report = StatusReport::FoundMatch {
///     room_id: RoomId(1),
///     next_action: NextAction::SelectTopic,
/// };
///
/// let bytes = codec.encode(&report).unwrap();
/// let decoded: StatusReport = codec.decode(&bytes).unwrap();
/// assert_eq!(report, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
