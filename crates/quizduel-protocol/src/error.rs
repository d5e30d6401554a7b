//! Error types for the protocol layer.
//!
//! Each quizduel crate defines its own error enum. A `ProtocolError` always
//! means a problem with bytes or records, never with game state.

/// Errors that can occur while encoding, decoding, or validating
/// protocol values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed input, missing fields, or
    /// wrong types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A question record decoded fine but can't be served: wrong number
    /// of options, a correct index out of range, or a level outside
    /// 1..=10. Carries a description of the offending record.
    #[error("invalid question: {0}")]
    InvalidQuestion(String),
}
