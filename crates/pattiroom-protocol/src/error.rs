//! Error types for the protocol layer.
//!
//! Each crate in Pattiroom defines its own error enum. A `ProtocolError`
//! always means the problem is in parsing or (de)serialization, never in
//! the chain or the network.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into an event).
    ///
    /// Common causes: malformed JSON, an unknown event name, or a payload
    /// that is missing required fields.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A string that should be a canonical room identifier is not one.
    #[error("invalid room identifier: {0}")]
    InvalidRoomId(String),

    /// The message is well-formed but violates protocol rules.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
