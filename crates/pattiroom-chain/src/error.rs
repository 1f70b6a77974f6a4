//! Error types for chain calls.

/// A failed wallet or contract call.
///
/// The payload is the provider's message verbatim. The join layer
/// classifies failures by matching substrings of it ("user rejected",
/// "Room is full", ...), so it must not be reworded here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// Submitting or mining a transaction failed (including reverts and
    /// signature rejections).
    #[error("{0}")]
    Transaction(String),

    /// A read call failed (RPC down, decode error, ...).
    #[error("{0}")]
    Read(String),
}
