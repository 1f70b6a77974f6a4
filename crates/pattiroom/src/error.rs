//! Unified error type for Pattiroom.

use pattiroom_chain::ChainError;
use pattiroom_join::{JoinError, ResolveError};
use pattiroom_messaging::MessagingError;
use pattiroom_protocol::ProtocolError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` conversions let `?` lift sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum PattiroomError {
    /// Encoding, decoding or identifier validation.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The server connection.
    #[error(transparent)]
    Messaging(#[from] MessagingError),

    /// Wallet or contract calls.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Short-code resolution outside an orchestrator.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A join attempt.
    #[error(transparent)]
    Join(#[from] JoinError),
}

impl PattiroomError {
    /// Returns `true` if the user cancelled the attempt.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Join(JoinError::Cancelled(_)))
    }
}
