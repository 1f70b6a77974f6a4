//! Error types for the join layer.
//!
//! Two levels:
//!
//! - [`JoinFailure`] — a terminal outcome of an attempt. Carries the
//!   [`JoinErrorKind`], the message to show the user, and the raw
//!   underlying message for diagnostics.
//! - [`JoinError`] — what the orchestrator's methods return: either a
//!   failure, a cancellation, or a command that was refused because the
//!   machine is in the wrong state.

use std::fmt;

use pattiroom_protocol::AttemptId;
use serde::{Deserialize, Serialize};

use crate::JoinState;

/// Classification of a failed join attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinErrorKind {
    /// Unresolved or malformed room code / identifier.
    InvalidInput,
    /// Room not found, or not in WAITING state.
    RoomUnavailable,
    /// No wallet account at confirmation time.
    NotConnected,
    /// The user declined the approval signature.
    ApprovalRejected,
    /// The approval failed for any other reason.
    ApprovalError,
    /// The user declined the join signature.
    JoinRejected,
    /// The contract says the player is already seated.
    AlreadyJoined,
    /// The contract says the room has no free seat.
    RoomFull,
    /// Any other on-chain join failure.
    JoinError,
    /// The game server refused the player after the on-chain join.
    ///
    /// The tokens stay committed on chain; nothing here reconciles that.
    ServerRejected,
    /// The game server didn't answer within the configured bound.
    Timeout,
}

impl JoinErrorKind {
    /// The message shown when nothing more specific is known.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::InvalidInput => "Please enter a valid room code or blockchain room ID",
            Self::RoomUnavailable => "Room is not accepting players",
            Self::NotConnected => "Please connect your wallet",
            Self::ApprovalRejected | Self::JoinRejected => "Transaction rejected by user",
            Self::ApprovalError => "Failed to approve tokens",
            Self::AlreadyJoined => "You have already joined this room",
            Self::RoomFull => "Room is full",
            Self::JoinError => "Failed to join room",
            Self::ServerRejected => "Game server rejected the join",
            Self::Timeout => "Timed out waiting for the game server",
        }
    }
}

impl fmt::Display for JoinErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A terminal failure of one join attempt.
///
/// `Display` prints the user-facing message only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct JoinFailure {
    pub kind: JoinErrorKind,
    pub message: String,
    /// The underlying message (provider error, parse error, ...), if any.
    pub raw: Option<String>,
}

impl JoinFailure {
    pub fn new(kind: JoinErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raw: None,
        }
    }

    /// A failure with the kind's default message.
    pub fn from_kind(kind: JoinErrorKind) -> Self {
        Self::new(kind, kind.default_message())
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }
}

/// Errors returned by [`JoinOrchestrator`](crate::JoinOrchestrator) and
/// [`JoinControl`](crate::JoinControl).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    /// The attempt ended in `Failed`.
    #[error(transparent)]
    Failed(#[from] JoinFailure),

    /// The attempt was cancelled while this call was waiting on it.
    #[error("join attempt {0} was cancelled")]
    Cancelled(AttemptId),

    /// The command isn't valid in the current state.
    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: JoinState,
    },

    /// Cancellation refused: a transaction has been submitted and its
    /// outcome is not known yet.
    #[error("cannot cancel while {0}: a transaction is in flight")]
    CancelBlocked(JoinState),
}

impl JoinError {
    /// The failure kind, if this is a terminal failure.
    pub fn kind(&self) -> Option<JoinErrorKind> {
        match self {
            Self::Failed(failure) => Some(failure.kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_displays_user_message_only() {
        let failure = JoinFailure::new(JoinErrorKind::RoomFull, "Room is full")
            .with_raw("execution reverted: Room is full");
        assert_eq!(failure.to_string(), "Room is full");
        assert_eq!(failure.raw.as_deref(), Some("execution reverted: Room is full"));
    }

    #[test]
    fn test_from_kind_uses_default_message() {
        let failure = JoinFailure::from_kind(JoinErrorKind::NotConnected);
        assert_eq!(failure.message, "Please connect your wallet");
        assert!(failure.raw.is_none());
    }

    #[test]
    fn test_join_error_kind_accessor() {
        let err: JoinError = JoinFailure::from_kind(JoinErrorKind::Timeout).into();
        assert_eq!(err.kind(), Some(JoinErrorKind::Timeout));
        assert_eq!(JoinError::Cancelled(AttemptId(1)).kind(), None);
    }

    #[test]
    fn test_cancel_blocked_message_names_state() {
        let err = JoinError::CancelBlocked(JoinState::Approving);
        assert_eq!(
            err.to_string(),
            "cannot cancel while Approving: a transaction is in flight"
        );
    }
}
