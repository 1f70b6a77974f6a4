//! The join state machine and the attempt record it drives.

use std::fmt;

use pattiroom_chain::RoomDetails;
use pattiroom_protocol::{AttemptId, RoomIdentifier, SessionId, ShortCode, TxHash};
use serde::{Deserialize, Serialize};

use crate::{JoinErrorKind, JoinFailure, derive_short_code};

// ---------------------------------------------------------------------------
// JoinState
// ---------------------------------------------------------------------------

/// The state of a join attempt.
///
/// ```text
/// Idle → DetailsLoading → DetailsReady → Approving → JoiningOnChain
///                                                        │
///                         Succeeded ◄── AwaitingServerConfirmation
/// ```
///
/// Every non-terminal state may also move to `Failed(kind)`. `Cancelled`
/// is reachable from every non-terminal state except `Approving` and
/// `JoiningOnChain`, where a transaction is in flight. `JoiningOnChain`
/// goes straight to `Succeeded` when no game server is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinState {
    Idle,
    DetailsLoading,
    DetailsReady,
    Approving,
    JoiningOnChain,
    AwaitingServerConfirmation,
    Succeeded,
    Failed(JoinErrorKind),
    Cancelled,
}

impl JoinState {
    /// Returns `true` for `Succeeded`, `Failed` and `Cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_) | Self::Cancelled)
    }

    /// Returns `true` while a signed transaction awaits its outcome.
    pub fn has_transaction_in_flight(self) -> bool {
        matches!(self, Self::Approving | Self::JoiningOnChain)
    }

    /// Returns `true` if the user may cancel from here.
    pub fn is_cancellable(self) -> bool {
        !self.is_terminal() && !self.has_transaction_in_flight()
    }

    /// Returns `true` if moving to `target` is a legal edge.
    pub fn can_transition_to(self, target: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match target {
            Self::Failed(_) => true,
            Self::Cancelled => self.is_cancellable(),
            _ => matches!(
                (self, target),
                (Self::Idle, Self::DetailsLoading)
                    | (Self::DetailsLoading, Self::DetailsReady)
                    | (Self::DetailsReady, Self::Approving)
                    | (Self::Approving, Self::JoiningOnChain)
                    | (Self::JoiningOnChain, Self::AwaitingServerConfirmation)
                    | (Self::JoiningOnChain, Self::Succeeded)
                    | (Self::AwaitingServerConfirmation, Self::Succeeded)
            ),
        }
    }
}

impl fmt::Display for JoinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::DetailsLoading => write!(f, "DetailsLoading"),
            Self::DetailsReady => write!(f, "DetailsReady"),
            Self::Approving => write!(f, "Approving"),
            Self::JoiningOnChain => write!(f, "JoiningOnChain"),
            Self::AwaitingServerConfirmation => write!(f, "AwaitingServerConfirmation"),
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Failed(kind) => write!(f, "Failed({kind})"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

// ---------------------------------------------------------------------------
// JoinAttempt
// ---------------------------------------------------------------------------

/// Everything known about one join attempt.
///
/// Owned by the orchestrator; the UI only ever sees clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinAttempt {
    pub id: AttemptId,
    /// The text the user submitted.
    pub input: String,
    pub state: JoinState,
    /// Set while a short code is out for resolution.
    pub resolving: bool,
    pub room_id: Option<RoomIdentifier>,
    /// Only meaningful while `state == DetailsReady`.
    pub details: Option<RoomDetails>,
    pub error: Option<JoinFailure>,
    pub approval_tx: Option<TxHash>,
    pub join_tx: Option<TxHash>,
    /// The game session granted by the server.
    pub session_id: Option<SessionId>,
}

impl JoinAttempt {
    pub fn new(id: AttemptId, input: impl Into<String>) -> Self {
        Self {
            id,
            input: input.into(),
            state: JoinState::Idle,
            resolving: false,
            room_id: None,
            details: None,
            error: None,
            approval_tx: None,
            join_tx: None,
            session_id: None,
        }
    }

    /// The shareable code of the resolved room, if there is one.
    pub fn short_code(&self) -> Option<ShortCode> {
        self.room_id
            .as_ref()
            .map(|id| derive_short_code(id.as_str()))
    }
}

/// The result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub attempt_id: AttemptId,
    pub room_id: RoomIdentifier,
    /// `None` when the join completed on chain with no server connected.
    pub session_id: Option<SessionId>,
    pub approval_tx: TxHash,
    pub join_tx: TxHash,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [JoinState; 9] = [
        JoinState::Idle,
        JoinState::DetailsLoading,
        JoinState::DetailsReady,
        JoinState::Approving,
        JoinState::JoiningOnChain,
        JoinState::AwaitingServerConfirmation,
        JoinState::Succeeded,
        JoinState::Failed(JoinErrorKind::RoomFull),
        JoinState::Cancelled,
    ];

    #[test]
    fn test_happy_path_edges() {
        let path = [
            JoinState::Idle,
            JoinState::DetailsLoading,
            JoinState::DetailsReady,
            JoinState::Approving,
            JoinState::JoiningOnChain,
            JoinState::AwaitingServerConfirmation,
            JoinState::Succeeded,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} → {}", pair[0], pair[1]);
        }
        assert!(JoinState::JoiningOnChain.can_transition_to(JoinState::Succeeded));
    }

    #[test]
    fn test_no_skipping_states() {
        assert!(!JoinState::Idle.can_transition_to(JoinState::DetailsReady));
        assert!(!JoinState::DetailsReady.can_transition_to(JoinState::JoiningOnChain));
        assert!(!JoinState::DetailsLoading.can_transition_to(JoinState::Approving));
        assert!(!JoinState::Approving.can_transition_to(JoinState::Succeeded));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} → {to}");
            }
        }
    }

    #[test]
    fn test_cancellation_blocked_with_transaction_in_flight() {
        assert!(!JoinState::Approving.can_transition_to(JoinState::Cancelled));
        assert!(!JoinState::JoiningOnChain.can_transition_to(JoinState::Cancelled));
        assert!(JoinState::Idle.can_transition_to(JoinState::Cancelled));
        assert!(JoinState::DetailsReady.can_transition_to(JoinState::Cancelled));
        assert!(JoinState::AwaitingServerConfirmation.can_transition_to(JoinState::Cancelled));
    }

    #[test]
    fn test_any_live_state_can_fail() {
        for from in ALL.iter().filter(|s| !s.is_terminal()) {
            assert!(from.can_transition_to(JoinState::Failed(JoinErrorKind::JoinError)));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(JoinState::DetailsReady.to_string(), "DetailsReady");
        assert_eq!(
            JoinState::Failed(JoinErrorKind::RoomFull).to_string(),
            "Failed(RoomFull)"
        );
    }

    #[test]
    fn test_attempt_short_code() {
        let mut attempt = JoinAttempt::new(AttemptId(1), "a399e5");
        assert_eq!(attempt.short_code(), None);
        let id = RoomIdentifier::parse(&format!("0x00a399e5{}", "0".repeat(56))).unwrap();
        attempt.room_id = Some(id);
        assert_eq!(attempt.short_code(), Some(ShortCode("A399E5".into())));
    }
}
