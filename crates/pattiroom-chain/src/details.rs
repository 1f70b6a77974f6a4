//! Room details as read from the game contract.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TokenAmount;

/// The on-chain lifecycle state of a room.
///
/// The contract stores this as a `uint8`; codes this client doesn't know
/// are kept as [`Other`](OnChainRoomState::Other) instead of failing the
/// read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum OnChainRoomState {
    Waiting,
    InProgress,
    Finished,
    Other(u8),
}

impl OnChainRoomState {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Waiting)
    }
}

impl From<u8> for OnChainRoomState {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Waiting,
            1 => Self::InProgress,
            2 => Self::Finished,
            other => Self::Other(other),
        }
    }
}

impl From<OnChainRoomState> for u8 {
    fn from(state: OnChainRoomState) -> Self {
        match state {
            OnChainRoomState::Waiting => 0,
            OnChainRoomState::InProgress => 1,
            OnChainRoomState::Finished => 2,
            OnChainRoomState::Other(code) => code,
        }
    }
}

impl fmt::Display for OnChainRoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "WAITING"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Finished => write!(f, "FINISHED"),
            Self::Other(code) => write!(f, "UNKNOWN({code})"),
        }
    }
}

/// Why a set of room details can't be joined.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetailsError {
    #[error("Room is not accepting players")]
    NotWaiting(OnChainRoomState),

    #[error("Room details are invalid")]
    Inconsistent { current_players: u32, max_players: u32 },
}

/// A snapshot of a room read from chain.
///
/// Always fetched fresh; never cached across lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDetails {
    /// Tokens (base units) each player must commit to join.
    pub buy_in: TokenAmount,
    /// Tokens (base units) currently in the pot.
    pub pot: TokenAmount,
    pub current_players: u32,
    pub max_players: u32,
    pub state: OnChainRoomState,
}

impl RoomDetails {
    /// Checks the room can be joined: it is WAITING and its seat counts
    /// make sense.
    ///
    /// A full room still passes. The contract is the authority on
    /// capacity, and its revert is classified as `RoomFull` later.
    pub fn validate(&self) -> Result<(), DetailsError> {
        if self.max_players == 0 || self.current_players > self.max_players {
            return Err(DetailsError::Inconsistent {
                current_players: self.current_players,
                max_players: self.max_players,
            });
        }
        if !self.state.is_joinable() {
            return Err(DetailsError::NotWaiting(self.state));
        }
        Ok(())
    }

    /// Seats still open according to this snapshot.
    pub fn seats_left(&self) -> u32 {
        self.max_players.saturating_sub(self.current_players)
    }

    pub fn is_full(&self) -> bool {
        self.seats_left() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waiting(current: u32, max: u32) -> RoomDetails {
        RoomDetails {
            buy_in: TokenAmount(100),
            pot: TokenAmount(0),
            current_players: current,
            max_players: max,
            state: OnChainRoomState::Waiting,
        }
    }

    #[test]
    fn test_state_codes_match_contract() {
        assert_eq!(OnChainRoomState::from(0), OnChainRoomState::Waiting);
        assert_eq!(OnChainRoomState::from(1), OnChainRoomState::InProgress);
        assert_eq!(OnChainRoomState::from(2), OnChainRoomState::Finished);
        assert_eq!(OnChainRoomState::from(7), OnChainRoomState::Other(7));
        assert_eq!(u8::from(OnChainRoomState::Other(7)), 7);
    }

    #[test]
    fn test_only_waiting_is_joinable() {
        assert!(OnChainRoomState::Waiting.is_joinable());
        assert!(!OnChainRoomState::InProgress.is_joinable());
        assert!(!OnChainRoomState::Finished.is_joinable());
        assert!(!OnChainRoomState::Other(9).is_joinable());
    }

    #[test]
    fn test_state_serializes_as_code() {
        let json = serde_json::to_string(&OnChainRoomState::Finished).unwrap();
        assert_eq!(json, "2");
        let state: OnChainRoomState = serde_json::from_str("0").unwrap();
        assert_eq!(state, OnChainRoomState::Waiting);
    }

    #[test]
    fn test_validate_accepts_open_waiting_room() {
        assert_eq!(waiting(2, 6).validate(), Ok(()));
    }

    #[test]
    fn test_validate_accepts_full_waiting_room() {
        let details = waiting(6, 6);
        assert!(details.is_full());
        assert_eq!(details.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_started_room() {
        let details = RoomDetails {
            state: OnChainRoomState::InProgress,
            ..waiting(2, 6)
        };
        let err = details.validate().unwrap_err();
        assert_eq!(err, DetailsError::NotWaiting(OnChainRoomState::InProgress));
        assert_eq!(err.to_string(), "Room is not accepting players");
    }

    #[test]
    fn test_validate_rejects_impossible_seat_counts() {
        assert!(matches!(
            waiting(7, 6).validate(),
            Err(DetailsError::Inconsistent { .. })
        ));
        assert!(matches!(
            waiting(0, 0).validate(),
            Err(DetailsError::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_seats_left() {
        assert_eq!(waiting(2, 6).seats_left(), 4);
        assert_eq!(waiting(6, 6).seats_left(), 0);
    }
}
