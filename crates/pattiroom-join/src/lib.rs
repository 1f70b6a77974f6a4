//! Room joining for Pattiroom.
//!
//! Joining a room is a handshake across two authorities: the game
//! contract, which takes the buy-in, and the game server, which seats the
//! player. This crate sequences it.
//!
//! # Key types
//!
//! - [`JoinOrchestrator`] — the state machine; `submit` then `confirm`
//! - [`JoinControl`] — observe or cancel an attempt from elsewhere
//! - [`JoinAttempt`] / [`JoinState`] — what the UI renders
//! - [`RoomCodeResolver`] — short code → room identifier via the server
//! - [`JoinConfig`] — timeouts and token decimals
//! - [`JoinError`] / [`JoinFailure`] / [`JoinErrorKind`] — classified outcomes

mod attempt;
mod classify;
mod config;
mod error;
mod orchestrator;
mod resolver;

pub use attempt::{JoinAttempt, JoinOutcome, JoinState};
pub use classify::{
    APPROVAL_FAILURES, FailurePattern, JOIN_FAILURES, classify, classify_approval_failure,
    classify_join_failure,
};
pub use config::JoinConfig;
pub use error::{JoinError, JoinErrorKind, JoinFailure};
pub use orchestrator::{JoinControl, JoinOrchestrator};
pub use resolver::{
    MIN_CANONICAL_LEN, MIN_SHORT_CODE_LEN, Normalized, PendingResolution, ResolveError,
    RoomCodeResolver, SHORT_CODE_LEN, derive_short_code, expand_short_code, format_room_id,
    normalize,
};
