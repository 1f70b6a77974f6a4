//! Classification of on-chain transaction failures.
//!
//! Wallets and RPC providers report failures as free-form strings. Each
//! table below maps substrings of those strings to a [`JoinErrorKind`]
//! and a user-facing message. Matching is case-insensitive, tables are
//! scanned in order and the first hit wins. No hit falls back to the
//! generic kind of the step, keeping the raw message.

use crate::{JoinErrorKind, JoinFailure};

/// One row of a classification table.
#[derive(Debug, Clone, Copy)]
pub struct FailurePattern {
    /// Lowercase substring to look for.
    pub pattern: &'static str,
    pub kind: JoinErrorKind,
    pub message: &'static str,
}

const fn row(pattern: &'static str, kind: JoinErrorKind, message: &'static str) -> FailurePattern {
    FailurePattern {
        pattern,
        kind,
        message,
    }
}

const REJECTED: &str = "Transaction rejected by user";
const INSUFFICIENT_BALANCE: &str = "Insufficient token balance";

/// Patterns for the approval transaction.
pub const APPROVAL_FAILURES: &[FailurePattern] = &[
    row("user rejected", JoinErrorKind::ApprovalRejected, REJECTED),
    row("user denied", JoinErrorKind::ApprovalRejected, REJECTED),
    row("action_rejected", JoinErrorKind::ApprovalRejected, REJECTED),
    row("insufficient funds", JoinErrorKind::ApprovalError, INSUFFICIENT_BALANCE),
];

/// Patterns for the room-join transaction.
pub const JOIN_FAILURES: &[FailurePattern] = &[
    row("user rejected", JoinErrorKind::JoinRejected, REJECTED),
    row("user denied", JoinErrorKind::JoinRejected, REJECTED),
    row("action_rejected", JoinErrorKind::JoinRejected, REJECTED),
    row("insufficient funds", JoinErrorKind::JoinError, INSUFFICIENT_BALANCE),
    row(
        "already joined",
        JoinErrorKind::AlreadyJoined,
        "You have already joined this room",
    ),
    row("room is full", JoinErrorKind::RoomFull, "Room is full"),
    row(
        "insufficient allowance",
        JoinErrorKind::JoinError,
        "Token approval is insufficient",
    ),
];

/// Classifies a failed approval.
pub fn classify_approval_failure(raw: &str) -> JoinFailure {
    classify(APPROVAL_FAILURES, JoinErrorKind::ApprovalError, raw)
}

/// Classifies a failed room join.
pub fn classify_join_failure(raw: &str) -> JoinFailure {
    classify(JOIN_FAILURES, JoinErrorKind::JoinError, raw)
}

/// Runs `raw` through `table`, falling back to `fallback`.
pub fn classify(table: &[FailurePattern], fallback: JoinErrorKind, raw: &str) -> JoinFailure {
    let haystack = raw.to_lowercase();
    let failure = match table.iter().find(|row| haystack.contains(row.pattern)) {
        Some(row) => JoinFailure::new(row.kind, row.message),
        None if raw.trim().is_empty() => JoinFailure::from_kind(fallback),
        None => JoinFailure::new(fallback, raw.trim()),
    };
    failure.with_raw(raw)
}
