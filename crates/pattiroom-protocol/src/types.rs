//! Identity types shared by every Pattiroom layer.
//!
//! All of these are newtype wrappers. A room identifier, a wallet address
//! and a transaction hash are all hex strings underneath, but mixing them
//! up is a bug the compiler should catch.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Prefix carried by every canonical on-chain hex value.
pub const CANONICAL_PREFIX: &str = "0x";

/// Number of hex digits in a 32-byte room identifier.
pub const ROOM_ID_HEX_LEN: usize = 64;

// ---------------------------------------------------------------------------
// RoomIdentifier
// ---------------------------------------------------------------------------

/// The canonical on-chain identity of a room: `0x` followed by 64 hex
/// digits (32 bytes).
///
/// The original casing is preserved. Wallets and block explorers hand out
/// both checksummed and lowercase forms, and the contract treats them the
/// same, so we never rewrite what the user pasted.
///
/// Deserialization goes through [`RoomIdentifier::parse`], so a malformed
/// id can't sneak in from the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomIdentifier(String);

impl RoomIdentifier {
    /// Parses a canonical identifier.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidRoomId`] unless the input is `0x`
    /// followed by exactly 64 hex digits.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let body = raw.strip_prefix(CANONICAL_PREFIX).ok_or_else(|| {
            ProtocolError::InvalidRoomId(format!(
                "{raw:?} does not start with {CANONICAL_PREFIX}"
            ))
        })?;

        if body.len() != ROOM_ID_HEX_LEN {
            return Err(ProtocolError::InvalidRoomId(format!(
                "expected {ROOM_ID_HEX_LEN} hex digits, got {}",
                body.len()
            )));
        }
        if !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ProtocolError::InvalidRoomId(format!(
                "{raw:?} contains non-hex characters"
            )));
        }

        Ok(Self(raw.to_string()))
    }

    /// Returns the identifier exactly as it was parsed.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the 64 hex digits without the `0x` prefix.
    pub fn hex_body(&self) -> &str {
        &self.0[CANONICAL_PREFIX.len()..]
    }
}

impl TryFrom<String> for RoomIdentifier {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomIdentifier> for String {
    fn from(id: RoomIdentifier) -> Self {
        id.0
    }
}

impl fmt::Display for RoomIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ShortCode
// ---------------------------------------------------------------------------

/// A 6-character, human-shareable display code for a room (e.g. `A399E5`).
///
/// Derived one-way from a [`RoomIdentifier`]. It is NOT authoritative:
/// going back from a code to an identifier always needs the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(pub String);

impl ShortCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShortCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// AttemptId
// ---------------------------------------------------------------------------

/// Unique tag for one join attempt.
///
/// Every subscription the orchestrator opens is tied to the attempt that
/// opened it, and server events echoing a different attempt are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(pub u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Chain values
// ---------------------------------------------------------------------------

/// A wallet or contract address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A transaction hash returned by a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The off-chain game session id issued by the server on confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
