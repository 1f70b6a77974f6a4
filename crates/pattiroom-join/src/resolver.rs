//! Room-code handling: normalizing user input, deriving the shareable
//! short code, and resolving a short code through the game server.
//!
//! ```text
//!   user input ──► normalize ──┬─► Canonical("0x…")  ──► (no resolution)
//!                              ├─► ShortCode("a399e5") ──► resolveRoomCode ──► roomCodeResolved
//!                              ├─► Empty
//!                              └─► Invalid
//! ```
//!
//! The short code is a lossy display derivation of the identifier. Only
//! the server's answer maps a code back to a room.

use pattiroom_messaging::{MessagingChannel, MessagingError, Subscription};
use pattiroom_protocol::{CANONICAL_PREFIX, ClientEvent, ServerEvent, ShortCode};

/// Inputs starting with `0x` longer than this are canonical identifiers.
pub const MIN_CANONICAL_LEN: usize = 10;

/// Shortest input treated as a short-code candidate.
pub const MIN_SHORT_CODE_LEN: usize = 4;

/// Length of a derived short code.
pub const SHORT_CODE_LEN: usize = 6;

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// The result of [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// Nothing but whitespace.
    Empty,
    /// A full identifier, returned as typed (case preserved).
    Canonical(String),
    /// A short-code candidate, cleaned and lowercased.
    ShortCode(String),
    /// Anything else.
    Invalid,
}

/// Classifies raw user input.
///
/// ```rust
/// use pattiroom_join::{Normalized, normalize};
///
/// assert_eq!(normalize("  A399E5 "), Normalized::ShortCode("a399e5".into()));
/// assert_eq!(normalize("room-7"), Normalized::Invalid);
/// ```
pub fn normalize(input: &str) -> Normalized {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Normalized::Empty;
    }
    if trimmed.starts_with(CANONICAL_PREFIX) && trimmed.len() > MIN_CANONICAL_LEN {
        return Normalized::Canonical(trimmed.to_string());
    }
    if trimmed.len() >= MIN_SHORT_CODE_LEN && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        return Normalized::ShortCode(expand_short_code(trimmed));
    }
    Normalized::Invalid
}

/// Drops every non-hex character and lowercases the rest.
pub fn expand_short_code(code: &str) -> String {
    code.chars()
        .filter(char::is_ascii_hexdigit)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derives the shareable code for a room identifier.
///
/// Skips leading zeros of the hex body and takes the next six characters,
/// uppercased. Identifiers with fewer than six characters after the
/// leading zeros (all zeros, say) fall back to the last six characters.
///
/// ```rust
/// use pattiroom_join::derive_short_code;
///
/// let id = format!("0x0000ab12cd{}", "e".repeat(54));
/// assert_eq!(derive_short_code(&id).as_str(), "AB12CD");
/// ```
pub fn derive_short_code(identifier: &str) -> ShortCode {
    let hex = identifier
        .strip_prefix(CANONICAL_PREFIX)
        .unwrap_or(identifier);

    let accepted: String = hex
        .chars()
        .skip_while(|&c| c == '0')
        .take(SHORT_CODE_LEN)
        .collect();

    let code = if accepted.chars().count() == SHORT_CODE_LEN {
        accepted
    } else {
        let total = hex.chars().count();
        hex.chars()
            .skip(total.saturating_sub(SHORT_CODE_LEN))
            .collect()
    };
    ShortCode(code.to_uppercase())
}

/// Formats an identifier for display: short ones unchanged, long ones as
/// their short code.
pub fn format_room_id(identifier: &str) -> String {
    if identifier.len() <= MIN_CANONICAL_LEN {
        identifier.to_string()
    } else {
        derive_short_code(identifier).0
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Why a short code could not be resolved.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Not connected to server")]
    NotConnected,

    /// The server answered with a failure. Carries its reason.
    #[error("{0}")]
    NotFound(String),

    #[error("Lost connection to server")]
    ChannelClosed,

    #[error(transparent)]
    Messaging(#[from] MessagingError),
}

const NOT_FOUND: &str = "Room code not found";

/// Sends short-code resolution requests over a messaging channel.
pub struct RoomCodeResolver<'a, M> {
    channel: &'a M,
}

impl<'a, M: MessagingChannel> RoomCodeResolver<'a, M> {
    pub fn new(channel: &'a M) -> Self {
        Self { channel }
    }

    /// Emits `resolveRoomCode` and returns without waiting for the answer.
    ///
    /// The subscription is opened before the request goes out so the
    /// reply can't be missed. There is no timeout here; callers wrap
    /// [`PendingResolution::wait`] in whatever bound they need.
    pub fn request_resolution(&self, candidate: &str) -> Result<PendingResolution, ResolveError> {
        if !self.channel.is_connected() {
            return Err(ResolveError::NotConnected);
        }
        let short_code = expand_short_code(candidate);
        let replies = self.channel.subscribe();
        self.channel.emit(ClientEvent::ResolveRoomCode {
            short_code: short_code.clone(),
        })?;
        tracing::debug!(%short_code, "room code resolution requested");
        Ok(PendingResolution {
            short_code,
            replies,
        })
    }
}

/// An in-flight resolution request.
///
/// Dropping it abandons the request; a late answer is then ignored.
#[derive(Debug)]
pub struct PendingResolution {
    short_code: String,
    replies: Subscription,
}

impl PendingResolution {
    /// The cleaned code that was sent.
    pub fn short_code(&self) -> &str {
        &self.short_code
    }

    /// Waits for the server's answer and returns the full identifier.
    ///
    /// Answers echoing a different short code belong to another request
    /// and are skipped. Answers without an echo are taken as ours.
    pub async fn wait(mut self) -> Result<String, ResolveError> {
        while let Some(event) = self.replies.recv().await {
            let ServerEvent::RoomCodeResolved {
                success,
                blockchain_room_id,
                error,
                short_code,
            } = event
            else {
                continue;
            };

            if matches!(&short_code, Some(echo) if !echo.eq_ignore_ascii_case(&self.short_code)) {
                tracing::debug!(
                    expected = %self.short_code,
                    got = ?short_code,
                    "ignoring resolution for another code"
                );
                continue;
            }

            return match blockchain_room_id {
                Some(id) if success && !id.is_empty() => Ok(id),
                _ => Err(ResolveError::NotFound(
                    error
                        .filter(|reason| !reason.is_empty())
                        .unwrap_or_else(|| NOT_FOUND.to_string()),
                )),
            };
        }
        Err(ResolveError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pattiroom_messaging::loopback;
    use rand::Rng;

    fn resolved(id: Option<&str>, error: Option<&str>, echo: Option<&str>) -> ServerEvent {
        ServerEvent::RoomCodeResolved {
            success: id.is_some(),
            blockchain_room_id: id.map(str::to_string),
            error: error.map(str::to_string),
            short_code: echo.map(str::to_string),
        }
    }

    // =======================================================================
    // normalize
    // =======================================================================

    #[test]
    fn test_normalize_canonical_preserves_case() {
        let id = format!("0xABcd{}", "0".repeat(60));
        assert_eq!(normalize(&format!("  {id}\n")), Normalized::Canonical(id));
    }

    #[test]
    fn test_normalize_short_code_is_lowercased() {
        assert_eq!(normalize("A399E5"), Normalized::ShortCode("a399e5".into()));
        assert_eq!(normalize("beef"), Normalized::ShortCode("beef".into()));
    }

    #[test]
    fn test_normalize_rejects_short_or_non_hex() {
        assert_eq!(normalize("abc"), Normalized::Invalid);
        assert_eq!(normalize("a399-e5"), Normalized::Invalid);
        assert_eq!(normalize("zzzzzz"), Normalized::Invalid);
        // `0x` prefix but not long enough to be canonical, and `x` isn't hex.
        assert_eq!(normalize("0x1234"), Normalized::Invalid);
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), Normalized::Empty);
        assert_eq!(normalize(" \t "), Normalized::Empty);
    }

    #[test]
    fn test_expand_short_code_strips_separators() {
        assert_eq!(expand_short_code("A3-99 E5"), "a399e5");
    }

    // =======================================================================
    // derive_short_code / format_room_id
    // =======================================================================

    #[test]
    fn test_derive_skips_leading_zeros() {
        let id = format!("0x0000ab12cd{}", "9".repeat(54));
        assert_eq!(derive_short_code(&id).as_str(), "AB12CD");
    }

    #[test]
    fn test_derive_keeps_inner_zeros() {
        let id = format!("0xa0b00c{}", "1".repeat(58));
        assert_eq!(derive_short_code(&id).as_str(), "A0B00C");
    }

    #[test]
    fn test_derive_all_zeros() {
        let id = format!("0x{}", "0".repeat(64));
        assert_eq!(derive_short_code(&id).as_str(), "000000");
    }

    #[test]
    fn test_derive_falls_back_to_tail() {
        // Only three characters survive the zero skip.
        let id = format!("0x{}abc", "0".repeat(61));
        assert_eq!(derive_short_code(&id).as_str(), "000ABC");
    }

    #[test]
    fn test_derive_random_identifiers_are_six_uppercase_hex() {
        let mut rng = rand::rng();
        for _ in 0..500 {
            let bytes: [u8; 32] = rng.random();
            let mut id = String::from("0x");
            for byte in bytes {
                id.push_str(&format!("{byte:02x}"));
            }
            let code = derive_short_code(&id);
            let code = code.as_str();
            assert_eq!(code.len(), SHORT_CODE_LEN, "{id}");
            assert!(code.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
            assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
            let body_is_zero = id[2..].chars().all(|c| c == '0');
            if !body_is_zero && id[2..].trim_start_matches('0').len() >= SHORT_CODE_LEN {
                assert_ne!(code.as_bytes()[0], b'0', "{id}");
            }
        }
    }

    #[test]
    fn test_format_room_id() {
        assert_eq!(format_room_id("ROOM-1"), "ROOM-1");
        assert_eq!(format_room_id("0x12345678"), "0x12345678");
        let id = format!("0x00a399e5{}", "f".repeat(56));
        assert_eq!(format_room_id(&id), "A399E5");
    }

    // =======================================================================
    // Resolution
    // =======================================================================

    #[tokio::test]
    async fn test_resolution_round_trip() {
        let (channel, mut server) = loopback();
        let resolver = RoomCodeResolver::new(&channel);

        let pending = resolver.request_resolution("A399E5").unwrap();
        assert_eq!(pending.short_code(), "a399e5");
        assert_eq!(
            server.recv().await,
            Some(ClientEvent::ResolveRoomCode {
                short_code: "a399e5".into()
            })
        );

        let id = format!("0x{}", "a".repeat(64));
        server.send(resolved(Some(&id), None, None));
        assert_eq!(pending.wait().await.unwrap(), id);
    }

    #[tokio::test]
    async fn test_resolution_failure_carries_reason() {
        let (channel, server) = loopback();
        let pending = RoomCodeResolver::new(&channel)
            .request_resolution("beef")
            .unwrap();

        server.send(resolved(None, Some("Room expired"), None));
        let err = pending.wait().await.unwrap_err();
        assert!(matches!(&err, ResolveError::NotFound(reason) if reason == "Room expired"));
    }

    #[tokio::test]
    async fn test_resolution_failure_default_reason() {
        let (channel, server) = loopback();
        let pending = RoomCodeResolver::new(&channel)
            .request_resolution("beef")
            .unwrap();

        server.send(resolved(None, None, None));
        let err = pending.wait().await.unwrap_err();
        assert_eq!(err.to_string(), "Room code not found");
    }

    #[tokio::test]
    async fn test_resolution_skips_other_codes_and_events() {
        let (channel, server) = loopback();
        let pending = RoomCodeResolver::new(&channel)
            .request_resolution("a399e5")
            .unwrap();

        let other = format!("0x{}", "b".repeat(64));
        let ours = format!("0x{}", "c".repeat(64));
        server.send(ServerEvent::Error {
            message: "unrelated".into(),
            attempt_id: None,
        });
        server.send(resolved(Some(&other), None, Some("ffffff")));
        server.send(resolved(Some(&ours), None, Some("A399E5")));

        assert_eq!(pending.wait().await.unwrap(), ours);
    }

    #[tokio::test]
    async fn test_resolution_requires_connection() {
        let (channel, server) = loopback();
        server.disconnect();
        let err = RoomCodeResolver::new(&channel)
            .request_resolution("a399e5")
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotConnected));
    }

    #[tokio::test]
    async fn test_resolution_ends_when_connection_drops() {
        let (channel, server) = loopback();
        let pending = RoomCodeResolver::new(&channel)
            .request_resolution("a399e5")
            .unwrap();

        server.disconnect();
        assert!(matches!(
            pending.wait().await,
            Err(ResolveError::ChannelClosed)
        ));
    }
}
