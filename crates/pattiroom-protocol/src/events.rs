//! Named events exchanged with the realtime game server.
//!
//! The server speaks a socket.io-style protocol: every frame is an event
//! name plus a JSON payload. `#[serde(tag = "event", content = "data")]`
//! produces exactly that shape:
//!
//! ```text
//! { "event": "resolveRoomCode", "data": { "shortCode": "a399e5" } }
//! ```
//!
//! Payload fields are camelCase on the wire to match the JavaScript server.

use serde::{Deserialize, Serialize};

use crate::{Address, AttemptId, RoomIdentifier, SessionId, TxHash};

/// Client → server events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// "Which room does this short code belong to?"
    /// `short_code` is the cleaned, lowercased candidate.
    ResolveRoomCode { short_code: String },

    /// "I joined this room on chain, here's the proof."
    ///
    /// `token_balance` and `buy_in_tokens` are in token units (not base
    /// units); the server seeds the player's chip stack from the buy-in.
    JoinRoomWithBlockchain {
        blockchain_room_id: RoomIdentifier,
        player: Address,
        tx_hash: TxHash,
        token_balance: f64,
        buy_in_tokens: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attempt_id: Option<AttemptId>,
    },
}

impl ClientEvent {
    /// The event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ResolveRoomCode { .. } => "resolveRoomCode",
            Self::JoinRoomWithBlockchain { .. } => "joinRoomWithBlockchain",
        }
    }
}

/// Server → client events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Answer to [`ClientEvent::ResolveRoomCode`].
    ///
    /// `blockchain_room_id` is kept as a raw string: validating it is the
    /// orchestrator's job, and a bad id there is an `InvalidInput`
    /// failure, not a decode error.
    RoomCodeResolved {
        success: bool,
        #[serde(default)]
        blockchain_room_id: Option<String>,
        #[serde(default)]
        error: Option<String>,
        /// Echo of the requested code, when the server provides one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        short_code: Option<String>,
    },

    /// The server admitted the player; `room_id` is the session id.
    RoomJoined {
        room_id: SessionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attempt_id: Option<AttemptId>,
    },

    /// The server refused a request.
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attempt_id: Option<AttemptId>,
    },
}

impl ServerEvent {
    /// The event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomCodeResolved { .. } => "roomCodeResolved",
            Self::RoomJoined { .. } => "roomJoined",
            Self::Error { .. } => "error",
        }
    }

    /// The attempt id echoed by the server, if any.
    pub fn attempt_id(&self) -> Option<AttemptId> {
        match self {
            Self::RoomJoined { attempt_id, .. }
            | Self::Error { attempt_id, .. } => *attempt_id,
            Self::RoomCodeResolved { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    //! The server is a JavaScript process, so the exact JSON shape is the
    //! contract. These tests pin it down.

    use super::*;

    fn room_id() -> RoomIdentifier {
        RoomIdentifier::parse(&format!("0x{}", "0".repeat(58) + "a399e5"))
            .unwrap()
    }

    #[test]
    fn test_resolve_room_code_json_format() {
        let event = ClientEvent::ResolveRoomCode {
            short_code: "a399e5".into(),
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "resolveRoomCode");
        assert_eq!(json["data"]["shortCode"], "a399e5");
        assert_eq!(event.name(), "resolveRoomCode");
    }

    #[test]
    fn test_join_room_with_blockchain_json_format() {
        let event = ClientEvent::JoinRoomWithBlockchain {
            blockchain_room_id: room_id(),
            player: Address("0xplayer".into()),
            tx_hash: TxHash("0xjoin".into()),
            token_balance: 250.5,
            buy_in_tokens: 100.0,
            attempt_id: Some(AttemptId(3)),
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "joinRoomWithBlockchain");
        let data = &json["data"];
        assert_eq!(data["blockchainRoomId"], room_id().as_str());
        assert_eq!(data["player"], "0xplayer");
        assert_eq!(data["txHash"], "0xjoin");
        assert_eq!(data["tokenBalance"], 250.5);
        assert_eq!(data["buyInTokens"], 100.0);
        assert_eq!(data["attemptId"], 3);
    }

    #[test]
    fn test_join_notification_omits_missing_attempt_id() {
        let event = ClientEvent::JoinRoomWithBlockchain {
            blockchain_room_id: room_id(),
            player: Address("0xplayer".into()),
            tx_hash: TxHash("0xjoin".into()),
            token_balance: 0.0,
            buy_in_tokens: 1.0,
            attempt_id: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json["data"].get("attemptId").is_none());
    }

    #[test]
    fn test_room_code_resolved_parses_server_payload() {
        let json = r#"{
            "event": "roomCodeResolved",
            "data": { "success": true, "blockchainRoomId": "0xabc" }
        }"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();

        assert_eq!(
            event,
            ServerEvent::RoomCodeResolved {
                success: true,
                blockchain_room_id: Some("0xabc".into()),
                error: None,
                short_code: None,
            }
        );
    }

    #[test]
    fn test_room_code_failure_parses_without_id() {
        let json = r#"{
            "event": "roomCodeResolved",
            "data": { "success": false, "error": "Room code not found" }
        }"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();

        match event {
            ServerEvent::RoomCodeResolved {
                success,
                blockchain_room_id,
                error,
                ..
            } => {
                assert!(!success);
                assert!(blockchain_room_id.is_none());
                assert_eq!(error.as_deref(), Some("Room code not found"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_room_joined_without_attempt_echo() {
        let json = r#"{ "event": "roomJoined", "data": { "roomId": "sess-9" } }"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.name(), "roomJoined");
        assert_eq!(event.attempt_id(), None);
        assert!(matches!(
            event,
            ServerEvent::RoomJoined { ref room_id, .. } if room_id.0 == "sess-9"
        ));
    }

    #[test]
    fn test_error_event_with_attempt_echo() {
        let json = r#"{
            "event": "error",
            "data": { "message": "Transaction not found", "attemptId": 4 }
        }"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.attempt_id(), Some(AttemptId(4)));
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let json = r#"{ "event": "gameState", "data": {} }"#;
        assert!(serde_json::from_str::<ServerEvent>(json).is_err());
    }
}
