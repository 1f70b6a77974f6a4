//! Wire protocol for Pattiroom.
//!
//! This crate defines the vocabulary the join client shares with the
//! chain bindings and the realtime game server:
//!
//! - **Identifiers** ([`RoomIdentifier`], [`ShortCode`], [`AttemptId`],
//!   [`Address`], [`TxHash`], [`SessionId`]) — newtypes so a transaction
//!   hash can never be passed where a room id is expected.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]) — the named events that
//!   travel over the messaging channel.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how events are turned
//!   into bytes and back.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Messaging (bytes / events) → Protocol (typed events) → Join (state machine)
//! ```

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, ServerEvent};
pub use types::{
    Address, AttemptId, RoomIdentifier, SessionId, ShortCode, TxHash,
    CANONICAL_PREFIX, ROOM_ID_HEX_LEN,
};
