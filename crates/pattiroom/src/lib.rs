//! # Pattiroom
//!
//! Client core for joining blockchain-backed card tables.
//!
//! A join commits tokens on chain and then asks the game server to seat
//! the player. [`JoinOrchestrator`](pattiroom_join::JoinOrchestrator)
//! sequences both; the wallet, contract and server connection are
//! capabilities you hand it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pattiroom::prelude::*;
//!
//! # async fn run<W: WalletProvider, C: RoomContract>(wallet: W, contract: C) -> Result<(), PattiroomError> {
//! let channel = WebSocketChannel::connect("ws://127.0.0.1:3001").await?;
//! let mut join = JoinOrchestrator::new(wallet, contract, channel, JoinConfig::default());
//!
//! let details = join.submit("A399E5").await?;
//! println!("buy-in: {} tokens", details.buy_in);
//!
//! let outcome = join.confirm().await?;
//! println!("seated in session {:?}", outcome.session_id);
//! # Ok(())
//! # }
//! ```

mod error;
pub mod telemetry;

pub use error::PattiroomError;

pub use pattiroom_chain as chain;
pub use pattiroom_join as join;
pub use pattiroom_messaging as messaging;
pub use pattiroom_protocol as protocol;

pub mod prelude {
    pub use crate::PattiroomError;
    pub use pattiroom_chain::{
        ChainError, OnChainRoomState, RoomContract, RoomDetails, TokenAmount, WalletProvider,
    };
    pub use pattiroom_join::{
        JoinAttempt, JoinConfig, JoinControl, JoinError, JoinErrorKind, JoinFailure,
        JoinOrchestrator, JoinOutcome, JoinState, derive_short_code, format_room_id, normalize,
    };
    #[cfg(feature = "websocket")]
    pub use pattiroom_messaging::WebSocketChannel;
    pub use pattiroom_messaging::{
        LoopbackChannel, LoopbackPeer, MessagingChannel, Offline, loopback,
    };
    pub use pattiroom_protocol::{
        Address, AttemptId, ClientEvent, RoomIdentifier, ServerEvent, SessionId, ShortCode, TxHash,
    };
}
