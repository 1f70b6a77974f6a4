//! Chain-facing capability interfaces for Pattiroom.
//!
//! The join client never talks to a node directly. Wallet connectivity and
//! contract bindings live outside this workspace (in the browser, in a
//! signer service, in a test fake) and are handed to the orchestrator as
//! two traits:
//!
//! 1. [`WalletProvider`] — who is connected, and what they hold
//! 2. [`RoomContract`] — read room details, approve tokens, join a room
//!
//! Plus the values those calls return: [`RoomDetails`], [`TokenAmount`],
//! and [`ChainError`].

mod contract;
mod details;
mod error;
mod units;

pub use contract::{RoomContract, WalletProvider};
pub use details::{DetailsError, OnChainRoomState, RoomDetails};
pub use error::ChainError;
pub use units::{MAX_DECIMALS, TOKEN_DECIMALS, TokenAmount};
