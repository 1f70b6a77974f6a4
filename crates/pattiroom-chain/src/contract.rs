//! Capability traits for the wallet and the game contract.
//!
//! The orchestrator receives implementations of these at construction
//! instead of reaching for ambient globals. In production they wrap the
//! real wallet and contract bindings; in tests they are scripted fakes.
//!
//! Both traits return `impl Future + Send` so the orchestrator's futures
//! stay `Send` and can be spawned on a multi-threaded runtime.
//! Implementors can still just write `async fn`.

use std::future::Future;

use pattiroom_protocol::{Address, RoomIdentifier, TxHash};

use crate::{ChainError, RoomDetails, TokenAmount};

/// The connected wallet.
///
/// # Example
///
/// ```rust
/// use pattiroom_chain::{ChainError, TokenAmount, WalletProvider};
/// use pattiroom_protocol::Address;
///
/// /// A wallet that is always connected and always broke.
/// struct EmptyWallet;
///
/// impl WalletProvider for EmptyWallet {
///     fn account(&self) -> Option<Address> {
///         Some(Address("0x0000000000000000000000000000000000000001".into()))
///     }
///
///     async fn token_balance(
///         &self,
///         _account: &Address,
///     ) -> Result<TokenAmount, ChainError> {
///         Ok(TokenAmount(0))
///     }
/// }
/// ```
pub trait WalletProvider: Send + Sync + 'static {
    /// The connected account, or `None` if no wallet is connected.
    fn account(&self) -> Option<Address>;

    /// The account's game-token balance in base units.
    fn token_balance(
        &self,
        account: &Address,
    ) -> impl Future<Output = Result<TokenAmount, ChainError>> + Send;
}

/// Bindings to the game contract (and the token contract it spends from).
pub trait RoomContract: Send + Sync + 'static {
    /// Address of the game contract. This is the spender that token
    /// approvals are granted to.
    fn game_address(&self) -> Address;

    /// Reads a room. `Ok(None)` means the room doesn't exist.
    fn room_details(
        &self,
        room_id: &RoomIdentifier,
    ) -> impl Future<Output = Result<Option<RoomDetails>, ChainError>> + Send;

    /// Approves `spender` to move `amount` tokens from the connected
    /// account. Resolves once the approval is mined.
    fn approve_tokens(
        &self,
        spender: &Address,
        amount: TokenAmount,
    ) -> impl Future<Output = Result<TxHash, ChainError>> + Send;

    /// Joins the room on chain. Resolves once the transaction is mined.
    /// Requires a prior approval covering the buy-in.
    fn join_room(
        &self,
        room_id: &RoomIdentifier,
    ) -> impl Future<Output = Result<TxHash, ChainError>> + Send;
}
