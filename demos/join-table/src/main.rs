//! Joins a table end to end against an in-process chain and game server.
//!
//! ```text
//! cargo run -p join-table              # join the seeded table by short code
//! cargo run -p join-table -- 0x00…     # or by full room id
//! RUST_LOG=debug cargo run -p join-table
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pattiroom::prelude::*;

const GAME_CONTRACT: &str = "0x5afe00000000000000000000000000000000c0de";
const PLAYER: &str = "0x7e57000000000000000000000000000000000001";
const CHAIN_LATENCY: Duration = Duration::from_millis(150);

// ---------------------------------------------------------------------------
// Simulated chain
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Ledger {
    rooms: HashMap<RoomIdentifier, RoomDetails>,
    seated: Vec<(RoomIdentifier, Address)>,
    allowance: TokenAmount,
    balance: TokenAmount,
    next_tx: u64,
}

impl Ledger {
    fn tx(&mut self) -> TxHash {
        self.next_tx += 1;
        TxHash(format!("0x{:064x}", self.next_tx))
    }
}

/// One account on one game contract, all in memory.
#[derive(Clone)]
struct SimChain {
    account: Address,
    ledger: Arc<Mutex<Ledger>>,
}

impl SimChain {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Ledger>, ChainError> {
        self.ledger
            .lock()
            .map_err(|_| ChainError::Read("ledger poisoned".into()))
    }
}

impl WalletProvider for SimChain {
    fn account(&self) -> Option<Address> {
        Some(self.account.clone())
    }

    async fn token_balance(&self, _account: &Address) -> Result<TokenAmount, ChainError> {
        Ok(self.lock()?.balance)
    }
}

impl RoomContract for SimChain {
    fn game_address(&self) -> Address {
        Address(GAME_CONTRACT.into())
    }

    async fn room_details(
        &self,
        room_id: &RoomIdentifier,
    ) -> Result<Option<RoomDetails>, ChainError> {
        tokio::time::sleep(CHAIN_LATENCY).await;
        Ok(self.lock()?.rooms.get(room_id).cloned())
    }

    async fn approve_tokens(
        &self,
        _spender: &Address,
        amount: TokenAmount,
    ) -> Result<TxHash, ChainError> {
        tokio::time::sleep(CHAIN_LATENCY).await;
        let mut ledger = self.lock()?;
        if ledger.balance < amount {
            return Err(ChainError::Transaction(
                "execution reverted: insufficient funds".into(),
            ));
        }
        ledger.allowance = amount;
        Ok(ledger.tx())
    }

    async fn join_room(&self, room_id: &RoomIdentifier) -> Result<TxHash, ChainError> {
        tokio::time::sleep(CHAIN_LATENCY).await;
        let mut ledger = self.lock()?;
        let Some(room) = ledger.rooms.get(room_id).cloned() else {
            return Err(ChainError::Transaction("execution reverted: Room not found".into()));
        };
        if ledger.seated.contains(&(room_id.clone(), self.account.clone())) {
            return Err(ChainError::Transaction("execution reverted: Already joined".into()));
        }
        if room.is_full() {
            return Err(ChainError::Transaction("execution reverted: Room is full".into()));
        }
        if ledger.allowance < room.buy_in {
            return Err(ChainError::Transaction(
                "execution reverted: insufficient allowance".into(),
            ));
        }

        ledger.allowance = TokenAmount(ledger.allowance.0 - room.buy_in.0);
        ledger.balance = TokenAmount(ledger.balance.0.saturating_sub(room.buy_in.0));
        if let Some(room) = ledger.rooms.get_mut(room_id) {
            room.current_players += 1;
            room.pot = TokenAmount(room.pot.0 + room.buy_in.0);
        }
        ledger.seated.push((room_id.clone(), self.account.clone()));
        Ok(ledger.tx())
    }
}

// ---------------------------------------------------------------------------
// Simulated game server
// ---------------------------------------------------------------------------

/// Answers resolution requests from the known rooms and seats every
/// player who reports an on-chain join.
async fn serve(mut peer: LoopbackPeer, rooms: Vec<RoomIdentifier>) {
    let mut sessions = 0u64;
    while let Some(event) = peer.recv().await {
        let reply = match event {
            ClientEvent::ResolveRoomCode { short_code } => {
                let found = rooms.iter().find(|id| {
                    derive_short_code(id.as_str())
                        .as_str()
                        .eq_ignore_ascii_case(&short_code)
                });
                ServerEvent::RoomCodeResolved {
                    success: found.is_some(),
                    blockchain_room_id: found.map(|id| id.to_string()),
                    error: None,
                    short_code: Some(short_code),
                }
            }
            ClientEvent::JoinRoomWithBlockchain {
                blockchain_room_id,
                player,
                buy_in_tokens,
                attempt_id,
                ..
            } => {
                sessions += 1;
                tracing::info!(%player, room = %format_room_id(blockchain_room_id.as_str()), buy_in_tokens, "server: seating player");
                ServerEvent::RoomJoined {
                    room_id: SessionId(format!("table-{sessions}")),
                    attempt_id,
                }
            }
        };
        peer.send(reply);
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), PattiroomError> {
    pattiroom::telemetry::init("join_table=info,pattiroom_join=info");

    let table = RoomIdentifier::parse(&format!("0x0000a399e5{}", "7".repeat(54)))?;
    let mut ledger = Ledger {
        balance: TokenAmount::from_tokens(500, 18),
        ..Ledger::default()
    };
    ledger.rooms.insert(
        table.clone(),
        RoomDetails {
            buy_in: TokenAmount::from_tokens(100, 18),
            pot: TokenAmount::from_tokens(200, 18),
            current_players: 2,
            max_players: 6,
            state: OnChainRoomState::Waiting,
        },
    );
    let chain = SimChain {
        account: Address(PLAYER.into()),
        ledger: Arc::new(Mutex::new(ledger)),
    };

    let (channel, peer) = loopback();
    let server = tokio::spawn(serve(peer, vec![table.clone()]));

    let input = std::env::args()
        .nth(1)
        .unwrap_or_else(|| derive_short_code(table.as_str()).to_string());

    let mut join = JoinOrchestrator::new(chain.clone(), chain, channel, JoinConfig::default());
    let mut progress = join.control();
    let watcher = tokio::spawn(async move {
        while let Some(attempt) = progress.changed().await {
            tracing::info!(attempt_id = %attempt.id, state = %attempt.state, "progress");
        }
    });

    let details = join.submit(&input).await?;
    tracing::info!(
        room = %format_room_id(table.as_str()),
        buy_in = %details.buy_in,
        pot = %details.pot,
        seats_left = details.seats_left(),
        "room loaded, confirming"
    );

    let outcome = join.confirm().await?;
    tracing::info!(
        session = ?outcome.session_id,
        approval_tx = %outcome.approval_tx,
        join_tx = %outcome.join_tx,
        "joined"
    );

    drop(join);
    let _ = watcher.await;
    server.abort();
    Ok(())
}
