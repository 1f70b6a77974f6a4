//! The join orchestrator: drives one attempt from raw input to a seat.
//!
//! ```text
//!  submit(input)                               confirm()
//!  ─────────────                               ─────────
//!  normalize ─► resolve code ─► room_details   approve_tokens ─► join_room
//!                    (server)      (chain)          (chain)        (chain)
//!                                                                    │
//!                                      joinRoomWithBlockchain ◄──────┘
//!                                              (server)
//!                                                 │
//!                              roomJoined / error ┘
//! ```
//!
//! The attempt lives in a `watch` channel. The orchestrator is its only
//! writer apart from cancellation, which goes through [`JoinControl`] so
//! the UI can cancel while `submit`/`confirm` are suspended. Each wait on
//! the server races a cancellation future scoped to the attempt id; when
//! the wait ends, its subscription is dropped with it.

use std::future::Future;
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use pattiroom_chain::{RoomContract, RoomDetails, TokenAmount, WalletProvider};
use pattiroom_messaging::{MessagingChannel, Offline, Subscription};
use pattiroom_protocol::{AttemptId, ClientEvent, RoomIdentifier, ServerEvent, SessionId};
use tokio::sync::watch;

use crate::{
    JoinAttempt, JoinConfig, JoinError, JoinErrorKind, JoinFailure, JoinOutcome, JoinState,
    Normalized, RoomCodeResolver, classify_approval_failure, classify_join_failure, normalize,
};

static NEXT_ATTEMPT_ID: AtomicU64 = AtomicU64::new(1);

fn next_attempt_id() -> AttemptId {
    AttemptId(NEXT_ATTEMPT_ID.fetch_add(1, Ordering::Relaxed))
}

const EMPTY_INPUT: &str = "Please enter a room code";
const ROOM_NOT_FOUND: &str = "Room not found on blockchain";
const DETAILS_READ_FAILED: &str = "Failed to fetch room details";
const SERVER_LOST: &str = "Lost connection to the game server";
const APPROVAL_UNKNOWN: &str = "Token approval outcome unknown";
const JOIN_UNKNOWN: &str = "Join transaction outcome unknown";

// ---------------------------------------------------------------------------
// JoinOrchestrator
// ---------------------------------------------------------------------------

/// Sequences a room join across the chain and the game server.
///
/// `submit` and `confirm` take `&mut self`, so only one of them runs at a
/// time. Use [`control`](Self::control) to observe or cancel from
/// elsewhere while one is suspended.
pub struct JoinOrchestrator<W, C, M = Offline> {
    wallet: W,
    contract: C,
    channel: M,
    config: JoinConfig,
    attempt: Arc<watch::Sender<JoinAttempt>>,
}

impl<W: WalletProvider, C: RoomContract> JoinOrchestrator<W, C, Offline> {
    /// An orchestrator with no game server; joins complete on chain.
    pub fn offline(wallet: W, contract: C, config: JoinConfig) -> Self {
        Self::new(wallet, contract, Offline, config)
    }
}

impl<W, C, M> JoinOrchestrator<W, C, M>
where
    W: WalletProvider,
    C: RoomContract,
    M: MessagingChannel,
{
    pub fn new(wallet: W, contract: C, channel: M, config: JoinConfig) -> Self {
        let (attempt, _) = watch::channel(JoinAttempt::new(next_attempt_id(), ""));
        Self {
            wallet,
            contract,
            channel,
            config,
            attempt: Arc::new(attempt),
        }
    }

    pub fn config(&self) -> &JoinConfig {
        &self.config
    }

    /// A copy of the current attempt.
    pub fn snapshot(&self) -> JoinAttempt {
        self.attempt.borrow().clone()
    }

    /// A handle for observing and cancelling attempts.
    pub fn control(&self) -> JoinControl {
        JoinControl {
            attempt: Arc::downgrade(&self.attempt),
            updates: self.attempt.subscribe(),
        }
    }

    /// Cancels the current attempt.
    ///
    /// # Errors
    /// - [`JoinError::CancelBlocked`] — a transaction is in flight
    /// - [`JoinError::InvalidState`] — the attempt already ended
    pub fn cancel(&self) -> Result<(), JoinError> {
        request_cancel(&self.attempt)
    }

    /// Closes the join flow: cancels a live attempt and starts over with a
    /// fresh `Idle` one.
    ///
    /// Refused while a transaction is in flight.
    pub fn close(&mut self) -> Result<(), JoinError> {
        let state = self.attempt.borrow().state;
        if state.has_transaction_in_flight() {
            return Err(JoinError::CancelBlocked(state));
        }
        if !state.is_terminal() {
            request_cancel(&self.attempt)?;
        }
        let id = next_attempt_id();
        self.attempt.send_replace(JoinAttempt::new(id, ""));
        tracing::debug!(attempt_id = %id, "join flow reset");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // submit
    // -----------------------------------------------------------------------

    /// Starts a new attempt from user input and loads the room.
    ///
    /// Short codes are resolved through the game server first; canonical
    /// identifiers go straight to the chain. On success the attempt is in
    /// `DetailsReady` and the details are returned for the user to
    /// confirm.
    ///
    /// Allowed from `Idle`, `DetailsReady` (re-entering a code) and any
    /// terminal state.
    pub async fn submit(&mut self, input: &str) -> Result<RoomDetails, JoinError> {
        let current = self.attempt.borrow().state;
        if !matches!(current, JoinState::Idle | JoinState::DetailsReady) && !current.is_terminal() {
            return Err(JoinError::InvalidState {
                action: "submit",
                state: current,
            });
        }

        let id = next_attempt_id();
        self.attempt.send_replace(JoinAttempt::new(id, input));
        tracing::info!(attempt_id = %id, input = %input.trim(), "join attempt started");

        let room_id = self.resolve_input(id, input).await?;
        self.advance(id, JoinState::Idle, JoinState::DetailsLoading, |attempt| {
            attempt.room_id = Some(room_id.clone());
        })?;

        let read = tokio::select! {
            biased;
            _ = cancelled(self.attempt.subscribe(), id) => return Err(JoinError::Cancelled(id)),
            read = self.contract.room_details(&room_id) => read,
        };
        let details = match read {
            Ok(Some(details)) => details,
            Ok(None) => {
                return Err(self.fail(
                    id,
                    JoinFailure::new(JoinErrorKind::RoomUnavailable, ROOM_NOT_FOUND),
                ));
            }
            Err(err) => {
                return Err(self.fail(
                    id,
                    JoinFailure::new(JoinErrorKind::RoomUnavailable, DETAILS_READ_FAILED)
                        .with_raw(err.to_string()),
                ));
            }
        };
        if let Err(reason) = details.validate() {
            return Err(self.fail(
                id,
                JoinFailure::new(JoinErrorKind::RoomUnavailable, reason.to_string())
                    .with_raw(format!("{details:?}")),
            ));
        }

        self.advance(id, JoinState::DetailsLoading, JoinState::DetailsReady, |attempt| {
            attempt.details = Some(details.clone());
        })?;
        Ok(details)
    }

    /// Turns input into a room identifier, asking the server when needed.
    async fn resolve_input(&self, id: AttemptId, input: &str) -> Result<RoomIdentifier, JoinError> {
        let code = match normalize(input) {
            Normalized::Empty => {
                return Err(self.fail(
                    id,
                    JoinFailure::new(JoinErrorKind::InvalidInput, EMPTY_INPUT),
                ));
            }
            Normalized::Invalid => {
                return Err(self.fail(id, JoinFailure::from_kind(JoinErrorKind::InvalidInput)));
            }
            Normalized::Canonical(raw) => return self.parse_room_id(id, &raw),
            Normalized::ShortCode(code) => code,
        };

        let cancel = cancelled(self.attempt.subscribe(), id);
        let pending = match RoomCodeResolver::new(&self.channel).request_resolution(&code) {
            Ok(pending) => pending,
            Err(err) => {
                return Err(self.fail(
                    id,
                    JoinFailure::new(JoinErrorKind::InvalidInput, err.to_string()),
                ));
            }
        };
        self.attempt.send_if_modified(|attempt| {
            let mine = attempt.id == id && attempt.state == JoinState::Idle;
            if mine {
                attempt.resolving = true;
            }
            mine
        });

        let answer = tokio::select! {
            biased;
            _ = cancel => return Err(JoinError::Cancelled(id)),
            answer = tokio::time::timeout(self.config.resolution_timeout, pending.wait()) => answer,
        };
        self.attempt.send_if_modified(|attempt| {
            let mine = attempt.id == id && attempt.resolving;
            if mine {
                attempt.resolving = false;
            }
            mine
        });

        match answer {
            Ok(Ok(raw)) => self.parse_room_id(id, &raw),
            Ok(Err(err)) => Err(self.fail(
                id,
                JoinFailure::new(JoinErrorKind::InvalidInput, err.to_string()),
            )),
            Err(_) => Err(self.fail(id, JoinFailure::from_kind(JoinErrorKind::Timeout))),
        }
    }

    fn parse_room_id(&self, id: AttemptId, raw: &str) -> Result<RoomIdentifier, JoinError> {
        RoomIdentifier::parse(raw).map_err(|err| {
            self.fail(
                id,
                JoinFailure::from_kind(JoinErrorKind::InvalidInput).with_raw(err.to_string()),
            )
        })
    }

    // -----------------------------------------------------------------------
    // confirm
    // -----------------------------------------------------------------------

    /// Commits to the loaded room: approve, join on chain, then wait for
    /// the game server to admit the player.
    ///
    /// Approval always completes before the join is submitted, and each
    /// transaction is submitted at most once. Nothing is retried.
    ///
    /// With no server connected, or if the server can't be notified, the
    /// attempt succeeds on the on-chain join alone and the outcome has no
    /// session id.
    ///
    /// Dropping the future while a transaction is in flight ends the
    /// attempt: `Succeeded` if the join transaction had already returned,
    /// otherwise `Failed` with the outcome unknown. Hashes seen so far
    /// stay on the attempt.
    pub async fn confirm(&mut self) -> Result<JoinOutcome, JoinError> {
        let (id, room_id, details) = {
            let attempt = self.attempt.borrow();
            let invalid = JoinError::InvalidState {
                action: "confirm",
                state: attempt.state,
            };
            if attempt.state != JoinState::DetailsReady {
                return Err(invalid);
            }
            match (&attempt.room_id, &attempt.details) {
                (Some(room_id), Some(details)) => (attempt.id, room_id.clone(), details.clone()),
                _ => return Err(invalid),
            }
        };

        let Some(player) = self.wallet.account() else {
            return Err(self.fail(id, JoinFailure::from_kind(JoinErrorKind::NotConnected)));
        };

        // Approval.
        self.advance(id, JoinState::DetailsReady, JoinState::Approving, |_| {})?;
        let _in_flight = InFlight {
            attempt: &self.attempt,
            id,
        };
        let spender = self.contract.game_address();
        let approval_tx = match self.contract.approve_tokens(&spender, details.buy_in).await {
            Ok(tx) => tx,
            Err(err) => return Err(self.fail(id, classify_approval_failure(&err.to_string()))),
        };
        self.advance(id, JoinState::Approving, JoinState::JoiningOnChain, |attempt| {
            attempt.approval_tx = Some(approval_tx.clone());
        })?;

        // On-chain join.
        let join_tx = match self.contract.join_room(&room_id).await {
            Ok(tx) => tx,
            Err(err) => return Err(self.fail(id, classify_join_failure(&err.to_string()))),
        };
        // Recorded before anything else can suspend, so a dropped future
        // still knows the join went through.
        self.attempt.send_if_modified(|attempt| {
            let mine = attempt.id == id && attempt.state == JoinState::JoiningOnChain;
            if mine {
                attempt.join_tx = Some(join_tx.clone());
            }
            mine
        });
        let mut outcome = JoinOutcome {
            attempt_id: id,
            room_id: room_id.clone(),
            session_id: None,
            approval_tx,
            join_tx: join_tx.clone(),
        };

        if !self.channel.is_connected() {
            tracing::info!(attempt_id = %id, "no game server connected, joined on chain only");
            self.advance(id, JoinState::JoiningOnChain, JoinState::Succeeded, |_| {})?;
            return Ok(outcome);
        }

        // Server confirmation. Subscribe before emitting so the answer
        // can't arrive unobserved.
        let mut replies = self.channel.subscribe();
        let balance = match self.wallet.token_balance(&player).await {
            Ok(balance) => balance,
            Err(err) => {
                tracing::warn!(attempt_id = %id, error = %err, "token balance unreadable, reporting 0");
                TokenAmount(0)
            }
        };
        let decimals = self.config.token_decimals;
        let notice = ClientEvent::JoinRoomWithBlockchain {
            blockchain_room_id: room_id.clone(),
            player,
            tx_hash: join_tx.clone(),
            token_balance: balance.to_units_f64(decimals),
            buy_in_tokens: details.buy_in.to_units_f64(decimals),
            attempt_id: Some(id),
        };
        if let Err(err) = self.channel.emit(notice) {
            tracing::warn!(attempt_id = %id, error = %err, "game server not notified, joined on chain only");
            self.advance(id, JoinState::JoiningOnChain, JoinState::Succeeded, |_| {})?;
            return Ok(outcome);
        }
        tracing::debug!(attempt_id = %id, %room_id, "sent joinRoomWithBlockchain");

        self.advance(
            id,
            JoinState::JoiningOnChain,
            JoinState::AwaitingServerConfirmation,
            |_| {},
        )?;

        let reply = tokio::select! {
            biased;
            _ = cancelled(self.attempt.subscribe(), id) => return Err(JoinError::Cancelled(id)),
            reply = within(self.config.confirmation_timeout, await_session(&mut replies, id)) => reply,
        };
        drop(replies);

        match reply {
            Some(Ok(session_id)) => {
                self.advance(
                    id,
                    JoinState::AwaitingServerConfirmation,
                    JoinState::Succeeded,
                    |attempt| attempt.session_id = Some(session_id.clone()),
                )?;
                tracing::info!(attempt_id = %id, %session_id, "game server admitted player");
                outcome.session_id = Some(session_id);
                Ok(outcome)
            }
            Some(Err(failure)) => Err(self.fail(id, failure)),
            None => Err(self.fail(id, JoinFailure::from_kind(JoinErrorKind::Timeout))),
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Moves attempt `id` from `from` to `to`, applying `update` in the
    /// same step.
    ///
    /// Fails if the attempt was replaced, cancelled, or isn't in `from`.
    fn advance(
        &self,
        id: AttemptId,
        from: JoinState,
        to: JoinState,
        update: impl FnOnce(&mut JoinAttempt),
    ) -> Result<(), JoinError> {
        let mut refused = None;
        self.attempt.send_if_modified(|attempt| {
            if attempt.id != id || attempt.state == JoinState::Cancelled {
                refused = Some(JoinError::Cancelled(id));
                return false;
            }
            if attempt.state != from || !from.can_transition_to(to) {
                refused = Some(JoinError::InvalidState {
                    action: "advance",
                    state: attempt.state,
                });
                return false;
            }
            attempt.state = to;
            update(attempt);
            true
        });
        match refused {
            Some(err) => Err(err),
            None => {
                tracing::info!(attempt_id = %id, %from, %to, "join state changed");
                Ok(())
            }
        }
    }

    /// Ends attempt `id` with `failure` and returns the error to hand back.
    ///
    /// If the attempt was cancelled in the meantime, that wins.
    fn fail(&self, id: AttemptId, failure: JoinFailure) -> JoinError {
        let state = JoinState::Failed(failure.kind);
        let mut recorded = false;
        self.attempt.send_if_modified(|attempt| {
            if attempt.id != id || !attempt.state.can_transition_to(state) {
                return false;
            }
            attempt.state = state;
            attempt.resolving = false;
            attempt.error = Some(failure.clone());
            recorded = true;
            true
        });
        if !recorded {
            return JoinError::Cancelled(id);
        }
        tracing::warn!(
            attempt_id = %id,
            kind = %failure.kind,
            message = %failure.message,
            raw = ?failure.raw,
            "join attempt failed"
        );
        JoinError::Failed(failure)
    }
}

/// Ends attempt `id` if `confirm` is dropped with a transaction in flight.
///
/// A no-op once the attempt has left `Approving`/`JoiningOnChain`.
struct InFlight<'a> {
    attempt: &'a watch::Sender<JoinAttempt>,
    id: AttemptId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let id = self.id;
        let mut ended = None;
        self.attempt.send_if_modified(|attempt| {
            if attempt.id != id || !attempt.state.has_transaction_in_flight() {
                return false;
            }
            let state = match (attempt.state, attempt.join_tx.is_some()) {
                (JoinState::JoiningOnChain, true) => JoinState::Succeeded,
                (JoinState::JoiningOnChain, false) => {
                    attempt.error = Some(JoinFailure::new(JoinErrorKind::JoinError, JOIN_UNKNOWN));
                    JoinState::Failed(JoinErrorKind::JoinError)
                }
                _ => {
                    attempt.error =
                        Some(JoinFailure::new(JoinErrorKind::ApprovalError, APPROVAL_UNKNOWN));
                    JoinState::Failed(JoinErrorKind::ApprovalError)
                }
            };
            ended = Some((attempt.state, state));
            attempt.state = state;
            true
        });
        if let Some((from, to)) = ended {
            tracing::warn!(attempt_id = %id, %from, %to, "confirm dropped with a transaction in flight");
        }
    }
}

// ---------------------------------------------------------------------------
// JoinControl
// ---------------------------------------------------------------------------

/// A cloneable handle to an orchestrator's attempt.
///
/// Lets the UI watch progress and cancel while `submit` or `confirm` is
/// suspended. Holds no strong reference: once the orchestrator is dropped
/// the handle only reports the last attempt it saw.
#[derive(Debug, Clone)]
pub struct JoinControl {
    attempt: Weak<watch::Sender<JoinAttempt>>,
    updates: watch::Receiver<JoinAttempt>,
}

impl JoinControl {
    pub fn snapshot(&self) -> JoinAttempt {
        self.updates.borrow().clone()
    }

    /// Cancels the current attempt. Same rules as
    /// [`JoinOrchestrator::cancel`].
    pub fn cancel(&self) -> Result<(), JoinError> {
        match self.attempt.upgrade() {
            Some(attempt) => request_cancel(&attempt),
            None => Err(JoinError::InvalidState {
                action: "cancel",
                state: self.updates.borrow().state,
            }),
        }
    }

    /// Waits for the next change and returns the new attempt.
    ///
    /// Returns `None` once the orchestrator is gone.
    pub async fn changed(&mut self) -> Option<JoinAttempt> {
        self.updates.changed().await.ok()?;
        Some(self.updates.borrow_and_update().clone())
    }
}

fn request_cancel(attempt: &watch::Sender<JoinAttempt>) -> Result<(), JoinError> {
    let mut outcome = Ok(());
    let mut cancelled_id = None;
    attempt.send_if_modified(|attempt| {
        let state = attempt.state;
        if state.has_transaction_in_flight() {
            outcome = Err(JoinError::CancelBlocked(state));
            return false;
        }
        if state.is_terminal() {
            outcome = Err(JoinError::InvalidState {
                action: "cancel",
                state,
            });
            return false;
        }
        attempt.state = JoinState::Cancelled;
        attempt.resolving = false;
        cancelled_id = Some(attempt.id);
        true
    });
    if let Some(id) = cancelled_id {
        tracing::info!(attempt_id = %id, "join attempt cancelled");
    }
    outcome
}

// ---------------------------------------------------------------------------
// Waiting
// ---------------------------------------------------------------------------

/// Resolves once attempt `id` is cancelled or replaced.
async fn cancelled(mut updates: watch::Receiver<JoinAttempt>, id: AttemptId) {
    let ended = updates
        .wait_for(|attempt| attempt.id != id || attempt.state == JoinState::Cancelled)
        .await;
    if ended.is_err() {
        // Orchestrator gone: nothing can cancel any more.
        std::future::pending::<()>().await;
    }
}

/// Runs `future` under an optional time limit. `None` means it timed out.
async fn within<F: Future>(limit: Option<Duration>, future: F) -> Option<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future).await.ok(),
        None => Some(future.await),
    }
}

/// Waits for the server's verdict on attempt `id`.
///
/// Events echoing another attempt id are not ours; events without an echo
/// are.
async fn await_session(
    replies: &mut Subscription,
    id: AttemptId,
) -> Result<SessionId, JoinFailure> {
    while let Some(event) = replies.recv().await {
        if matches!(event.attempt_id(), Some(other) if other != id) {
            tracing::debug!(attempt_id = %id, event = event.name(), "ignoring event for another attempt");
            continue;
        }
        match event {
            ServerEvent::RoomJoined { room_id, .. } => return Ok(room_id),
            ServerEvent::Error { message, .. } if message.trim().is_empty() => {
                return Err(JoinFailure::from_kind(JoinErrorKind::ServerRejected));
            }
            ServerEvent::Error { message, .. } => {
                return Err(JoinFailure::new(JoinErrorKind::ServerRejected, message));
            }
            ServerEvent::RoomCodeResolved { .. } => {}
        }
    }
    Err(JoinFailure::new(JoinErrorKind::ServerRejected, SERVER_LOST))
}
