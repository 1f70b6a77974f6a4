//! Messaging channel abstraction for Pattiroom.
//!
//! The join client talks to the authoritative game server through named
//! events. This crate provides the [`MessagingChannel`] capability trait
//! that the orchestrator depends on, plus two implementations:
//!
//! - [`loopback()`] — an in-process channel pair. The other end is a
//!   [`LoopbackPeer`] that plays the server. Used by tests and the demo.
//! - [`WebSocketChannel`] — a real connection via `tokio-tungstenite`
//!   (feature `websocket`, on by default).
//!
//! # Subscriptions
//!
//! Inbound events are fanned out through a broadcast channel. Each
//! [`Subscription`] sees every event delivered after it was created and
//! stops yielding once the connection drops. Subscribe BEFORE emitting a
//! request, or a fast reply can slip past.

mod error;
mod loopback;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::MessagingError;
pub use loopback::{LoopbackChannel, LoopbackPeer, loopback};
#[cfg(feature = "websocket")]
pub use websocket::WebSocketChannel;

use pattiroom_protocol::{ClientEvent, ServerEvent};
use tokio::sync::{broadcast, watch};

/// Default capacity of the inbound event fan-out.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// A connection to the game server that can emit and receive events.
///
/// The connection may be absent or drop at any time; callers check
/// [`is_connected`](MessagingChannel::is_connected) and degrade.
pub trait MessagingChannel: Send + Sync + 'static {
    /// Returns `true` while the server connection is up.
    fn is_connected(&self) -> bool;

    /// Queues an event for the server. Never blocks.
    ///
    /// # Errors
    /// - [`MessagingError::NotConnected`] — the connection is down
    /// - [`MessagingError::Closed`] — the connection task is gone
    fn emit(&self, event: ClientEvent) -> Result<(), MessagingError>;

    /// Opens a new subscription to inbound events.
    fn subscribe(&self) -> Subscription;
}

/// A channel that is never connected.
///
/// Lets the orchestrator run with no game server at all; every join then
/// completes on chain alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl MessagingChannel for Offline {
    fn is_connected(&self) -> bool {
        false
    }

    fn emit(&self, _event: ClientEvent) -> Result<(), MessagingError> {
        Err(MessagingError::NotConnected)
    }

    fn subscribe(&self) -> Subscription {
        let (_, events) = broadcast::channel(1);
        let (_, connection) = watch::channel(false);
        Subscription::new(events, connection)
    }
}

/// A stream of inbound server events.
///
/// Dropping the subscription is how a listener is torn down.
#[derive(Debug)]
pub struct Subscription {
    events: broadcast::Receiver<ServerEvent>,
    connection: watch::Receiver<bool>,
}

impl Subscription {
    pub(crate) fn new(
        events: broadcast::Receiver<ServerEvent>,
        connection: watch::Receiver<bool>,
    ) -> Self {
        Self { events, connection }
    }

    /// Waits for the next inbound event.
    ///
    /// Returns `None` once the connection has dropped. Events that were
    /// already delivered are still handed out first.
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        loop {
            tokio::select! {
                biased;
                result = self.events.recv() => match result {
                    Ok(event) => return Some(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                },
                _ = self.connection.wait_for(|up| !*up) => return None,
            }
        }
    }
}
