//! In-process channel pair: the client half implements
//! [`MessagingChannel`], the peer half plays the server.

use std::sync::Arc;

use pattiroom_protocol::{ClientEvent, ServerEvent};
use tokio::sync::{broadcast, mpsc, watch};

use crate::{DEFAULT_EVENT_CAPACITY, MessagingChannel, MessagingError, Subscription};

/// Creates a connected client/peer pair.
pub fn loopback() -> (LoopbackChannel, LoopbackPeer) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (inbound, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
    let (connection, _) = watch::channel(true);
    let connection = Arc::new(connection);

    let channel = LoopbackChannel {
        outbound: outbound_tx,
        inbound: inbound.clone(),
        connection: Arc::clone(&connection),
    };
    let peer = LoopbackPeer {
        outbound: outbound_rx,
        inbound,
        connection,
    };
    (channel, peer)
}

/// Client half of a [`loopback()`] pair. Cheap to clone.
#[derive(Debug, Clone)]
pub struct LoopbackChannel {
    outbound: mpsc::UnboundedSender<ClientEvent>,
    inbound: broadcast::Sender<ServerEvent>,
    connection: Arc<watch::Sender<bool>>,
}

impl MessagingChannel for LoopbackChannel {
    fn is_connected(&self) -> bool {
        *self.connection.borrow() && !self.outbound.is_closed()
    }

    fn emit(&self, event: ClientEvent) -> Result<(), MessagingError> {
        if !*self.connection.borrow() {
            return Err(MessagingError::NotConnected);
        }
        tracing::debug!(event = event.name(), "emit");
        self.outbound
            .send(event)
            .map_err(|_| MessagingError::Closed)
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.inbound.subscribe(), self.connection.subscribe())
    }
}

/// Server half of a [`loopback()`] pair.
///
/// Dropping the peer marks the connection as down.
#[derive(Debug)]
pub struct LoopbackPeer {
    outbound: mpsc::UnboundedReceiver<ClientEvent>,
    inbound: broadcast::Sender<ServerEvent>,
    connection: Arc<watch::Sender<bool>>,
}

impl LoopbackPeer {
    /// Waits for the next event emitted by the client.
    ///
    /// Returns `None` once every client handle has been dropped.
    pub async fn recv(&mut self) -> Option<ClientEvent> {
        self.outbound.recv().await
    }

    /// Returns an already-emitted event without waiting.
    pub fn try_recv(&mut self) -> Option<ClientEvent> {
        self.outbound.try_recv().ok()
    }

    /// Delivers an event to every live subscription.
    ///
    /// Returns how many subscriptions received it (0 when nobody listens).
    pub fn send(&self, event: ServerEvent) -> usize {
        self.inbound.send(event).unwrap_or(0)
    }

    /// Simulates the server connection dropping.
    pub fn disconnect(&self) {
        self.connection.send_replace(false);
    }

    /// Simulates the server connection coming back.
    pub fn reconnect(&self) {
        self.connection.send_replace(true);
    }
}

impl Drop for LoopbackPeer {
    fn drop(&mut self) {
        self.connection.send_replace(false);
    }
}
