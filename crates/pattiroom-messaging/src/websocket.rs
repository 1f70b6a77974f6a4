//! WebSocket messaging channel using `tokio-tungstenite`.
//!
//! One connection, two background tasks:
//!
//! ```text
//! emit() ──mpsc──→ writer task ──→ socket sink
//! socket stream ──→ reader task ──broadcast──→ subscriptions
//! ```
//!
//! Either task flips the shared connection flag to `false` when it exits,
//! which ends every live [`Subscription`].

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use pattiroom_protocol::{ClientEvent, Codec, JsonCodec, ProtocolError, ServerEvent};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::tungstenite::Message;

use crate::{DEFAULT_EVENT_CAPACITY, MessagingChannel, MessagingError, Subscription};

/// A [`MessagingChannel`] backed by a WebSocket connection.
///
/// Cheap to clone; the connection closes once every clone is dropped.
#[derive(Debug, Clone)]
pub struct WebSocketChannel {
    outbound: mpsc::UnboundedSender<ClientEvent>,
    inbound: broadcast::Sender<ServerEvent>,
    connection: Arc<watch::Sender<bool>>,
}

impl WebSocketChannel {
    /// Connects to the game server at `url` (e.g. `ws://127.0.0.1:4000`)
    /// using JSON frames.
    pub async fn connect(url: &str) -> Result<Self, MessagingError> {
        Self::connect_with_codec(url, JsonCodec).await
    }

    /// Connects with a custom codec.
    pub async fn connect_with_codec<C: Codec>(
        url: &str,
        codec: C,
    ) -> Result<Self, MessagingError> {
        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| MessagingError::ConnectFailed(e.to_string()))?;
        tracing::info!(url, "connected to game server");

        let (mut sink, mut stream) = ws.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ClientEvent>();
        let (inbound, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        let (connection, _) = watch::channel(true);
        let connection = Arc::new(connection);
        let codec = Arc::new(codec);

        // Writer task: outbound queue -> socket.
        {
            let codec = Arc::clone(&codec);
            let connection = Arc::clone(&connection);
            tokio::spawn(async move {
                while let Some(event) = outbound_rx.recv().await {
                    let frame = match encode_text(codec.as_ref(), &event) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::error!(event = event.name(), error = %e, "failed to encode event");
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::Text(frame.into())).await {
                        tracing::debug!(error = %e, "send failed, closing writer");
                        break;
                    }
                }
                let _ = sink.close().await;
                connection.send_replace(false);
            });
        }

        // Reader task: socket -> subscriptions.
        {
            let inbound = inbound.clone();
            let connection = Arc::clone(&connection);
            tokio::spawn(async move {
                while let Some(msg) = stream.next().await {
                    let data = match msg {
                        Ok(Message::Text(text)) => text.as_str().as_bytes().to_vec(),
                        Ok(Message::Binary(data)) => data.to_vec(),
                        Ok(Message::Close(_)) => break,
                        Ok(_) => continue, // ping/pong/frame
                        Err(e) => {
                            tracing::debug!(error = %e, "receive failed");
                            break;
                        }
                    };
                    match codec.decode::<ServerEvent>(&data) {
                        Ok(event) => {
                            tracing::debug!(event = event.name(), "received");
                            let _ = inbound.send(event);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "ignoring undecodable frame");
                        }
                    }
                }
                tracing::info!("game server connection closed");
                connection.send_replace(false);
            });
        }

        Ok(Self {
            outbound,
            inbound,
            connection,
        })
    }
}

impl MessagingChannel for WebSocketChannel {
    fn is_connected(&self) -> bool {
        *self.connection.borrow()
    }

    fn emit(&self, event: ClientEvent) -> Result<(), MessagingError> {
        if !self.is_connected() {
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

fn encode_text<C: Codec>(codec: &C, event: &ClientEvent) -> Result<String, ProtocolError> {
    let bytes = codec.encode(event)?;
    String::from_utf8(bytes).map_err(|e| ProtocolError::InvalidMessage(e.to_string()))
}
