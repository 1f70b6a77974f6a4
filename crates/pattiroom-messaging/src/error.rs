/// Errors that can occur in the messaging layer.
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    /// The channel exists but the server connection is down.
    #[error("not connected to server")]
    NotConnected,

    /// The connection task has gone away; nothing can be sent anymore.
    #[error("messaging channel closed")]
    Closed,

    /// Opening the connection failed.
    #[error("connect failed: {0}")]
    ConnectFailed(String),
}
