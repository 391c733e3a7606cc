//! Error types for the wol-attach core library.

use thiserror::Error;

/// Result type alias using the wol-attach [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for attachment operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A send was attempted before the socket finished its handshake.
    #[error("Attach bridge was activated before socket was open")]
    SocketConnecting,

    /// A send was attempted on a socket that has already closed.
    #[error("Attach bridge socket is closed")]
    SocketClosed,

    /// The socket reported a readiness code outside the known set.
    #[error("Unexpected socket state: {0}")]
    UnexpectedSocketState(u16),

    /// The underlying transport rejected a frame.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error signals misuse of the bridge rather than a
    /// transport or environment failure.
    pub const fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::SocketConnecting | Self::SocketClosed | Self::UnexpectedSocketState(_)
        )
    }
}
