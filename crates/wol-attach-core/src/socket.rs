//! Socket handle abstraction.
//!
//! The bridge observes and sends on a socket but never owns its lifecycle.
//! Implementations wrap whatever transport the host provides (a browser
//! WebSocket, a `tokio-tungstenite` stream, an in-memory double).

use std::fmt;

use crate::disposable::Subscription;
use crate::error::Result;
use crate::event::Listener;

/// Socket readiness, using the WebSocket numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Connecting,
    Open,
    Closing,
    Closed,
    /// A code outside 0..=3 reported by the transport.
    Unknown(u16),
}

impl ReadyState {
    pub const fn from_code(code: u16) -> Self {
        match code {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            3 => Self::Closed,
            other => Self::Unknown(other),
        }
    }

    pub const fn code(self) -> u16 {
        match self {
            Self::Connecting => 0,
            Self::Open => 1,
            Self::Closing => 2,
            Self::Closed => 3,
            Self::Unknown(code) => code,
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "CONNECTING"),
            Self::Open => write!(f, "OPEN"),
            Self::Closing => write!(f, "CLOSING"),
            Self::Closed => write!(f, "CLOSED"),
            Self::Unknown(code) => write!(f, "UNKNOWN({code})"),
        }
    }
}

/// One discrete message carried by the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
        }
    }
}

/// Payload of a socket `close` event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseEvent {
    /// Close code from the peer's close frame, if it sent one.
    pub code: Option<u16>,
    pub reason: String,
}

/// Payload of a socket `error` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    pub message: String,
}

/// A bidirectional frame transport with observable readiness.
pub trait Socket {
    fn ready_state(&self) -> ReadyState;

    /// Queue one frame for transmission.
    fn send(&self, frame: Frame) -> Result<()>;

    fn on_message(&self, listener: Listener<Frame>) -> Subscription;

    fn on_close(&self, listener: Listener<CloseEvent>) -> Subscription;

    fn on_error(&self, listener: Listener<ErrorEvent>) -> Subscription;
}
