//! WebSocket-backed [`Socket`].
//!
//! The session loop owns the actual `tokio-tungstenite` stream. `WsSocket` only
//! tracks readiness, queues outbound frames for the loop to write, and fans
//! inbound messages out to bridge listeners.

use std::cell::Cell;

use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, trace};

use wol_attach_core::{
    CloseEvent, Emitter, ErrorEvent, Error, Frame, Listener, ReadyState, Result, Socket,
    Subscription,
};

pub struct WsSocket {
    state: Cell<ReadyState>,
    outbound: mpsc::UnboundedSender<Message>,
    frames_received: Cell<u64>,
    frames_sent: Cell<u64>,
    close_code: Cell<Option<u16>>,
    message: Emitter<Frame>,
    close: Emitter<CloseEvent>,
    error: Emitter<ErrorEvent>,
}

impl WsSocket {
    /// Socket for a completed handshake. Frames sent on it are queued on
    /// `outbound`.
    pub fn new(outbound: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            state: Cell::new(ReadyState::Open),
            outbound,
            frames_received: Cell::new(0),
            frames_sent: Cell::new(0),
            close_code: Cell::new(None),
            message: Emitter::new(),
            close: Emitter::new(),
            error: Emitter::new(),
        }
    }

    /// Start a local close handshake.
    pub fn close(&self) {
        if self.state.get() != ReadyState::Open {
            return;
        }
        self.state.set(ReadyState::Closing);
        if self.outbound.send(Message::Close(None)).is_err() {
            debug!("Outbound queue gone before close frame");
        }
    }

    /// Dispatch one message read from the stream.
    pub fn receive(&self, message: Message) -> Result<()> {
        match message {
            Message::Text(text) => {
                self.count_received();
                self.message.emit(&Frame::Text(text.as_str().to_string()))
            }
            Message::Binary(bytes) => {
                self.count_received();
                self.message.emit(&Frame::Binary(bytes.to_vec()))
            }
            Message::Close(frame) => {
                let event = frame.map_or_else(CloseEvent::default, |f| CloseEvent {
                    code: Some(u16::from(f.code)),
                    reason: f.reason.as_str().to_string(),
                });
                self.mark_closed(event)
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
                trace!("Ignoring control frame");
                Ok(())
            }
        }
    }

    /// The stream ended without a close frame.
    pub fn peer_gone(&self) -> Result<()> {
        self.mark_closed(CloseEvent {
            code: None,
            reason: "connection dropped".to_string(),
        })
    }

    /// The stream reported a transport error.
    pub fn fail(&self, err: &tungstenite::Error) -> Result<()> {
        if self.state.get() == ReadyState::Closed {
            return Ok(());
        }
        self.state.set(ReadyState::Closed);
        self.error.emit(&ErrorEvent {
            message: err.to_string(),
        })
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received.get()
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.get()
    }

    pub fn close_code(&self) -> Option<u16> {
        self.close_code.get()
    }

    fn mark_closed(&self, event: CloseEvent) -> Result<()> {
        if self.state.get() == ReadyState::Closed {
            return Ok(());
        }
        self.state.set(ReadyState::Closed);
        self.close_code.set(event.code);
        self.close.emit(&event)
    }

    fn count_received(&self) {
        self.frames_received.set(self.frames_received.get() + 1);
    }
}

impl Socket for WsSocket {
    fn ready_state(&self) -> ReadyState {
        self.state.get()
    }

    fn send(&self, frame: Frame) -> Result<()> {
        let message = match frame {
            Frame::Text(text) => Message::text(text),
            Frame::Binary(bytes) => Message::binary(bytes),
        };
        self.outbound
            .send(message)
            .map_err(|_| Error::Transport("WebSocket writer has shut down".into()))?;
        self.frames_sent.set(self.frames_sent.get() + 1);
        Ok(())
    }

    fn on_message(&self, listener: Listener<Frame>) -> Subscription {
        self.message.subscribe(listener)
    }

    fn on_close(&self, listener: Listener<CloseEvent>) -> Subscription {
        self.close.subscribe(listener)
    }

    fn on_error(&self, listener: Listener<ErrorEvent>) -> Subscription {
        self.error.subscribe(listener)
    }
}
