//! In-memory socket and terminal doubles.
//!
//! Record everything the bridge sends or writes and let tests fire socket and
//! widget events by hand.

use std::cell::{Cell, RefCell};

use crate::disposable::Subscription;
use crate::error::{Error, Result};
use crate::event::{Emitter, Listener};
use crate::socket::{CloseEvent, ErrorEvent, Frame, ReadyState, Socket};
use crate::terminal::Terminal;

/// Socket double with a settable ready state.
#[derive(Debug)]
pub struct MemorySocket {
    state: Cell<ReadyState>,
    sent: RefCell<Vec<Frame>>,
    reject_sends: Cell<bool>,
    message: Emitter<Frame>,
    close: Emitter<CloseEvent>,
    error: Emitter<ErrorEvent>,
}

impl MemorySocket {
    pub fn new(state: ReadyState) -> Self {
        Self {
            state: Cell::new(state),
            sent: RefCell::new(Vec::new()),
            reject_sends: Cell::new(false),
            message: Emitter::new(),
            close: Emitter::new(),
            error: Emitter::new(),
        }
    }

    pub fn open() -> Self {
        Self::new(ReadyState::Open)
    }

    pub fn set_state(&self, state: ReadyState) {
        self.state.set(state);
    }

    /// Make every later `send` fail with a transport error.
    pub fn reject_sends(&self) {
        self.reject_sends.set(true);
    }

    pub fn deliver(&self, frame: &Frame) -> Result<()> {
        self.message.emit(frame)
    }

    pub fn deliver_text(&self, text: &str) -> Result<()> {
        self.deliver(&Frame::Text(text.to_string()))
    }

    pub fn deliver_binary(&self, bytes: &[u8]) -> Result<()> {
        self.deliver(&Frame::Binary(bytes.to_vec()))
    }

    /// Mark the socket closed and fire `close`.
    pub fn close(&self, code: Option<u16>, reason: &str) -> Result<()> {
        self.state.set(ReadyState::Closed);
        self.close.emit(&CloseEvent {
            code,
            reason: reason.to_string(),
        })
    }

    /// Fire `error` without touching the ready state.
    pub fn fail(&self, message: &str) -> Result<()> {
        self.error.emit(&ErrorEvent {
            message: message.to_string(),
        })
    }

    pub fn sent(&self) -> Vec<Frame> {
        self.sent.borrow().clone()
    }

    /// Listeners currently registered across all three socket events.
    pub fn listener_count(&self) -> usize {
        self.message.listener_count() + self.close.listener_count() + self.error.listener_count()
    }
}

impl Socket for MemorySocket {
    fn ready_state(&self) -> ReadyState {
        self.state.get()
    }

    fn send(&self, frame: Frame) -> Result<()> {
        if self.reject_sends.get() {
            return Err(Error::Transport("send rejected".into()));
        }
        self.sent.borrow_mut().push(frame);
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

/// Terminal double recording writes as frames.
#[derive(Debug, Default)]
pub struct MemoryTerminal {
    writes: RefCell<Vec<Frame>>,
    data: Emitter<String>,
    binary: Emitter<String>,
}

impl MemoryTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire a `data` input event.
    pub fn type_data(&self, data: &str) -> Result<()> {
        self.data.emit(&data.to_string())
    }

    /// Fire a `binary` input event.
    pub fn type_binary(&self, data: &str) -> Result<()> {
        self.binary.emit(&data.to_string())
    }

    pub fn writes(&self) -> Vec<Frame> {
        self.writes.borrow().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.data.listener_count() + self.binary.listener_count()
    }
}

impl Terminal for MemoryTerminal {
    fn write_str(&self, data: &str) {
        self.writes.borrow_mut().push(Frame::Text(data.to_string()));
    }

    fn write_bytes(&self, data: &[u8]) {
        self.writes.borrow_mut().push(Frame::Binary(data.to_vec()));
    }

    fn on_data(&self, listener: Listener<String>) -> Subscription {
        self.data.subscribe(listener)
    }

    fn on_binary(&self, listener: Listener<String>) -> Subscription {
        self.binary.subscribe(listener)
    }
}
