//! Byte-stream [`Terminal`].
//!
//! Display output goes to any `std::io::Write` (stdout for the binary). Bytes
//! read from the local input stream become `data` events; input that is not
//! valid UTF-8 is forwarded as a `binary` event so no byte is lost.

use std::cell::{Ref, RefCell};
use std::io::Write;

use tracing::warn;

use wol_attach_core::{Emitter, Listener, Result, Subscription, Terminal};

pub struct StreamTerminal<W: Write> {
    output: RefCell<W>,
    /// Trailing bytes of an incomplete UTF-8 sequence from the last read.
    pending: RefCell<Vec<u8>>,
    data: Emitter<String>,
    binary: Emitter<String>,
}

impl<W: Write> StreamTerminal<W> {
    pub fn new(output: W) -> Self {
        Self {
            output: RefCell::new(output),
            pending: RefCell::new(Vec::new()),
            data: Emitter::new(),
            binary: Emitter::new(),
        }
    }

    /// Feed bytes read from local input.
    ///
    /// Errors raised by input listeners (a bridge sending on a dead socket)
    /// are returned to the caller.
    pub fn input(&self, bytes: &[u8]) -> Result<()> {
        let (data, binary) = {
            let mut pending = self.pending.borrow_mut();
            pending.extend_from_slice(bytes);
            split_input(&mut pending)
        };
        if let Some(text) = data {
            self.data.emit(&text)?;
        }
        if let Some(raw) = binary {
            self.binary.emit(&raw)?;
        }
        Ok(())
    }

    pub fn output(&self) -> Ref<'_, W> {
        self.output.borrow()
    }
}

/// Take what can be emitted from `pending`.
///
/// Returns the decodable text and, when an invalid sequence shows up, the
/// remaining bytes encoded one char per byte. An incomplete sequence at the
/// end stays in `pending` for the next read.
fn split_input(pending: &mut Vec<u8>) -> (Option<String>, Option<String>) {
    let (valid, rest_is_invalid) = match std::str::from_utf8(pending.as_slice()) {
        Ok(_) => (pending.len(), false),
        Err(e) => (e.valid_up_to(), e.error_len().is_some()),
    };

    let text: Vec<u8> = pending.drain(..valid).collect();
    let data = String::from_utf8(text).ok().filter(|s| !s.is_empty());

    let binary = if rest_is_invalid {
        let raw: String = pending.drain(..).map(char::from).collect();
        Some(raw)
    } else {
        None
    };
    (data, binary)
}

impl<W: Write> Terminal for StreamTerminal<W> {
    fn write_str(&self, data: &str) {
        self.write_bytes(data.as_bytes());
    }

    fn write_bytes(&self, data: &[u8]) {
        let mut output = self.output.borrow_mut();
        if let Err(e) = output.write_all(data).and_then(|()| output.flush()) {
            warn!(error = %e, "Failed to write terminal output");
        }
    }

    fn on_data(&self, listener: Listener<String>) -> Subscription {
        self.data.subscribe(listener)
    }

    fn on_binary(&self, listener: Listener<String>) -> Subscription {
        self.binary.subscribe(listener)
    }
}
