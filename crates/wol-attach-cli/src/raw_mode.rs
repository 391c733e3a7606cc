//! Raw mode for the local terminal.
//!
//! While attached, keystrokes must reach the remote shell unmodified: no local
//! echo, no line buffering, and Ctrl-C delivered as a byte instead of a
//! signal. The guard restores cooked mode when dropped, on every exit path.

use std::io;

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::{debug, warn};

/// Keeps the local terminal in raw mode while alive.
#[derive(Debug)]
pub struct RawModeGuard {
    _private: (),
}

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        debug!("Local terminal switched to raw mode");
        Ok(Self { _private: () })
    }

    /// Enable raw mode only when input comes from a terminal.
    ///
    /// Piped or redirected input has no line discipline to switch off.
    pub fn for_input(is_terminal: bool) -> io::Result<Option<Self>> {
        if is_terminal {
            Self::enable().map(Some)
        } else {
            Ok(None)
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!(error = %e, "Failed to restore terminal mode");
        }
    }
}
