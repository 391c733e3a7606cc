//! Socket readiness guard.
//!
//! Consulted before every outbound send. CONNECTING and CLOSED mean the bridge
//! is being misused and fail loudly; CLOSING is the normal teardown race and
//! only drops the frame.

use tracing::warn;

use crate::error::{Error, Result};
use crate::socket::ReadyState;

/// Classify `state` for an outbound send.
///
/// Returns `Ok(true)` when the send may proceed and `Ok(false)` when the
/// frame must be dropped.
pub fn check_open(state: ReadyState) -> Result<bool> {
    match state {
        ReadyState::Open => Ok(true),
        ReadyState::Connecting => Err(Error::SocketConnecting),
        ReadyState::Closing => {
            warn!("Attach bridge socket is closing, dropping frame");
            Ok(false)
        }
        ReadyState::Closed => Err(Error::SocketClosed),
        ReadyState::Unknown(code) => Err(Error::UnexpectedSocketState(code)),
    }
}
