//! Attached shell session.
//!
//! Drives one WebSocket, one local input stream, and one terminal through an
//! [`AttachBridge`] on the current thread. Every event is handled to
//! completion before the next one is polled, so the bridge never sees
//! concurrent callbacks.

use std::io::Write;
use std::rc::Rc;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

use wol_attach_core::config::AttachConfig;
use wol_attach_core::{AttachBridge, AttachOptions, SessionEnvelope};

use crate::stream_terminal::StreamTerminal;
use crate::ws_socket::WsSocket;

const INPUT_BUFFER_SIZE: usize = 4096;

/// What happened over the lifetime of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames_received: u64,
    pub frames_sent: u64,
    /// Close code from the peer, when it sent a close frame.
    pub close_code: Option<u16>,
}

/// Bridge options for attaching to `machine` under `config`.
pub fn attach_options(config: &AttachConfig, machine: &str) -> AttachOptions {
    let options = if config.use_envelope {
        SessionEnvelope::new(machine, config.session_id).attach_options()
    } else {
        AttachOptions::default()
    };
    options.with_bidirectional(config.bidirectional)
}

/// Run the session until the socket closes or fails.
///
/// Local input EOF starts a close handshake. A usage error from the bridge
/// (sending on a socket that is not open) ends the session with that error.
pub async fn run_session<S, R, W>(
    ws: S,
    mut input: R,
    terminal: Rc<StreamTerminal<W>>,
    options: AttachOptions,
) -> anyhow::Result<SessionSummary>
where
    S: Stream<Item = Result<Message, tungstenite::Error>>
        + Sink<Message, Error = tungstenite::Error>
        + Unpin,
    R: AsyncRead + Unpin,
    W: Write + 'static,
{
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let socket = Rc::new(WsSocket::new(outbound_tx));
    let bridge = AttachBridge::new(Rc::clone(&socket), options);
    bridge.activate(Rc::clone(&terminal));

    let (mut sink, mut source) = ws.split();
    let mut buf = vec![0u8; INPUT_BUFFER_SIZE];
    let mut input_open = bridge.options().bidirectional;

    while !bridge.is_disposed() {
        tokio::select! {
            incoming = source.next() => match incoming {
                Some(Ok(message)) => socket.receive(message)?,
                Some(Err(e)) => socket.fail(&e)?,
                None => socket.peer_gone()?,
            },
            Some(message) = outbound_rx.recv() => {
                if let Err(e) = sink.send(message).await {
                    socket.fail(&e)?;
                }
            }
            read = input.read(&mut buf), if input_open => match read {
                Ok(0) => {
                    debug!("Local input closed, closing socket");
                    input_open = false;
                    socket.close();
                }
                Ok(n) => terminal.input(&buf[..n])?,
                Err(e) => {
                    warn!(error = %e, "Failed to read local input");
                    input_open = false;
                    socket.close();
                }
            },
        }
    }

    // Anything queued before the close was observed, then the close reply.
    while let Ok(message) = outbound_rx.try_recv() {
        if sink.send(message).await.is_err() {
            break;
        }
    }
    if let Err(e) = sink.close().await {
        debug!(error = %e, "WebSocket close after session end");
    }

    let summary = SessionSummary {
        frames_received: socket.frames_received(),
        frames_sent: socket.frames_sent(),
        close_code: socket.close_code(),
    };
    info!(
        frames_received = summary.frames_received,
        frames_sent = summary.frames_sent,
        close_code = ?summary.close_code,
        "Session ended"
    );
    Ok(summary)
}
