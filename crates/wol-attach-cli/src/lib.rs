//! wol-attach CLI Library
//!
//! Hosts the attachment bridge on a real WebSocket and the local terminal:
//! a `tokio-tungstenite` socket adapter, a byte-stream terminal, and the
//! single-threaded session loop that drives both.

pub mod raw_mode;
pub mod session;
pub mod stream_terminal;
pub mod ws_socket;
