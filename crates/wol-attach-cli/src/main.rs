//! wol-attach CLI
//!
//! Attaches this terminal to the remote shell of a machine managed by the
//! wake-on-LAN panel API.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use wol_attach_cli::raw_mode::RawModeGuard;
use wol_attach_cli::session::{attach_options, run_session};
use wol_attach_cli::stream_terminal::StreamTerminal;
use wol_attach_core::config::{connect_url, load_config};
use wol_attach_core::tracing_init::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "wol-attach")]
#[command(version, about = "Attach this terminal to a machine's remote shell")]
struct Args {
    /// Machine name as listed by the panel API.
    machine: String,

    /// Base WebSocket URL of the machine API (e.g. ws://nas.lan:3030/machine).
    #[arg(long)]
    server: Option<String>,

    /// Path to a JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Wrap traffic in the session-routing envelope.
    #[arg(long)]
    envelope: bool,

    /// Session id used inside the envelope.
    #[arg(long)]
    session_id: Option<u32>,

    /// Only display output; never send local input.
    #[arg(long)]
    read_only: bool,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(server) = args.server {
        config.connection.server_url = server;
    }
    if args.envelope {
        config.attach.use_envelope = true;
    }
    if let Some(session_id) = args.session_id {
        config.attach.session_id = session_id;
    }
    if args.read_only {
        config.attach.bidirectional = false;
    }

    init_tracing(
        &format!(
            "wol_attach_cli={0},wol_attach_core={0}",
            config.log_level
        ),
        args.log_json,
    );

    let url = connect_url(&config.connection.server_url, &args.machine)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        machine = %args.machine,
        url = %url,
        bidirectional = config.attach.bidirectional,
        envelope = config.attach.use_envelope,
        "Attaching to machine"
    );

    let (ws, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .with_context(|| format!("Failed to connect to {url}"))?;

    let terminal = Rc::new(StreamTerminal::new(io::stdout()));
    let options = attach_options(&config.attach, &args.machine);

    let raw_mode = RawModeGuard::for_input(io::stdin().is_terminal())
        .context("Failed to switch the local terminal to raw mode")?;
    let result = run_session(ws, tokio::io::stdin(), terminal, options).await;
    drop(raw_mode);

    result?;
    Ok(())
}
