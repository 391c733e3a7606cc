#![allow(clippy::unwrap_used)] // Integration tests use unwrap for brevity

//! Integration tests for the attached session loop.
//!
//! Each test runs a throwaway WebSocket server on localhost, standing in for
//! the machine API's `/{name}/connect` terminal endpoint.

use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, accept_async, connect_async};

use wol_attach_cli::session::run_session;
use wol_attach_cli::stream_terminal::StreamTerminal;
use wol_attach_core::{AttachOptions, SessionEnvelope};

type ServerWs = WebSocketStream<tokio::net::TcpStream>;
type ClientWs = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Accept one client and hand its socket to `handler`.
async fn serve_once<F, Fut>(handler: F) -> SocketAddr
where
    F: FnOnce(ServerWs) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        handler(ws).await;
    });
    addr
}

async fn connect(addr: SocketAddr) -> ClientWs {
    let (ws, _) = connect_async(format!("ws://{addr}/desktop/connect"))
        .await
        .unwrap();
    ws
}

async fn close_normally(mut ws: ServerWs) {
    let _ = ws
        .close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "done".into(),
        }))
        .await;
    while let Some(Ok(_)) = ws.next().await {}
}

// =========================================================================
// Bidirectional sessions
// =========================================================================

#[tokio::test]
async fn typed_input_is_echoed_to_display() {
    let addr = serve_once(|mut ws| async move {
        if let Some(Ok(message)) = ws.next().await {
            ws.send(message).await.unwrap();
        }
        close_normally(ws).await;
    })
    .await;

    let ws = connect(addr).await;
    let (mut keyboard, input) = tokio::io::duplex(64);
    keyboard.write_all(b"uptime\r").await.unwrap();

    let terminal = Rc::new(StreamTerminal::new(Vec::new()));
    let summary = tokio::time::timeout(
        TIMEOUT,
        run_session(ws, input, Rc::clone(&terminal), AttachOptions::default()),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(*terminal.output(), b"uptime\r".to_vec());
    assert_eq!(summary.frames_sent, 1);
    assert_eq!(summary.frames_received, 1);
    assert_eq!(summary.close_code, Some(1000));
    drop(keyboard);
}

#[tokio::test]
async fn input_eof_closes_session() {
    let addr = serve_once(|mut ws| async move {
        while let Some(Ok(message)) = ws.next().await {
            if message.is_close() {
                break;
            }
        }
        let _ = ws.close(None).await;
    })
    .await;

    let ws = connect(addr).await;
    let terminal = Rc::new(StreamTerminal::new(Vec::new()));
    let summary = tokio::time::timeout(
        TIMEOUT,
        run_session(ws, &b""[..], Rc::clone(&terminal), AttachOptions::default()),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(summary.frames_sent, 0);
    assert!(terminal.output().is_empty());
}

// =========================================================================
// Read-only and enveloped sessions
// =========================================================================

#[tokio::test]
async fn read_only_session_displays_text_and_binary() {
    let addr = serve_once(|mut ws| async move {
        ws.send(Message::text("welcome\r\n")).await.unwrap();
        ws.send(Message::binary(vec![0x1b, b'[', b'2', b'J']))
            .await
            .unwrap();
        close_normally(ws).await;
    })
    .await;

    let ws = connect(addr).await;
    let (_keyboard, input) = tokio::io::duplex(64);
    let terminal = Rc::new(StreamTerminal::new(Vec::new()));
    let options = AttachOptions::default().with_bidirectional(false);
    let summary = tokio::time::timeout(
        TIMEOUT,
        run_session(ws, input, Rc::clone(&terminal), options),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(*terminal.output(), b"welcome\r\n\x1b[2J".to_vec());
    assert_eq!(summary.frames_sent, 0);
    assert_eq!(summary.frames_received, 2);
}

#[tokio::test]
async fn envelope_session_hides_control_traffic() {
    let addr = serve_once(|mut ws| async move {
        let Some(Ok(Message::Text(text))) = ws.next().await else {
            return;
        };
        let request: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(request["type"], "data");
        assert_eq!(request["session_id"], 7);

        ws.send(Message::text(
            r#"{"type":"control","session_id":7,"control":"ping"}"#,
        ))
        .await
        .unwrap();
        let reply = serde_json::json!({
            "type": "data",
            "session_id": 7,
            "data": format!("ran {}", request["data"].as_str().unwrap()),
        });
        ws.send(Message::text(reply.to_string())).await.unwrap();
        close_normally(ws).await;
    })
    .await;

    let ws = connect(addr).await;
    let (mut keyboard, input) = tokio::io::duplex(64);
    keyboard.write_all(b"ls").await.unwrap();

    let terminal = Rc::new(StreamTerminal::new(Vec::new()));
    let options = SessionEnvelope::new("desktop", 7).attach_options();
    let summary = tokio::time::timeout(
        TIMEOUT,
        run_session(ws, input, Rc::clone(&terminal), options),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(*terminal.output(), b"ran ls".to_vec());
    assert_eq!(summary.frames_received, 2);
    drop(keyboard);
}
