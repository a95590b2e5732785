//! The single WebSocket connection to the chat backend.
//!
//! One connection per run. Closure is terminal: errors and closes are
//! reported through the event channel, never retried. Sends while the
//! connection is down are dropped with a warning.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Local, Timelike};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};
use tracing::{info, warn};

use crate::protocol::{decode_frame, Outgoing};
use crate::tui::AppEvent;

/// Handle to the open connection. Holds the sender side of the writer task;
/// the read loop reports back through the application's event channel.
pub struct ChatConnection {
    outgoing: mpsc::Sender<Outgoing>,
}

impl ChatConnection {
    /// Perform the handshake and spawn the read/write tasks. Inbound frames
    /// and lifecycle changes arrive on `events` in receive order.
    pub async fn open(
        socket_url: &str,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Result<Self> {
        let (ws_stream, _) = connect_async(socket_url)
            .await
            .with_context(|| format!("failed to connect to {}", socket_url))?;
        let (mut write, mut read) = ws_stream.split();

        info!(url = %socket_url, "websocket connected");
        let _ = events.send(AppEvent::Opened);

        let (outgoing, mut outgoing_rx) = mpsc::channel::<Outgoing>(32);

        // Writer task: owns the sink half until the channel closes or a send
        // fails. Once it exits, `send` surfaces the send-while-closed case.
        tokio::spawn(async move {
            while let Some(payload) = outgoing_rx.recv().await {
                let wire = payload.into_wire();
                if let Err(e) = write.send(WsMessage::Text(wire)).await {
                    warn!(error = %e, "websocket send failed, writer stopping");
                    break;
                }
            }
        });

        // Reader task: classifies each text frame once and forwards it.
        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                match message {
                    Ok(WsMessage::Text(text)) => {
                        if events.send(AppEvent::Server(decode_frame(&text))).is_err() {
                            return;
                        }
                    }
                    Ok(WsMessage::Close(frame)) => {
                        let reason = frame
                            .map(|f| format!("{} {}", f.code, f.reason))
                            .unwrap_or_else(|| "closed by server".to_string());
                        info!(%reason, "websocket closed");
                        let _ = events.send(AppEvent::Closed(reason));
                        return;
                    }
                    // Binary, ping and pong frames carry nothing for us
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "websocket error");
                        let _ = events.send(AppEvent::ConnError(e.to_string()));
                        return;
                    }
                }
            }
            let _ = events.send(AppEvent::Closed("connection lost".to_string()));
        });

        Ok(Self { outgoing })
    }

    /// Hand a payload to the writer task. Returns false when the connection
    /// is no longer open; the message is dropped, not queued.
    pub fn send(&self, payload: Outgoing) -> bool {
        match self.outgoing.try_send(payload) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "websocket is not open, message not sent");
                false
            }
        }
    }
}

/// Conversation identifier for this run: the current wall clock as a
/// `YYYYMMDDHHMMSS` numeral. Not unique across runs within the same second;
/// pass `--conversation` to resume a known one instead.
pub fn conversation_id_now() -> i64 {
    conversation_id_from(Local::now())
}

fn conversation_id_from(now: DateTime<Local>) -> i64 {
    let date = (now.year() as i64 * 100 + now.month() as i64) * 100 + now.day() as i64;
    let time = (now.hour() as i64 * 100 + now.minute() as i64) * 100 + now.second() as i64;
    date * 1_000_000 + time
}
