//! WebSocket connection lifecycle.
//!
//! Runs the read/write loop for a single client connection: inbound
//! text frames are handed to the relay for routing, and frames queued on
//! the connection's outbound channel are forwarded to the socket sink.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::domain::ClientId;
use crate::error::RelayError;
use crate::service::RelayService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// Registers with the relay on entry and deregisters on exit. The loop
/// ends when the peer closes or errors the socket, when a sink send
/// fails, or when the registry drops this connection's handle (the
/// connection was superseded by a reconnect under the same identifier,
/// or evicted after a failed send).
pub async fn run_connection(socket: WebSocket, client_id: ClientId, relay: Arc<RelayService>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let serial = relay.on_connect(client_id.clone(), tx).await;

    loop {
        tokio::select! {
            // Outbound frame queued by the relay
            frame = rx.recv() => {
                match frame {
                    Some(json) => {
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    // Registry dropped our handle: superseded or evicted
                    None => break,
                }
            }
            // Incoming frame from the client
            inbound = ws_rx.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(err) = relay.route_message(&client_id, &text).await {
                            log_dropped_frame(&client_id, &err);
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    relay.on_disconnect(&client_id, serial).await;
    tracing::debug!(client = %client_id, "ws connection closed");
}

/// Logs a dropped inbound frame. Nothing is sent back to the client:
/// the protocol is fire-and-forget and defines no error message type.
fn log_dropped_frame(client_id: &ClientId, err: &RelayError) {
    match err {
        RelayError::MalformedMessage(_) => {
            tracing::warn!(client = %client_id, %err, "dropping inbound frame");
        }
        _ => {
            tracing::debug!(client = %client_id, %err, "dropping inbound frame");
        }
    }
}
