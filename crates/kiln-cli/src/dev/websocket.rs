//! WebSocket handler for live reload.
//!
//! Each connection becomes a hub [`Client`]. The connection task forwards
//! queued messages to the socket and unregisters the client when the socket
//! closes, errors, or a send takes longer than the configured timeout.

use crate::dev::hub::Client;
use crate::dev::protocol::ReloadMessage;
use crate::dev::server::ServerState;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::mpsc;

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disconnect {
    /// The browser closed the socket
    Remote,
    /// A send failed or timed out
    SendFailed,
    /// The hub dropped this client
    Dropped,
}

/// Handle WebSocket upgrade for live reload.
pub(crate) async fn handle_connect(
    ws: WebSocketUpgrade,
    State(state): State<ServerState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, state: ServerState) {
    let (client, queue) = Client::new(state.client_queue);
    let id = client.id();

    match state.hub.register(client).await {
        Ok(true) => tracing::debug!(client = %id, "Live-reload client connected"),
        Ok(false) => return,
        Err(e) => {
            tracing::debug!(client = %id, error = %e, "Rejecting live-reload client");
            return;
        }
    }

    let (sink, stream) = socket.split();
    let reason = forward(sink, stream, queue, state.send_timeout).await;

    // A dropped client is already gone from the hub.
    if reason != Disconnect::Dropped {
        let _ = state.hub.unregister(id).await;
    }
    tracing::debug!(client = %id, ?reason, "Live-reload client disconnected");
}

/// Pump queued messages into `sink` until the hub drops the client, a send
/// fails, or `stream` reports the browser went away.
async fn forward<S, R, E>(
    mut sink: S,
    mut stream: R,
    mut queue: mpsc::Receiver<ReloadMessage>,
    send_timeout: Duration,
) -> Disconnect
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
{
    loop {
        tokio::select! {
            // Forward hub messages to the browser
            message = queue.recv() => {
                let Some(message) = message else {
                    let _ = tokio::time::timeout(send_timeout, sink.send(Message::Close(None))).await;
                    return Disconnect::Dropped;
                };

                let frame = Message::Text(message.to_wire().into());
                match tokio::time::timeout(send_timeout, sink.send(frame)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::debug!(error = %e, "WebSocket send failed");
                        return Disconnect::SendFailed;
                    }
                    Err(_) => {
                        tracing::warn!(timeout_ms = send_timeout.as_millis() as u64, "WebSocket send timed out");
                        return Disconnect::SendFailed;
                    }
                }
            }
            // Browser frames carry no commands; only watch for close
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return Disconnect::Remote,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}
