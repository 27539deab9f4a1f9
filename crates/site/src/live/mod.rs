//! Live socket: one [`LiveSession`] per browser tab.
//!
//! The socket is bridged onto a pair of channels so the session itself never
//! sees WebSocket frames. Each session runs on its own Sentry hub; the user
//! set after sign-in only tags that tab's events.

mod protocol;
mod session;

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use sentry::{Hub, SentryFutureExt};
use tokio::sync::mpsc;

use crate::state::AppState;

pub use protocol::{ClientMessage, ServerMessage};
pub use session::LiveSession;

/// Capacity of the per-session message queues.
const QUEUE_DEPTH: usize = 64;

/// Upgrade handler for `/live`.
#[tracing::instrument(skip_all)]
pub async fn live_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| live_connection(state, socket))
}

async fn live_connection(state: AppState, socket: WebSocket) {
    let (identity, store) = state.open_session();
    let (mut sender, mut receiver) = socket.split();
    let (inbound_tx, inbound_rx) = mpsc::channel::<ClientMessage>(QUEUE_DEPTH);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerMessage>(QUEUE_DEPTH);

    let send_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(err) => {
                    tracing::error!(error = %err, "Failed to encode live message");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = receiver.next().await {
            let message = match frame {
                Message::Text(text) => match ClientMessage::parse(text.as_str()) {
                    Ok(message) => message,
                    Err(err) => {
                        tracing::warn!(error = %err, "Dropping malformed live message");
                        continue;
                    }
                },
                Message::Close(_) => break,
                _ => continue,
            };
            if inbound_tx.send(message).await.is_err() {
                break;
            }
        }
    });

    let hub = Arc::new(Hub::new_from_top(Hub::current()));
    LiveSession::run(identity, store, inbound_rx, outbound_tx)
        .bind_hub(hub)
        .await;

    recv_task.abort();
    // Flush what the session queued before it ended.
    if let Err(err) = send_task.await {
        tracing::debug!(error = %err, "Live sender task ended abnormally");
    }
}
