//! WebSocket handler for per-session updates.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::StreamExt};
use spirit_core::session::{QuizSession, SessionEvent};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// WebSocket upgrade handler for `/quiz/{id}/ws`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.session(&id).await {
        Some(session) => ws.on_upgrade(|socket| handle_socket(socket, session)),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Subscribe to a session and encode its current state as the first frame.
///
/// The page compares the snapshot with the state it was rendered from, so
/// events emitted before the socket connected are not lost.
pub(crate) fn attach(session: &QuizSession) -> serde_json::Result<(String, broadcast::Receiver<SessionEvent>)> {
    let (snapshot, rx) = session.attach();
    let json = serde_json::to_string(&SessionEvent::Snapshot(snapshot))?;
    Ok((json, rx))
}

/// Forward session events to one browser tab.
async fn handle_socket(socket: WebSocket, session: Arc<QuizSession>) {
    let (mut sender, mut receiver) = socket.split();
    let id = session.id().to_string();

    let (snapshot, mut rx) = match attach(&session) {
        Ok(attached) => attached,
        Err(e) => {
            warn!(session = %id, error = %e, "Failed to encode session snapshot");
            return;
        }
    };

    info!(session = %id, "WebSocket client connected");
    if sender.send(Message::Text(snapshot.into())).await.is_err() {
        debug!("WebSocket send failed, client disconnected");
        return;
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "WebSocket client lagged behind");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "Failed to encode session event");
                    continue;
                }
            };
            debug!(message = %json, "Sending message to WebSocket client");
            if sender.send(Message::Text(json.into())).await.is_err() {
                debug!("WebSocket send failed, client disconnected");
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                debug!("WebSocket client sent close frame");
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!(session = %id, "WebSocket client disconnected");
}
