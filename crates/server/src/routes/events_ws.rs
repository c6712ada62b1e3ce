// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/api/events`: one initial `snapshot` frame followed by the bounded
//! event bus stream, plus client-initiated ping/pong (spec §4.B, §6).

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tracing::warn;

use agent_hub_core::HubEvent;

use crate::app_state::AppState;

pub async fn events_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let now = state.hub.clock.now();
    let snapshot_value = match serde_json::to_value(state.hub.store.snapshot()) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "failed to serialize state snapshot for /api/events");
            return;
        }
    };
    let envelope = HubEvent::Snapshot { state: snapshot_value }.into_envelope(now);
    let Ok(frame) = serde_json::to_string(&envelope) else { return };
    if socket.send(Message::Text(frame)).await.is_err() {
        return;
    }

    let subscriber = state.hub.events.subscribe();

    loop {
        tokio::select! {
            envelope = subscriber.recv() => {
                let Some(envelope) = envelope else { break };
                let Ok(frame) = serde_json::to_string(&envelope) else { continue };
                if socket.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if is_ping(&text) {
                            if socket.send(Message::Text(r#"{"type":"pong"}"#.to_string())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    state.hub.events.unsubscribe(&subscriber);
}

fn is_ping(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(|s| s == "ping"))
        .unwrap_or(false)
}
