// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/api/chats/{id}/terminal`: backlog-then-stream PTY output, and the
//! input side (raw keystrokes or typed resize/submit frames) (spec
//! §4.F, §6).

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use agent_hub_core::ChatId;
use agent_hub_engine::InputMessage;

use crate::app_state::AppState;

pub async fn terminal_ws(
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(ChatId::from_string(id), socket, state))
}

async fn handle_socket(chat_id: ChatId, mut socket: WebSocket, state: AppState) {
    let Some((subscriber, backlog)) = state.hub.terminal.attach(&chat_id) else {
        let _ = socket.send(Message::Close(None)).await;
        return;
    };

    if !backlog.is_empty() && socket.send(Message::Text(backlog)).await.is_err() {
        state.hub.terminal.detach(&chat_id, &subscriber);
        return;
    }

    loop {
        tokio::select! {
            chunk = subscriber.recv() => {
                let Some(chunk) = chunk else { break };
                if socket.send(Message::Text(chunk)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let message = parse_input(&text);
                        if state.hub.terminal.handle_input(&chat_id, message).is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    state.hub.terminal.detach(&chat_id, &subscriber);
}

/// A typed JSON frame (`{"type": "input"|"resize"|"submit", ...}`)
/// deserializes to the matching variant; any other text is forwarded
/// as raw keystrokes.
fn parse_input(text: &str) -> InputMessage {
    serde_json::from_str::<InputMessage>(text).unwrap_or_else(|_| InputMessage::Input { data: text.to_string() })
}
