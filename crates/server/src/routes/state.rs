// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /api/state` (spec §6): the full projects/chats snapshot plus a
//! synthesized `settings` object, matching the `Envelope`'s `snapshot`
//! payload shape so the initial websocket frame and this REST endpoint
//! stay in sync by construction.

use axum::extract::State;
use axum::Json;

use agent_hub_core::preview_lines;

use crate::api_error::ApiResult;
use crate::app_state::AppState;

use super::settings::providers_payload;

pub async fn get_state(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let snapshot = state.hub.store.snapshot();

    let mut projects: Vec<_> = snapshot.projects.into_values().collect();
    projects.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    let mut chats: Vec<serde_json::Value> = Vec::with_capacity(snapshot.chats.len());
    for chat in snapshot.chats.into_values() {
        let mut value = serde_json::to_value(&chat).map_err(|e| agent_hub_core::HubError::internal(e.to_string()))?;
        if let Some(preview) = chat_preview(&state, &chat.id) {
            value["preview"] = serde_json::to_value(preview).unwrap_or(serde_json::Value::Null);
        }
        chats.push(value);
    }
    chats.sort_by(|a, b| a["created_at"].as_str().cmp(&b["created_at"].as_str()));

    let settings = providers_payload(&state).await?;

    Ok(Json(serde_json::json!({ "projects": projects, "chats": chats, "settings": settings })))
}

/// Best-effort preview derived from the chat's log tail (spec §12
/// supplement); a missing or unreadable log yields no preview rather
/// than an error.
fn chat_preview(state: &AppState, chat_id: &agent_hub_core::ChatId) -> Option<Vec<agent_hub_core::PreviewLine>> {
    let path = state.hub.terminal.log_path(chat_id);
    let contents = std::fs::read_to_string(path).ok()?;
    let tail_start = char_boundary_at_or_after(&contents, contents.len().saturating_sub(agent_hub_core::CHAT_PREVIEW_LOG_MAX_BYTES));
    let tail = &contents[tail_start..];
    let lines = preview_lines(tail);
    if lines.is_empty() {
        None
    } else {
        Some(lines)
    }
}

/// Advance `start` to the next UTF-8 character boundary in `s`, so
/// truncating a log tail never splits a multi-byte character.
fn char_boundary_at_or_after(s: &str, start: usize) -> usize {
    let mut idx = start.min(s.len());
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}
