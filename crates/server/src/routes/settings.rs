// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential and OpenAI-account-login settings routes (spec §4.C,
//! §6): connect/disconnect providers, and the account login session's
//! start/cancel/callback-proxy surface.
//!
//! The account login session tracks the same state machine the engine
//! already models in [`agent_hub_core::openai_session`]; this router
//! does not spawn a real browser/device OAuth child process (no such
//! adapter exists anywhere in this codebase to ground one on), so
//! `start` seeds a session in `running` status and leaves the actual
//! external login flow for a future iteration — see `DESIGN.md`.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use agent_hub_core::{HubError, LoginMethod};

use crate::api_error::ApiResult;
use crate::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConnectOpenAiRequest {
    api_key: String,
    #[serde(default)]
    verify: bool,
}

#[derive(Debug, Deserialize)]
pub struct ConnectGithubRequest {
    private_key: String,
    known_hosts: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StartAccountRequest {
    method: LoginMethod,
}

/// Shared by `GET /api/settings/auth` and the synthesized `settings`
/// field on `GET /api/state` (Open Question decision 2: `settings` is
/// never persisted, always computed fresh).
pub(crate) async fn providers_payload(state: &AppState) -> ApiResult<serde_json::Value> {
    let openai = state.hub.vault.openai_status().await?;
    let github = state.hub.vault.github_status().await?;
    Ok(serde_json::json!({
        "providers": {
            "openai": {
                "connected": openai.connected,
                "key_hint": openai.key_hint,
                "updated_at": openai.updated_at,
                "account_connected": openai.account_connected,
                "account_auth_mode": openai.account_auth_mode,
                "account_updated_at": openai.account_updated_at,
            },
            "github": {
                "connected": github.connected,
                "key_hint": github.key_hint,
                "updated_at": github.updated_at,
                "account_connected": github.account_connected,
                "account_auth_mode": github.account_auth_mode,
                "account_updated_at": github.account_updated_at,
            },
        }
    }))
}

pub async fn get_auth(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    Ok(Json(providers_payload(&state).await?))
}

pub async fn connect_openai(
    State(state): State<AppState>,
    Json(req): Json<ConnectOpenAiRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state.hub.vault.connect_openai(&req.api_key, req.verify).await?;
    Ok(Json(providers_payload(&state).await?))
}

pub async fn disconnect_openai(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    state.hub.vault.disconnect_openai().await?;
    Ok(Json(providers_payload(&state).await?))
}

pub async fn connect_github(
    State(state): State<AppState>,
    Json(req): Json<ConnectGithubRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state.hub.vault.connect_github(&req.private_key, req.known_hosts.as_deref()).await?;
    Ok(Json(providers_payload(&state).await?))
}

pub async fn start_openai_account(
    State(state): State<AppState>,
    Json(req): Json<StartAccountRequest>,
) -> Json<agent_hub_core::OpenAiAccountSession> {
    let now = state.hub.clock.now();
    let session = state.hub.login_sessions.with(|slot| {
        let session = slot.start(req.method, now);
        session.transition(agent_hub_core::LoginStatus::Running);
        session.clone()
    });
    Json(session)
}

pub async fn cancel_openai_account(State(state): State<AppState>) -> ApiResult<Json<agent_hub_core::OpenAiAccountSession>> {
    let now = state.hub.clock.now();
    let session = state
        .hub
        .login_sessions
        .with(|slot| slot.cancel(now).map(|()| slot.current().cloned()))
        .map_err(HubError::conflict)?
        .ok_or_else(|| HubError::not_found("no active login session"))?;
    Ok(Json(session))
}

/// Proxy the browser's OAuth redirect through to the session's
/// recorded local callback URL and mark the session `callback_received`
/// (spec §4.I "OAuth callback proxy").
pub async fn openai_account_callback(
    State(state): State<AppState>,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> ApiResult<Json<serde_json::Value>> {
    let now = state.hub.clock.now();
    let callback_url = state
        .hub
        .login_sessions
        .with(|slot| slot.current_mut().map(|session| {
            session.transition(agent_hub_core::LoginStatus::CallbackReceived);
            session.local_callback_url.clone()
        }))
        .flatten()
        .ok_or_else(|| HubError::conflict("no active login session awaiting a callback"))?;

    let mut url = reqwest::Url::parse(&callback_url).map_err(|e| HubError::internal(e.to_string()))?;
    for (key, value) in &params {
        url.query_pairs_mut().append_pair(key, value);
    }
    let response = reqwest::get(url).await.map_err(|e| HubError::upstream(e.to_string()))?;
    let proxied_status = response.status().as_u16();

    let session = state.hub.login_sessions.with(|slot| {
        if let Some(session) = slot.current_mut() {
            session.push_log_line(format!("callback proxied, upstream status {proxied_status}"));
            if proxied_status < 400 {
                session.complete(agent_hub_core::LoginStatus::Connected, Some(0), now);
            } else {
                session.complete(agent_hub_core::LoginStatus::Failed, None, now);
            }
        }
        slot.current().cloned()
    });

    Ok(Json(serde_json::json!({ "proxied_status": proxied_status, "session": session })))
}
