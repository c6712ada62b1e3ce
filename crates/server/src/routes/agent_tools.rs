// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-container agent's own HTTP surface (spec §4.G, §6):
//! `GET /credentials`, `POST /credentials/resolve`, `POST
//! /project-binding`, `POST /ack`. Artifact publish/list/download lives
//! in `artifacts.rs` since it shares the chat-scoped path prefix but is
//! large enough to warrant its own module.
//!
//! Every route here authenticates with the chat's own bearer token
//! (never an operator session), extracted the same way
//! `artifacts::extract_bearer` does.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use agent_hub_core::{ChatId, HubError};
use agent_hub_engine::CredentialResolveRequest;

use crate::api_error::ApiResult;
use crate::app_state::AppState;

fn extract_bearer(headers: &HeaderMap) -> ApiResult<String> {
    if let Some(value) = headers.get(axum::http::header::AUTHORIZATION) {
        let value = value.to_str().map_err(|_| HubError::auth_failed("malformed authorization header"))?;
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Ok(token.to_string());
        }
    }
    if let Some(value) = headers.get("x-agent-hub-agent-tools-token") {
        let value = value.to_str().map_err(|_| HubError::auth_failed("malformed token header"))?;
        return Ok(value.to_string());
    }
    Err(HubError::auth_failed("missing bearer token").into())
}

pub async fn get_credentials(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let chat_id = ChatId::from_string(id);
    let token = extract_bearer(&headers)?;
    let status = state.hub.agent_tools.list_credentials(&chat_id, &token).await?;
    Ok(Json(status))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKindRequest {
    OpenaiApiKey,
    GithubSsh,
}

impl From<CredentialKindRequest> for CredentialResolveRequest {
    fn from(value: CredentialKindRequest) -> Self {
        match value {
            CredentialKindRequest::OpenaiApiKey => CredentialResolveRequest::OpenAiApiKey,
            CredentialKindRequest::GithubSsh => CredentialResolveRequest::GithubSsh,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResolveCredentialRequest {
    kind: CredentialKindRequest,
}

pub async fn resolve_credential(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ResolveCredentialRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let chat_id = ChatId::from_string(id);
    let token = extract_bearer(&headers)?;
    let resolved = state.hub.agent_tools.resolve_credential(&chat_id, &token, req.kind.into()).await?;
    Ok(Json(resolved))
}

pub async fn project_binding(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let chat_id = ChatId::from_string(id);
    let token = extract_bearer(&headers)?;
    let binding = state.hub.agent_tools.project_binding(&chat_id, &token)?;
    Ok(Json(binding))
}

#[derive(Debug, Deserialize)]
pub struct AckRequest {
    guid: String,
    stage: String,
    #[serde(default)]
    meta: serde_json::Value,
}

pub async fn ack(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AckRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let chat_id = ChatId::from_string(id);
    let token = extract_bearer(&headers)?;
    state.hub.agent_tools.ack(&chat_id, &token, &req.guid, req.stage, req.meta)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
