// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat artifact listing, publish, and download (spec §4.G, §6). Publish
//! is the one route the in-container agent calls directly, authenticated
//! by the chat's own artifact bearer token rather than any operator
//! session.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use tokio_util::io::ReaderStream;

use agent_hub_core::{ArtifactId, ChatId, HubError};
use agent_hub_engine::ArtifactPublishRequest;

use crate::api_error::ApiResult;
use crate::app_state::AppState;

const ARTIFACT_NAME_HEADER: &str = "x-agent-hub-artifact-name";

/// Pull the bearer token out of `Authorization: Bearer <token>` or the
/// hub's own `x-agent-hub-agent-tools-token` header (spec §4.G).
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

pub async fn list_artifacts(Path(id): Path<String>, State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let chat_id = ChatId::from_string(id);
    if state.hub.store.read(|s| s.chat(&chat_id).is_none()) {
        return Err(HubError::not_found(format!("chat {chat_id} not found")).into());
    }
    let artifacts = state.hub.agent_tools.list_artifacts(&chat_id);
    Ok(Json(serde_json::json!({ "artifacts": artifacts })))
}

pub async fn publish_artifact(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<agent_hub_core::Artifact>> {
    let chat_id = ChatId::from_string(id);
    let token = extract_bearer(&headers)?;
    let relative_path = headers
        .get(ARTIFACT_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| HubError::invalid_request(format!("missing {ARTIFACT_NAME_HEADER} header")))?
        .to_string();

    let req = ArtifactPublishRequest { relative_path, display_name: None, bytes: body.to_vec() };
    let artifact = state.hub.agent_tools.publish_artifact(chat_id, &token, req).await?;
    Ok(Json(artifact))
}

pub async fn download_artifact(
    Path((id, artifact_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> ApiResult<axum::response::Response> {
    let chat_id = ChatId::from_string(id);
    let artifact_id = ArtifactId::from_string(artifact_id);
    let path = state.hub.agent_tools.download_path(&chat_id, &artifact_id)?;

    let file = tokio::fs::File::open(&path).await.map_err(|e| HubError::not_found(e.to_string()))?;
    let stream = ReaderStream::new(file);
    let body = axum::body::Body::from_stream(stream);

    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("artifact").to_string();
    let disposition = format!("attachment; filename=\"{filename}\"");

    Ok(axum::response::Response::builder()
        .header(axum::http::header::CONTENT_DISPOSITION, disposition)
        .body(body)
        .map_err(|e| HubError::internal(e.to_string()))?)
}
