// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat CRUD, lifecycle (start/close), logs, and the manual
//! title-prompt submission route (spec §4.E, §4.H, §6).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use agent_hub_core::mount::{validate_env_entries, validate_mount};
use agent_hub_core::{AgentType, Chat, ChatId, EnvVar, HubError, Mount};
use agent_hub_engine::ChatCreateRequest;

use crate::api_error::ApiResult;
use crate::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    project_id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    agent_type: Option<AgentType>,
    #[serde(default)]
    agent_args: Vec<String>,
    #[serde(default)]
    ro_mounts: Option<Vec<Mount>>,
    #[serde(default)]
    rw_mounts: Option<Vec<Mount>>,
    #[serde(default)]
    env_vars: Option<Vec<EnvVar>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchChatRequest {
    display_name: Option<String>,
    agent_type: Option<AgentType>,
    agent_args: Option<Vec<String>>,
    ro_mounts: Option<Vec<Mount>>,
    rw_mounts: Option<Vec<Mount>>,
    env_vars: Option<Vec<EnvVar>>,
}

#[derive(Debug, Deserialize)]
pub struct TitlePromptRequest {
    prompt: String,
}

pub async fn create_chat(State(state): State<AppState>, Json(req): Json<CreateChatRequest>) -> ApiResult<Json<Chat>> {
    let project_id = agent_hub_core::ProjectId::from_string(req.project_id);
    let create_req = ChatCreateRequest {
        display_name: req.display_name,
        agent_type: req.agent_type,
        agent_args: req.agent_args,
        ro_mounts: req.ro_mounts,
        rw_mounts: req.rw_mounts,
        env_vars: req.env_vars,
    };
    let chat = state.hub.chat_supervisor.create(project_id, create_req)?;
    Ok(Json(chat))
}

pub async fn start_chat(Path(id): Path<String>, State(state): State<AppState>) -> ApiResult<Json<Chat>> {
    let chat_id = ChatId::from_string(id);
    let chat = state.hub.chat_supervisor.start(chat_id).await?;
    Ok(Json(chat))
}

pub async fn close_chat(Path(id): Path<String>, State(state): State<AppState>) -> ApiResult<Json<Chat>> {
    let chat_id = ChatId::from_string(id);
    let chat = state.hub.chat_supervisor.close(chat_id).await?;
    Ok(Json(chat))
}

pub async fn patch_chat(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<PatchChatRequest>,
) -> ApiResult<Json<Chat>> {
    let chat_id = ChatId::from_string(id);
    let now = state.hub.clock.now();

    if let Some(envs) = &req.env_vars {
        validate_env_entries(envs).map_err(HubError::invalid_request)?;
    }
    for mounts in [&req.ro_mounts, &req.rw_mounts].into_iter().flatten() {
        for mount in mounts {
            validate_mount(mount).map_err(HubError::invalid_request)?;
        }
    }

    let chat = state
        .hub
        .store
        .mutate(|s| {
            let chat = s.chat_mut(&chat_id)?;
            if let Some(display_name) = req.display_name {
                chat.display_name = display_name;
            }
            if let Some(agent_type) = req.agent_type {
                chat.agent_type = agent_type;
            }
            if let Some(agent_args) = req.agent_args {
                chat.agent_args = agent_args;
            }
            if let Some(ro_mounts) = req.ro_mounts {
                chat.ro_mounts = ro_mounts;
            }
            if let Some(rw_mounts) = req.rw_mounts {
                chat.rw_mounts = rw_mounts;
            }
            if let Some(env_vars) = req.env_vars {
                chat.env_vars = env_vars;
            }
            chat.updated_at = now;
            Some(chat.clone())
        })
        .map_err(|e| HubError::internal(e.to_string()))?
        .ok_or_else(|| HubError::not_found(format!("chat {chat_id} not found")))?;

    Ok(Json(chat))
}

const DELETE_TERMINATE_GRACE: std::time::Duration = std::time::Duration::from_secs(5);

pub async fn delete_chat(Path(id): Path<String>, State(state): State<AppState>) -> ApiResult<StatusCode> {
    let chat_id = ChatId::from_string(id);
    if state.hub.terminal.is_registered(&chat_id) {
        state.hub.terminal.terminate(&chat_id, DELETE_TERMINATE_GRACE).await;
    }
    let removed = state.hub.store.mutate(|s| s.remove_chat(&chat_id)).map_err(|e| HubError::internal(e.to_string()))?;
    let Some(chat) = removed else {
        return Err(HubError::not_found(format!("chat {chat_id} not found")).into());
    };
    agent_hub_storage::state_store::remove_dir_best_effort(std::path::Path::new(&chat.workspace_path));
    Ok(StatusCode::NO_CONTENT)
}

pub async fn chat_logs(Path(id): Path<String>, State(state): State<AppState>) -> ApiResult<String> {
    let chat_id = ChatId::from_string(id);
    if state.hub.store.read(|s| s.chat(&chat_id).is_none()) {
        return Err(HubError::not_found(format!("chat {chat_id} not found")).into());
    }
    let path = state.hub.terminal.log_path(&chat_id);
    Ok(tokio::fs::read_to_string(path).await.unwrap_or_default())
}

pub async fn submit_title_prompt(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<TitlePromptRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let chat_id = ChatId::from_string(id);
    state.hub.record_title_prompt(chat_id, req.prompt)?;
    Ok(Json(serde_json::json!({ "chat_id": chat_id.as_str(), "recorded": true })))
}
