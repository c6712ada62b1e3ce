// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project CRUD and the project-scoped "start a chat" convenience
//! route (spec §4.B, §4.E, §6).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use agent_hub_core::{AgentType, BaseImageRef, EnvVar, HubError, Mount, Project, ProjectId};
use agent_hub_engine::ChatCreateRequest;

use crate::api_error::ApiResult;
use crate::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    display_name: String,
    repo_url: String,
    setup_script: String,
    base_image: BaseImageRef,
    default_branch: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchProjectRequest {
    display_name: Option<String>,
    setup_script: Option<String>,
    base_image: Option<BaseImageRef>,
    default_branch: Option<Option<String>>,
    default_ro_mounts: Option<Vec<Mount>>,
    default_rw_mounts: Option<Vec<Mount>>,
    default_env_vars: Option<Vec<EnvVar>>,
}

#[derive(Debug, Deserialize)]
pub struct StartChatForProjectRequest {
    #[serde(default)]
    agent_args: Vec<String>,
    #[serde(default)]
    #[allow(dead_code)]
    request_id: Option<String>,
    agent_type: Option<AgentType>,
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<Json<Project>> {
    let now = state.hub.clock.now();
    let mut project = Project::new(ProjectId::new(), req.display_name, req.repo_url, req.setup_script, req.base_image, now);
    if let Some(branch) = req.default_branch {
        project.set_default_branch(Some(branch), now);
    }

    let project_id = project.id;
    state.hub.store.mutate(|s| s.insert_project(project.clone())).map_err(|e| HubError::internal(e.to_string()))?;
    state.hub.snapshot_builder.trigger(project_id);

    Ok(Json(project))
}

pub async fn patch_project(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<PatchProjectRequest>,
) -> ApiResult<Json<Project>> {
    let project_id = ProjectId::from_string(id);
    let now = state.hub.clock.now();

    let project = state
        .hub
        .store
        .mutate(|s| {
            let project = s.project_mut(&project_id)?;
            if let Some(display_name) = req.display_name {
                project.display_name = display_name;
                project.updated_at = now;
            }
            if let Some(script) = req.setup_script {
                project.set_setup_script(script, now);
            }
            if let Some(base_image) = req.base_image {
                project.set_base_image(base_image, now);
            }
            if let Some(branch) = req.default_branch {
                project.set_default_branch(branch, now);
            }
            if req.default_ro_mounts.is_some() || req.default_rw_mounts.is_some() {
                let ro = req.default_ro_mounts.clone().unwrap_or_else(|| project.default_ro_mounts.clone());
                let rw = req.default_rw_mounts.clone().unwrap_or_else(|| project.default_rw_mounts.clone());
                project.set_default_mounts(ro, rw, now);
            }
            if let Some(env_vars) = req.default_env_vars {
                project.set_default_env_vars(env_vars, now);
            }
            Some(project.clone())
        })
        .map_err(|e| HubError::internal(e.to_string()))?
        .ok_or_else(|| HubError::not_found(format!("project {project_id} not found")))?;

    state.hub.snapshot_builder.trigger(project_id);

    Ok(Json(project))
}

const DELETE_TERMINATE_GRACE: std::time::Duration = std::time::Duration::from_secs(5);

pub async fn delete_project(Path(id): Path<String>, State(state): State<AppState>) -> ApiResult<StatusCode> {
    let project_id = ProjectId::from_string(id);

    let chat_ids: Vec<agent_hub_core::ChatId> =
        state.hub.store.read(|s| s.chats_for_project(&project_id).into_iter().map(|c| c.id).collect());
    for chat_id in &chat_ids {
        if state.hub.terminal.is_registered(chat_id) {
            state.hub.terminal.terminate(chat_id, DELETE_TERMINATE_GRACE).await;
        }
        let removed = state.hub.store.mutate(|s| s.remove_chat(chat_id)).map_err(|e| HubError::internal(e.to_string()))?;
        if let Some(chat) = removed {
            agent_hub_storage::state_store::remove_dir_best_effort(std::path::Path::new(&chat.workspace_path));
        }
    }

    let removed = state
        .hub
        .store
        .mutate(|s| s.remove_project(&project_id))
        .map_err(|e| HubError::internal(e.to_string()))?;
    let Some(_project) = removed else {
        return Err(HubError::not_found(format!("project {project_id} not found")).into());
    };

    agent_hub_storage::state_store::remove_dir_best_effort(&state.hub.snapshot_builder.checkout_dir(&project_id));

    Ok(StatusCode::NO_CONTENT)
}

pub async fn build_logs(Path(id): Path<String>, State(state): State<AppState>) -> ApiResult<String> {
    let project_id = ProjectId::from_string(id);
    if state.hub.store.read(|s| s.project(&project_id).is_none()) {
        return Err(HubError::not_found(format!("project {project_id} not found")).into());
    }
    let path = state.hub.snapshot_builder.log_path(&project_id);
    Ok(tokio::fs::read_to_string(path).await.unwrap_or_default())
}

pub async fn start_chat_for_project(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<StartChatForProjectRequest>,
) -> ApiResult<Json<agent_hub_core::Chat>> {
    let project_id = ProjectId::from_string(id);
    let create_req = ChatCreateRequest { agent_type: req.agent_type, agent_args: req.agent_args, ..Default::default() };
    let chat = state.hub.chat_supervisor.create(project_id, create_req)?;
    let chat = state.hub.chat_supervisor.start(chat.id).await?;
    Ok(Json(chat))
}
