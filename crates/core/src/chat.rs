// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The chat entity (spec section 3): one interactive agent session in
//! its own cloned workspace and container.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactId;
use crate::define_id;
use crate::mount::{EnvVar, Mount};
use crate::project::{Project, ProjectId};

define_id! {
    pub struct ChatId("cht-");
}

pub const TITLE_PROMPT_HISTORY_CAP: usize = 64;
pub const ARTIFACT_LIST_CAP: usize = 200;
pub const PROMPT_ARTIFACT_GROUP_CAP: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Codex,
    Claude,
    Gemini,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    Stopped,
    Starting,
    Running,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleStatus {
    Idle,
    Pending,
    Ready,
    Error,
}

/// The readiness acknowledgement posted by the container entrypoint
/// immediately before it execs the agent process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessAck {
    pub guid: String,
    pub stage: String,
    pub received_at: DateTime<Utc>,
    pub meta: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub project_id: ProjectId,
    pub display_name: String,
    pub title_cached: Option<String>,
    pub agent_type: AgentType,
    pub snapshot_image_tag: String,
    pub workspace_path: String,
    pub ro_mounts: Vec<Mount>,
    pub rw_mounts: Vec<Mount>,
    pub env_vars: Vec<EnvVar>,
    pub agent_args: Vec<String>,
    pub status: ChatStatus,
    pub pid: Option<u32>,
    pub artifact_token_hash: Option<String>,
    pub artifact_token_issued_at: Option<DateTime<Utc>>,
    pub readiness_ack: Option<ReadinessAck>,
    pub ready_ack_guid: Option<String>,

    pub title_prompt_history: Vec<String>,
    pub title_prompt_fingerprint: Option<String>,
    pub title_status: TitleStatus,
    pub title_error: Option<String>,
    pub title_source: Option<String>,
    pub title_updated_at: Option<DateTime<Utc>>,

    pub artifacts: Vec<ArtifactId>,
    pub current_artifact_ids: Vec<ArtifactId>,
    pub prompt_artifact_groups: Vec<Vec<ArtifactId>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn new(id: ChatId, project: &Project, now: DateTime<Utc>) -> Self {
        let display_name = format!("chat-{}", id.short(8));
        Self {
            id,
            project_id: project.id,
            display_name,
            title_cached: None,
            agent_type: AgentType::None,
            snapshot_image_tag: String::new(),
            workspace_path: String::new(),
            ro_mounts: project.default_ro_mounts.clone(),
            rw_mounts: project.default_rw_mounts.clone(),
            env_vars: project.default_env_vars.clone(),
            agent_args: Vec::new(),
            status: ChatStatus::Stopped,
            pid: None,
            artifact_token_hash: None,
            artifact_token_issued_at: None,
            readiness_ack: None,
            ready_ack_guid: None,
            title_prompt_history: Vec::new(),
            title_prompt_fingerprint: None,
            title_status: TitleStatus::Idle,
            title_error: None,
            title_source: None,
            title_updated_at: None,
            artifacts: Vec::new(),
            current_artifact_ids: Vec::new(),
            prompt_artifact_groups: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// A chat may only start when its project is `ready` and the
    /// project's stored snapshot tag still matches its deterministic
    /// tag (the project hasn't drifted out from under an in-flight
    /// rebuild).
    pub fn can_start(&self, project: &Project) -> Result<(), String> {
        if self.status == ChatStatus::Running {
            return Err("chat is already running".to_string());
        }
        if !project.is_snapshot_current() {
            return Err("project is not ready".to_string());
        }
        Ok(())
    }

    pub fn mark_starting(&mut self, snapshot_image_tag: impl Into<String>, now: DateTime<Utc>) {
        self.status = ChatStatus::Starting;
        self.snapshot_image_tag = snapshot_image_tag.into();
        self.updated_at = now;
    }

    pub fn mark_running(&mut self, pid: u32, token_hash: impl Into<String>, now: DateTime<Utc>) {
        self.status = ChatStatus::Running;
        self.pid = Some(pid);
        self.artifact_token_hash = Some(token_hash.into());
        self.artifact_token_issued_at = Some(now);
        self.updated_at = now;
    }

    pub fn mark_stopped(&mut self, now: DateTime<Utc>) {
        self.status = ChatStatus::Stopped;
        self.pid = None;
        self.artifact_token_hash = None;
        self.artifact_token_issued_at = None;
        self.readiness_ack = None;
        self.updated_at = now;
    }

    pub fn mark_failed(&mut self, now: DateTime<Utc>) {
        self.status = ChatStatus::Failed;
        self.pid = None;
        self.updated_at = now;
    }

    /// Append a submitted prompt, coalescing a duplicate of the last
    /// entry and dropping the oldest entry once the cap is exceeded.
    pub fn push_title_prompt(&mut self, prompt: String) {
        if self.title_prompt_history.last() == Some(&prompt) {
            return;
        }
        self.title_prompt_history.push(prompt);
        if self.title_prompt_history.len() > TITLE_PROMPT_HISTORY_CAP {
            self.title_prompt_history.remove(0);
        }
    }

    /// Archive the current-prompt artifact group into the history
    /// stack (called when a new prompt is submitted).
    pub fn archive_current_artifact_group(&mut self) {
        if self.current_artifact_ids.is_empty() {
            return;
        }
        let group = std::mem::take(&mut self.current_artifact_ids);
        self.prompt_artifact_groups.push(group);
        if self.prompt_artifact_groups.len() > PROMPT_ARTIFACT_GROUP_CAP {
            self.prompt_artifact_groups.remove(0);
        }
    }

    /// Record a published artifact id, bounding both the flat list and
    /// the current-prompt group.
    pub fn record_artifact(&mut self, artifact_id: ArtifactId) {
        if !self.artifacts.contains(&artifact_id) {
            self.artifacts.push(artifact_id);
            if self.artifacts.len() > ARTIFACT_LIST_CAP {
                self.artifacts.remove(0);
            }
        }
        if !self.current_artifact_ids.contains(&artifact_id) {
            self.current_artifact_ids.push(artifact_id);
            if self.current_artifact_ids.len() > ARTIFACT_LIST_CAP {
                self.current_artifact_ids.remove(0);
            }
        }
    }
}

/// Sanitize a free-form name into a filesystem-safe path component:
/// runs of non-alphanumeric characters collapse to a single `_`, and
/// the result is trimmed of leading/trailing underscores.
pub fn sanitize_workspace_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    out.trim_matches('_').to_string()
}

/// The host workspace directory name for a chat: `<sanitized project
/// name>_<chat id>`.
pub fn chat_workspace_dir_name(project_display_name: &str, chat_id: &ChatId) -> String {
    let sanitized = sanitize_workspace_component(project_display_name);
    format!("{sanitized}_{chat_id}")
}

#[cfg(test)]
#[path = "chat_tests.rs"]
mod tests;
