// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The chat lifecycle supervisor (spec §4.E): create/start/close/
//! shutdown/clean_start for per-chat containers spawned on a PTY.
//!
//! Grounded on the same single-owner-of-OS-resources split the teacher
//! draws between its job registry and its worker table: this crate
//! owns *when* a chat's process exists, [`crate::terminal::TerminalHub`]
//! owns the PTY fd and reader thread backing it, mirroring §3's
//! ownership rule ("the Supervisor exclusively owns per-chat OS
//! resources").

use std::path::PathBuf;
use std::time::Duration;

use agent_hub_adapters::container::ChatLaunchRequest;
use agent_hub_adapters::pty::PtyProcess;
use agent_hub_adapters::{CredentialVault, GitWorkspace};
use agent_hub_adapters::{ContainerRuntime, PtySize};
use agent_hub_core::chat::chat_workspace_dir_name;
use agent_hub_core::mount::{validate_env_entries, validate_mount};
use agent_hub_core::token::{generate_token, hash_token};
use agent_hub_core::{AgentType, Chat, ChatId, Clock, EnvVar, HubEvent, Mount, Project, ProjectId};
use agent_hub_storage::state_store::remove_dir_best_effort;
use agent_hub_storage::{EventBus, StateStore};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};

use crate::terminal::TerminalHub;

/// Graceful-shutdown deadline before a process group is SIGKILLed.
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error, Clone)]
pub enum ChatSupervisorError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ChatSupervisorError> for agent_hub_core::HubError {
    fn from(err: ChatSupervisorError) -> Self {
        match err {
            ChatSupervisorError::NotFound(m) => agent_hub_core::HubError::NotFound(m),
            ChatSupervisorError::Conflict(m) => agent_hub_core::HubError::Conflict(m),
            ChatSupervisorError::InvalidRequest(m) => agent_hub_core::HubError::InvalidRequest(m),
            ChatSupervisorError::Internal(m) => agent_hub_core::HubError::Internal(m),
        }
    }
}

/// Fields a caller may set when creating a chat; anything left `None`
/// or empty inherits the parent project's defaults (spec §4.E's
/// `create`).
#[derive(Debug, Clone, Default)]
pub struct ChatCreateRequest {
    pub display_name: Option<String>,
    pub agent_type: Option<AgentType>,
    pub agent_args: Vec<String>,
    pub ro_mounts: Option<Vec<Mount>>,
    pub rw_mounts: Option<Vec<Mount>>,
    pub env_vars: Option<Vec<EnvVar>>,
}

pub struct ChatSupervisor {
    store: Arc<StateStore>,
    events: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    container: Arc<dyn ContainerRuntime>,
    git: Arc<dyn GitWorkspace>,
    vault: Arc<CredentialVault>,
    terminal: Arc<TerminalHub>,
    data_dir: PathBuf,
    hub_base_url: String,
    agent_config_file: PathBuf,
}

impl ChatSupervisor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<StateStore>,
        events: Arc<EventBus>,
        clock: Arc<dyn Clock>,
        container: Arc<dyn ContainerRuntime>,
        git: Arc<dyn GitWorkspace>,
        vault: Arc<CredentialVault>,
        terminal: Arc<TerminalHub>,
        data_dir: impl Into<PathBuf>,
        hub_base_url: impl Into<String>,
        agent_config_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            events,
            clock,
            container,
            git,
            vault,
            terminal,
            data_dir: data_dir.into(),
            hub_base_url: hub_base_url.into(),
            agent_config_file: agent_config_file.into(),
        }
    }

    fn chats_dir(&self) -> PathBuf {
        self.data_dir.join("chats")
    }

    pub fn create(&self, project_id: ProjectId, req: ChatCreateRequest) -> Result<Chat, ChatSupervisorError> {
        if let Some(envs) = &req.env_vars {
            validate_env_entries(envs).map_err(ChatSupervisorError::InvalidRequest)?;
        }
        for mounts in [&req.ro_mounts, &req.rw_mounts].into_iter().flatten() {
            for mount in mounts {
                validate_mount(mount).map_err(ChatSupervisorError::InvalidRequest)?;
            }
        }

        let now = self.clock.now();
        let project = self
            .store
            .read(|s| s.project(&project_id).cloned())
            .ok_or_else(|| ChatSupervisorError::NotFound(format!("project {project_id} not found")))?;

        let mut chat = Chat::new(ChatId::new(), &project, now);
        if let Some(name) = req.display_name {
            chat.display_name = name;
        }
        if let Some(agent_type) = req.agent_type {
            chat.agent_type = agent_type;
        }
        chat.agent_args = req.agent_args;
        if let Some(ro) = req.ro_mounts {
            chat.ro_mounts = ro;
        }
        if let Some(rw) = req.rw_mounts {
            chat.rw_mounts = rw;
        }
        if let Some(envs) = req.env_vars {
            chat.env_vars = envs;
        }

        self.store.mutate(|s| s.insert_chat(chat.clone())).map_err(|e| ChatSupervisorError::Internal(e.to_string()))?;
        self.publish_state_changed("chat_created");
        Ok(chat)
    }

    pub async fn start(self: &Arc<Self>, chat_id: ChatId) -> Result<Chat, ChatSupervisorError> {
        let span = info_span!("chat_start", chat_id = %chat_id);
        self.start_inner(chat_id).instrument(span).await
    }

    async fn start_inner(&self, chat_id: ChatId) -> Result<Chat, ChatSupervisorError> {
        let (chat, project) = self.load_chat_and_project(&chat_id)?;

        chat.can_start(&project).map_err(ChatSupervisorError::Conflict)?;
        let tag = project.deterministic_snapshot_tag();
        if project.setup_snapshot_image != tag {
            return Err(ChatSupervisorError::Conflict("project snapshot is out of date".to_string()));
        }
        match self.container.image_exists(&tag).await {
            Ok(true) => {}
            Ok(false) => return Err(ChatSupervisorError::Conflict("project snapshot image is missing".to_string())),
            Err(err) => return Err(ChatSupervisorError::Internal(err.to_string())),
        }

        let workspace_dir_name = chat_workspace_dir_name(&project.display_name, &chat_id);
        let workspace_path = self.chats_dir().join(&workspace_dir_name);
        self.git
            .ensure_clone(&project.repo_url, &workspace_path, project.default_branch.as_deref())
            .await
            .map_err(|e| ChatSupervisorError::Internal(e.to_string()))?;

        let token = generate_token();
        let token_hash = hash_token(&token);
        let ready_ack_guid = generate_token();

        let mut env_pairs: Vec<(String, String)> =
            chat.env_vars.iter().map(|e| (e.key.clone(), e.value.clone())).collect();
        env_pairs.push((
            "AGENT_HUB_ARTIFACTS_URL".to_string(),
            format!("{}/api/chats/{chat_id}/artifacts/publish", self.hub_base_url),
        ));
        env_pairs.push(("AGENT_HUB_ARTIFACT_TOKEN".to_string(), token.clone()));
        env_pairs.push(("AGENT_HUB_READY_ACK_GUID".to_string(), ready_ack_guid.clone()));

        let openai_key_file = self
            .vault
            .openai_status()
            .await
            .ok()
            .filter(|status| status.connected)
            .map(|_| self.vault.openai_env_file_path());
        let ssh_key_file = self
            .vault
            .github_status()
            .await
            .ok()
            .filter(|status| status.connected)
            .map(|_| self.vault.github_ssh_key_file_path());
        let ssh_known_hosts_file =
            ssh_key_file.is_some().then(|| self.vault.github_known_hosts_file_path()).filter(|p| p.exists());

        let request = ChatLaunchRequest {
            snapshot_image_tag: &tag,
            base_image: &project.base_image,
            workspace_host_path: &workspace_path,
            ro_mounts: &chat.ro_mounts,
            rw_mounts: &chat.rw_mounts,
            env_vars: &env_pairs,
            agent_args: &chat.agent_args,
            agent_config_file: &self.agent_config_file,
            openai_key_file: openai_key_file.as_deref(),
            ssh_key_file: ssh_key_file.as_deref(),
            ssh_known_hosts_file: ssh_known_hosts_file.as_deref(),
        };
        let command = self
            .container
            .chat_launch_command(&request)
            .map_err(|e| ChatSupervisorError::Internal(e.to_string()))?;

        let pty = PtyProcess::spawn(&command, PtySize::default()).map_err(|e| ChatSupervisorError::Internal(e.to_string()))?;
        let pid = pty.pid().ok_or_else(|| ChatSupervisorError::Internal("spawned chat process has no pid".to_string()))?;

        self.terminal.register(chat_id, pty).map_err(ChatSupervisorError::Internal)?;

        let now = self.clock.now();
        let updated = self
            .store
            .mutate(|s| {
                let chat = s.chat_mut(&chat_id)?;
                chat.mark_starting(tag.clone(), now);
                chat.workspace_path = workspace_path.display().to_string();
                chat.ready_ack_guid = Some(ready_ack_guid.clone());
                chat.mark_running(pid, token_hash.clone(), now);
                Some(chat.clone())
            })
            .map_err(|e| ChatSupervisorError::Internal(e.to_string()))?
            .ok_or_else(|| ChatSupervisorError::NotFound(format!("chat {chat_id} not found")))?;

        self.publish_state_changed("chat_started");
        info!(pid, "chat started");
        Ok(updated)
    }

    pub async fn close(&self, chat_id: ChatId) -> Result<Chat, ChatSupervisorError> {
        let chat = self
            .store
            .read(|s| s.chat(&chat_id).cloned())
            .ok_or_else(|| ChatSupervisorError::NotFound(format!("chat {chat_id} not found")))?;
        if chat.status != agent_hub_core::ChatStatus::Running {
            return Err(ChatSupervisorError::Conflict("chat is not running".to_string()));
        }

        self.terminal.terminate(&chat_id, TERMINATE_GRACE).await;

        let now = self.clock.now();
        let updated = self
            .store
            .mutate(|s| {
                let chat = s.chat_mut(&chat_id)?;
                chat.mark_stopped(now);
                Some(chat.clone())
            })
            .map_err(|e| ChatSupervisorError::Internal(e.to_string()))?
            .ok_or_else(|| ChatSupervisorError::NotFound(format!("chat {chat_id} not found")))?;

        self.publish_state_changed("chat_closed");
        Ok(updated)
    }

    /// Batch-stop every running chat (spec §4.E `shutdown`, property
    /// I10): SIGTERM broadcast to every running chat's process group in
    /// parallel, SIGKILL for survivors past the deadline, then clear
    /// every chat's `running` status in one final mutation so a
    /// crash-free stop leaves no `running` entries behind.
    pub async fn shutdown(&self) {
        let running: Vec<ChatId> = self.store.read(|s| {
            s.chats.values().filter(|c| c.status == agent_hub_core::ChatStatus::Running).map(|c| c.id).collect()
        });
        if running.is_empty() {
            return;
        }

        let terminations = running.iter().map(|id| self.terminal.terminate(id, TERMINATE_GRACE));
        futures_util::future::join_all(terminations).await;

        let now = self.clock.now();
        let _ = self.store.mutate(|s| {
            for chat_id in &running {
                if let Some(chat) = s.chat_mut(chat_id) {
                    chat.mark_stopped(now);
                }
            }
        });
        self.publish_state_changed("shutdown");
        info!(count = running.len(), "shutdown stopped all running chats");
    }

    /// Wipe every derived filesystem tree and reset every project to
    /// `pending` (spec §4.E `clean_start`).
    pub async fn clean_start(&self) {
        self.shutdown().await;

        remove_dir_best_effort(&self.chats_dir());
        remove_dir_best_effort(&self.data_dir.join("projects"));
        remove_dir_best_effort(&self.data_dir.join("logs"));

        let now = self.clock.now();
        let stale_tags: Vec<String> = self.store.read(|s| {
            s.projects.values().map(|p| p.setup_snapshot_image.clone()).filter(|t| !t.is_empty()).collect()
        });
        let _ = self.store.mutate(|s| {
            for project in s.projects.values_mut() {
                project.invalidate_snapshot(now);
            }
        });
        for tag in stale_tags {
            if let Err(err) = self.container.remove_image(&tag).await {
                warn!(tag, error = %err, "failed to remove stale snapshot image during clean_start");
            }
        }
        self.publish_state_changed("clean_start");
    }

    fn load_chat_and_project(&self, chat_id: &ChatId) -> Result<(Chat, Project), ChatSupervisorError> {
        self.store.read(|s| {
            let chat = s.chat(chat_id).cloned().ok_or_else(|| ChatSupervisorError::NotFound(format!("chat {chat_id} not found")))?;
            let project = s
                .project(&chat.project_id)
                .cloned()
                .ok_or_else(|| ChatSupervisorError::NotFound(format!("project {} not found", chat.project_id)))?;
            Ok((chat, project))
        })
    }

    fn publish_state_changed(&self, reason: &str) {
        self.events.publish(HubEvent::StateChanged { reason: reason.to_string() }.into_envelope(self.clock.now()));
    }
}

#[cfg(test)]
#[path = "chat_supervisor_tests.rs"]
mod tests;
