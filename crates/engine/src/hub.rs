// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The composition root (spec §4.I intro): wires `state.json`, the
//! event bus, the OS-facing adapters, and every engine component into
//! one handle the facade holds for the life of the process.
//!
//! This is the single place that connects
//! [`crate::terminal::TerminalHub`]'s submission callback to
//! [`crate::title_pipeline::TitlePipeline::trigger`] — a wiring
//! deliberately left out of `terminal.rs` itself so that crate stays
//! ignorant of the title pipeline's existence.

use std::path::PathBuf;
use std::sync::Arc;

use agent_hub_adapters::container::DockerRuntime;
use agent_hub_adapters::git_workspace::LocalGitWorkspace;
use agent_hub_adapters::CredentialVault;
use agent_hub_core::{Clock, SystemClock};
use agent_hub_storage::state_store::LoginSessionStore;
use agent_hub_storage::{EventBus, StateStore, StateStoreError};

use crate::agent_tools::AgentToolsRouter;
use crate::chat_supervisor::ChatSupervisor;
use crate::snapshot_builder::SnapshotBuilder;
use crate::terminal::TerminalHub;
use crate::title_pipeline::{ProcessTitleGenerator, TitlePipeline};

/// Tunable knobs that don't belong on any single entity (spec §11
/// config surface): the title model and its truncation cap.
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub data_dir: PathBuf,
    /// Forwarded verbatim to every `agent_cli` invocation's own
    /// `--config-file` flag; opaque to the hub itself.
    pub agent_config_file: PathBuf,
    pub hub_base_url: String,
    pub title_model: String,
    pub title_max_chars: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            agent_config_file: PathBuf::from("./data/agent.config.toml"),
            hub_base_url: "http://127.0.0.1:4123".to_string(),
            title_model: "gpt-4o-mini".to_string(),
            title_max_chars: 72,
        }
    }
}

/// The fully wired hub: every facade route is a thin call into one of
/// these fields.
pub struct Hub {
    pub store: Arc<StateStore>,
    pub events: Arc<EventBus>,
    pub login_sessions: Arc<LoginSessionStore>,
    pub vault: Arc<CredentialVault>,
    pub clock: Arc<dyn Clock>,
    pub snapshot_builder: Arc<SnapshotBuilder>,
    pub terminal: Arc<TerminalHub>,
    pub title_pipeline: Arc<TitlePipeline>,
    pub chat_supervisor: Arc<ChatSupervisor>,
    pub agent_tools: Arc<AgentToolsRouter>,
}

impl Hub {
    /// Build every component against real OS-facing adapters (`docker`,
    /// `git`, `portable-pty`, the OpenAI API) and wire the terminal's
    /// submission callback to the title pipeline.
    pub fn new(config: HubConfig) -> Result<Arc<Self>, StateStoreError> {
        let store = Arc::new(StateStore::load(config.data_dir.join("state.json"))?);
        let events = Arc::new(EventBus::default());
        let login_sessions = Arc::new(LoginSessionStore::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let container = Arc::new(DockerRuntime::new());
        let git = Arc::new(LocalGitWorkspace::new());
        let vault = Arc::new(CredentialVault::new(config.data_dir.join("secrets")));

        let snapshot_builder = SnapshotBuilder::new(
            Arc::clone(&store),
            Arc::clone(&events),
            Arc::clone(&clock),
            container.clone() as Arc<dyn agent_hub_adapters::ContainerRuntime>,
            git.clone() as Arc<dyn agent_hub_adapters::GitWorkspace>,
            Arc::clone(&vault),
            &config.data_dir,
            &config.agent_config_file,
        );

        let terminal =
            TerminalHub::new(Arc::clone(&store), Arc::clone(&clock), Arc::clone(&events), &config.data_dir);

        let title_generator = Arc::new(ProcessTitleGenerator::new(Arc::clone(&vault)));
        let title_pipeline = TitlePipeline::new(
            Arc::clone(&store),
            Arc::clone(&events),
            Arc::clone(&clock),
            title_generator,
            config.title_model.clone(),
            config.title_max_chars,
        );

        let chat_supervisor = Arc::new(ChatSupervisor::new(
            Arc::clone(&store),
            Arc::clone(&events),
            Arc::clone(&clock),
            container as Arc<dyn agent_hub_adapters::ContainerRuntime>,
            git as Arc<dyn agent_hub_adapters::GitWorkspace>,
            Arc::clone(&vault),
            Arc::clone(&terminal),
            &config.data_dir,
            config.hub_base_url.clone(),
            &config.agent_config_file,
        ));

        let agent_tools = Arc::new(AgentToolsRouter::new(
            Arc::clone(&store),
            Arc::clone(&events),
            Arc::clone(&clock),
            Arc::clone(&vault),
            &config.data_dir,
        ));

        let on_submit_pipeline = Arc::clone(&title_pipeline);
        terminal.set_on_submit(Arc::new(move |chat_id, _prompt| {
            on_submit_pipeline.trigger(chat_id);
        }));

        Ok(Arc::new(Self {
            store,
            events,
            login_sessions,
            vault,
            clock,
            snapshot_builder,
            terminal,
            title_pipeline,
            chat_supervisor,
            agent_tools,
        }))
    }

    /// Resume every project left `building` at the previous process's
    /// exit (a crash mid-build leaves the document in that state; the
    /// worker re-attempts from scratch since no partial image was
    /// committed).
    pub fn resume_interrupted_builds(self: &Arc<Self>) {
        let stale: Vec<agent_hub_core::ProjectId> = self.store.read(|s| {
            s.projects
                .values()
                .filter(|p| p.build_status == agent_hub_core::BuildStatus::Building)
                .map(|p| p.id)
                .collect()
        });
        for project_id in stale {
            self.snapshot_builder.trigger(project_id);
        }
    }

    /// Graceful shutdown: stop every running chat's process group
    /// (spec §4.E `shutdown`).
    pub async fn shutdown(&self) {
        self.chat_supervisor.shutdown().await;
    }

    /// Record a manually-submitted title prompt (`POST
    /// /api/chats/{id}/title-prompt`) and re-trigger the title pipeline
    /// with it folded into the prompt window, the same way a prompt
    /// detected from terminal input would.
    pub fn record_title_prompt(
        self: &Arc<Self>,
        chat_id: agent_hub_core::ChatId,
        prompt: String,
    ) -> Result<agent_hub_core::Chat, agent_hub_core::HubError> {
        let sanitized = agent_hub_core::prompt::sanitize_submitted_prompt(&prompt);
        if sanitized.is_empty() {
            return Err(agent_hub_core::HubError::invalid_request("prompt must not be empty"));
        }
        let now = self.clock.now();
        let chat = self.store.mutate(|s| {
            let chat = s.chat_mut(&chat_id)?;
            chat.push_title_prompt(sanitized.clone());
            chat.updated_at = now;
            Some(chat.clone())
        });
        match chat {
            Ok(Some(chat)) => {
                self.events.publish(
                    agent_hub_core::HubEvent::StateChanged { reason: "title_prompt_recorded".to_string() }
                        .into_envelope(now),
                );
                self.title_pipeline.trigger(chat_id);
                Ok(chat)
            }
            Ok(None) => Err(agent_hub_core::HubError::not_found("chat not found")),
            Err(err) => Err(agent_hub_core::HubError::internal(err.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
