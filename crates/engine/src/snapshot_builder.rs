// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-project snapshot builder (spec §4.D): a single-flight worker
//! loop that turns a project's setup script + base image into a cached,
//! content-addressed container image.
//!
//! Grounded on the teacher's per-resource worker-table idiom
//! (`build_lock` in spec §5 maps onto `daemon/src/engine`'s
//! per-job/per-worker task registries): `trigger` either starts a fresh
//! worker loop or is a no-op if one is already in flight for the
//! project, since that worker's own re-check-after-finish step will
//! pick up whatever configuration is current by the time it loops.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use agent_hub_adapters::container::BuildSnapshotRequest;
use agent_hub_adapters::{ContainerRuntime, CredentialVault, GitWorkspace};
use agent_hub_core::{BuildStatus, Clock, HubEvent, Project, ProjectId};
use agent_hub_storage::{EventBus, StateStore};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{info, info_span, warn, Instrument};

pub struct SnapshotBuilder {
    store: Arc<StateStore>,
    events: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    container: Arc<dyn ContainerRuntime>,
    git: Arc<dyn GitWorkspace>,
    vault: Arc<CredentialVault>,
    data_dir: PathBuf,
    agent_config_file: PathBuf,
    inflight: Mutex<HashSet<String>>,
}

impl SnapshotBuilder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<StateStore>,
        events: Arc<EventBus>,
        clock: Arc<dyn Clock>,
        container: Arc<dyn ContainerRuntime>,
        git: Arc<dyn GitWorkspace>,
        vault: Arc<CredentialVault>,
        data_dir: impl Into<PathBuf>,
        agent_config_file: impl Into<PathBuf>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            events,
            clock,
            container,
            git,
            vault,
            data_dir: data_dir.into(),
            agent_config_file: agent_config_file.into(),
            inflight: Mutex::new(HashSet::new()),
        })
    }

    fn projects_dir(&self, project_id: &ProjectId) -> PathBuf {
        self.data_dir.join("projects").join(project_id.as_str())
    }

    /// The project's repo checkout directory, exposed so `DELETE
    /// /api/projects/{id}` can remove it alongside the state record.
    pub fn checkout_dir(&self, project_id: &ProjectId) -> PathBuf {
        self.projects_dir(project_id)
    }

    /// Path of the build log file the facade reads back for `GET
    /// /api/projects/{id}/build-logs`.
    pub fn log_path(&self, project_id: &ProjectId) -> PathBuf {
        self.data_dir.join("logs").join(format!("project-{project_id}.log"))
    }

    /// Ensure a build worker is running for `project_id`. Coalesces
    /// rapid-fire configuration edits: if a worker is already in
    /// flight, this is a no-op — its own loop will see the project is
    /// `pending` again after its current attempt finishes (spec §4.D,
    /// property I4).
    pub fn trigger(self: &Arc<Self>, project_id: ProjectId) {
        let mut inflight = self.inflight.lock();
        if !inflight.insert(project_id.as_str().to_string()) {
            return;
        }
        drop(inflight);

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.worker_loop(project_id).await;
        });
    }

    async fn worker_loop(self: Arc<Self>, project_id: ProjectId) {
        loop {
            let status = self.store.read(|s| s.project(&project_id).map(|p| p.build_status));
            match status {
                Some(BuildStatus::Pending) | Some(BuildStatus::Building) => {
                    let span = info_span!("snapshot_build", project_id = %project_id);
                    self.build_attempt(&project_id).instrument(span).await;
                }
                _ => break,
            }
            let still_pending =
                self.store.read(|s| s.project(&project_id).map(|p| p.build_status)) == Some(BuildStatus::Pending);
            if !still_pending {
                break;
            }
        }
        self.inflight.lock().remove(project_id.as_str());
    }

    async fn build_attempt(&self, project_id: &ProjectId) {
        let now = self.clock.now();
        let Some(project) = self.store.read(|s| s.project(project_id).cloned()) else {
            return;
        };

        self.store
            .mutate(|s| {
                if let Some(p) = s.project_mut(project_id) {
                    p.mark_building(now);
                }
            })
            .ok();
        self.publish_state_changed("project_build_building");

        let log_path = self.log_path(project_id);
        if let Some(parent) = log_path.parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }
        let _ = tokio::fs::write(&log_path, b"").await;
        self.publish_log(project_id, String::new(), true);

        let tag = project.deterministic_snapshot_tag();

        if let Err(err) = self.sync_repo(&project).await {
            self.fail(project_id, &format!("failed to sync repository: {err}")).await;
            return;
        }

        match self.container.image_exists(&tag).await {
            Ok(true) => {
                self.append_log(project_id, format!("Using cached setup snapshot image '{tag}'")).await;
            }
            Ok(false) => {
                if let Err(err) = self.run_build(&project, &tag, project_id).await {
                    self.fail(project_id, &err).await;
                    return;
                }
            }
            Err(err) => {
                self.fail(project_id, &format!("failed to inspect image store: {err}")).await;
                return;
            }
        }

        let finished_at = self.clock.now();
        self.store
            .mutate(|s| {
                if let Some(p) = s.project_mut(project_id) {
                    p.mark_ready(tag.clone(), finished_at);
                }
            })
            .ok();
        self.publish_state_changed("project_build_ready");
        info!(tag = %tag, "project snapshot ready");
    }

    async fn sync_repo(&self, project: &Project) -> Result<(), String> {
        let checkout = self.projects_dir(&project.id);
        self.git
            .ensure_clone(&project.repo_url, &checkout, project.default_branch.as_deref())
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn run_build(&self, project: &Project, tag: &str, project_id: &ProjectId) -> Result<(), String> {
        let checkout = self.projects_dir(&project.id);
        let (tx, mut rx) = mpsc::channel::<String>(256);

        let log_path = self.log_path(project_id);
        let events = Arc::clone(&self.events);
        let project_id_owned = project_id.clone();
        let forward_task = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                append_log_line(&log_path, &line).await;
                events.publish(
                    HubEvent::ProjectBuildLog { project_id: project_id_owned.as_str().to_string(), text: line, replace: false }
                        .into_envelope(chrono::Utc::now()),
                );
            }
        });

        let openai_credentials_file = self.vault.openai_env_file_path();
        let ssh_key_file = self
            .vault
            .github_status()
            .await
            .ok()
            .filter(|status| status.connected)
            .map(|_| self.vault.github_ssh_key_file_path());
        let ssh_known_hosts_file =
            ssh_key_file.is_some().then(|| self.vault.github_known_hosts_file_path()).filter(|p| p.exists());

        let request = BuildSnapshotRequest {
            tag,
            base_image: &project.base_image,
            repo_checkout: &checkout,
            setup_script: &project.setup_script,
            ro_mounts: &project.default_ro_mounts,
            rw_mounts: &project.default_rw_mounts,
            env_vars: &project.default_env_vars,
            agent_config_file: &self.agent_config_file,
            openai_credentials_file: &openai_credentials_file,
            ssh_key_file: ssh_key_file.as_deref(),
            ssh_known_hosts_file: ssh_known_hosts_file.as_deref(),
        };
        let result = self.container.build_snapshot(request, tx).await;
        let _ = forward_task.await;
        result.map_err(|e| e.to_string())
    }

    async fn append_log(&self, project_id: &ProjectId, line: String) {
        append_log_line(&self.log_path(project_id), &line).await;
        self.publish_log(project_id, line, false);
    }

    async fn fail(&self, project_id: &ProjectId, message: &str) {
        warn!(error = message, "project snapshot build failed");
        self.append_log(project_id, format!("build failed: {message}")).await;
        let now = self.clock.now();
        self.store
            .mutate(|s| {
                if let Some(p) = s.project_mut(project_id) {
                    p.mark_failed(message, now);
                }
            })
            .ok();
        self.publish_state_changed("project_build_failed");
    }

    fn publish_state_changed(&self, reason: &str) {
        self.events.publish(HubEvent::StateChanged { reason: reason.to_string() }.into_envelope(self.clock.now()));
    }

    fn publish_log(&self, project_id: &ProjectId, text: String, replace: bool) {
        self.events.publish(
            HubEvent::ProjectBuildLog { project_id: project_id.as_str().to_string(), text, replace }
                .into_envelope(self.clock.now()),
        );
    }
}

async fn append_log_line(path: &std::path::Path, line: &str) {
    use tokio::io::AsyncWriteExt;
    if let Ok(mut file) = tokio::fs::OpenOptions::new().create(true).append(true).open(path).await {
        let _ = file.write_all(line.as_bytes()).await;
        let _ = file.write_all(b"\n").await;
    }
}

#[cfg(test)]
#[path = "snapshot_builder_tests.rs"]
mod tests;
