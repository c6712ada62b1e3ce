// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `test-support`-gated fakes standing in for `DockerRuntime` and
//! `LocalGitWorkspace` so `agent-hub-engine`'s tests exercise real
//! supervisor logic without shelling out to `docker` or `git`.

use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::container::{BuildSnapshotRequest, ChatLaunchRequest, CommandSpec, ContainerError, ContainerRuntime};
use crate::git_workspace::{GitError, GitWorkspace};

pub struct FakeContainerRuntime {
    image_exists: Mutex<bool>,
    build_result: Mutex<Result<(), String>>,
    launch_command: Mutex<CommandSpec>,
    build_log_lines: Mutex<Vec<String>>,
    build_calls: Mutex<Vec<String>>,
    last_launch_had_openai_key_file: Mutex<Option<bool>>,
    last_launch_env_vars: Mutex<Vec<(String, String)>>,
}

impl Default for FakeContainerRuntime {
    fn default() -> Self {
        Self {
            image_exists: Mutex::new(false),
            build_result: Mutex::new(Ok(())),
            launch_command: Mutex::new(CommandSpec {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), "cat".to_string()],
                env: Vec::new(),
            }),
            build_log_lines: Mutex::new(vec!["build ok".to_string()]),
            build_calls: Mutex::new(Vec::new()),
            last_launch_had_openai_key_file: Mutex::new(None),
            last_launch_env_vars: Mutex::new(Vec::new()),
        }
    }
}

impl FakeContainerRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_image_exists(&self, exists: bool) {
        *self.image_exists.lock() = exists;
    }

    pub fn set_build_failure(&self, message: impl Into<String>) {
        *self.build_result.lock() = Err(message.into());
    }

    pub fn set_launch_command(&self, command: CommandSpec) {
        *self.launch_command.lock() = command;
    }

    pub fn build_calls(&self) -> Vec<String> {
        self.build_calls.lock().clone()
    }

    /// Whether the most recent `chat_launch_command` call carried an
    /// OpenAI credential file (property I2: checked alongside
    /// `last_launch_env_vars` never containing a raw `OPENAI_API_KEY`).
    pub fn last_launch_had_openai_key_file(&self) -> Option<bool> {
        *self.last_launch_had_openai_key_file.lock()
    }

    pub fn last_launch_env_vars(&self) -> Vec<(String, String)> {
        self.last_launch_env_vars.lock().clone()
    }
}

#[async_trait]
impl ContainerRuntime for FakeContainerRuntime {
    async fn image_exists(&self, _tag: &str) -> Result<bool, ContainerError> {
        Ok(*self.image_exists.lock())
    }

    async fn build_snapshot(
        &self,
        req: BuildSnapshotRequest<'_>,
        log_tx: tokio::sync::mpsc::Sender<String>,
    ) -> Result<(), ContainerError> {
        self.build_calls.lock().push(req.tag.to_string());
        for line in self.build_log_lines.lock().iter() {
            let _ = log_tx.send(line.clone()).await;
        }
        match self.build_result.lock().clone() {
            Ok(()) => Ok(()),
            Err(message) => {
                Err(ContainerError::CommandFailed { command: "fake-build".to_string(), stderr: message })
            }
        }
    }

    fn chat_launch_command(&self, req: &ChatLaunchRequest<'_>) -> Result<CommandSpec, ContainerError> {
        *self.last_launch_had_openai_key_file.lock() = Some(req.openai_key_file.is_some());
        *self.last_launch_env_vars.lock() = req.env_vars.to_vec();
        Ok(self.launch_command.lock().clone())
    }

    async fn remove_image(&self, _tag: &str) -> Result<(), ContainerError> {
        Ok(())
    }
}

pub struct FakeGitWorkspace {
    resolved_branch: Mutex<String>,
    fail_on_ensure: Mutex<Option<String>>,
    ensure_calls: Mutex<Vec<String>>,
}

impl Default for FakeGitWorkspace {
    fn default() -> Self {
        Self {
            resolved_branch: Mutex::new("main".to_string()),
            fail_on_ensure: Mutex::new(None),
            ensure_calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeGitWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_resolved_branch(&self, branch: impl Into<String>) {
        *self.resolved_branch.lock() = branch.into();
    }

    pub fn set_ensure_failure(&self, message: impl Into<String>) {
        *self.fail_on_ensure.lock() = Some(message.into());
    }

    pub fn ensure_calls(&self) -> Vec<String> {
        self.ensure_calls.lock().clone()
    }
}

#[async_trait]
impl GitWorkspace for FakeGitWorkspace {
    async fn ensure_clone(
        &self,
        repo_url: &str,
        path: &Path,
        preferred_branch: Option<&str>,
    ) -> Result<String, GitError> {
        self.ensure_calls.lock().push(repo_url.to_string());
        if let Some(message) = self.fail_on_ensure.lock().clone() {
            return Err(GitError::CommandFailed { command: "fake-clone".to_string(), stderr: message });
        }
        tokio::fs::create_dir_all(path).await.map_err(GitError::Exec)?;
        Ok(preferred_branch.map(str::to_string).unwrap_or_else(|| self.resolved_branch.lock().clone()))
    }

    async fn resolve_default_branch(&self, _repo_url: &str) -> Result<String, GitError> {
        Ok(self.resolved_branch.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_container_runtime_records_build_calls() {
        let runtime = FakeContainerRuntime::new();
        let ro = [];
        let rw = [];
        let env = [];
        let req = BuildSnapshotRequest {
            tag: "setup-abc-123",
            base_image: &agent_hub_core::BaseImageRef::Tag { value: "ubuntu:22.04".to_string() },
            repo_checkout: Path::new("/tmp/doesnotmatter"),
            setup_script: "echo hi",
            ro_mounts: &ro,
            rw_mounts: &rw,
            env_vars: &env,
            agent_config_file: Path::new("/tmp/doesnotmatter/agent.toml"),
            openai_credentials_file: Path::new("/tmp/doesnotmatter/openai.env"),
            ssh_key_file: None,
            ssh_known_hosts_file: None,
        };
        let (tx, mut rx) = tokio::sync::mpsc::channel(8);
        runtime.build_snapshot(req, tx).await.unwrap();
        assert_eq!(runtime.build_calls(), vec!["setup-abc-123".to_string()]);
        assert_eq!(rx.recv().await.unwrap(), "build ok");
    }

    #[tokio::test]
    async fn fake_git_workspace_creates_the_target_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("chat-workspace");
        let workspace = FakeGitWorkspace::new();
        let branch = workspace.ensure_clone("https://example.test/repo.git", &target, None).await.unwrap();
        assert_eq!(branch, "main");
        assert!(target.exists());
    }
}
