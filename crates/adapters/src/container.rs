// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The container runtime adapter (spec §4.D, §4.E, §9 Open Question 4).
//!
//! Building a snapshot and launching a chat both go through the
//! external `agent_cli` command rather than the hub shelling to
//! `docker` directly — `docker` lives *inside* `agent_cli`. The hub's
//! only remaining direct `docker` calls are image-store bookkeeping
//! (`image inspect`, `rmi`) that has nothing to do with running a
//! project's code. Everything about the agent process (codex/claude/
//! gemini) happens *inside* the container, execed by the entrypoint
//! described at spec §6's interface boundary — the hub only assembles
//! the `agent_cli` command vector and hands it to
//! [`crate::pty::PtyProcess`] for PTY-attached spawning (Open Question
//! 4: a PTY-attached child, not a detached container bridged over a
//! second transport).

use std::path::Path;

use agent_hub_core::mount::{EnvVar, Mount};
use agent_hub_core::project::BaseImageRef;
use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("failed to exec command: {0}")]
    Exec(std::io::Error),
    #[error("{command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
    #[error("base image path {0:?} escapes the project workspace")]
    BaseImageOutsideWorkspace(String),
}

/// A resolved shell command vector, ready to hand to a PTY.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

/// Everything needed to build and commit a project's setup snapshot.
pub struct BuildSnapshotRequest<'a> {
    pub tag: &'a str,
    pub base_image: &'a BaseImageRef,
    pub repo_checkout: &'a Path,
    pub setup_script: &'a str,
    pub ro_mounts: &'a [Mount],
    pub rw_mounts: &'a [Mount],
    pub env_vars: &'a [EnvVar],
    /// Forwarded verbatim as `agent_cli`'s own `--config-file` (spec
    /// §4.D).
    pub agent_config_file: &'a Path,
    /// Forwarded as `--credentials-file` unconditionally; `agent_cli`
    /// itself tolerates the file being absent.
    pub openai_credentials_file: &'a Path,
    pub ssh_key_file: Option<&'a Path>,
    pub ssh_known_hosts_file: Option<&'a Path>,
}

/// Everything needed to assemble a chat's PTY-attached launcher command.
pub struct ChatLaunchRequest<'a> {
    pub snapshot_image_tag: &'a str,
    pub base_image: &'a BaseImageRef,
    pub workspace_host_path: &'a Path,
    pub ro_mounts: &'a [Mount],
    pub rw_mounts: &'a [Mount],
    pub env_vars: &'a [(String, String)],
    pub agent_args: &'a [String],
    /// Forwarded verbatim as `agent_cli`'s own `--config-file` (spec
    /// §4.E step 3).
    pub agent_config_file: &'a Path,
    /// Host path of the vault's OpenAI credential file, passed as
    /// `agent_cli`'s `--credentials-file` rather than an inline
    /// `OPENAI_API_KEY=` env entry (spec §4.E "credential file flag",
    /// property I2).
    pub openai_key_file: Option<&'a Path>,
    pub ssh_key_file: Option<&'a Path>,
    pub ssh_known_hosts_file: Option<&'a Path>,
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// `true` if `tag` already exists in the local image store (the
    /// snapshot-builder cache-reuse check, spec §4.D).
    async fn image_exists(&self, tag: &str) -> Result<bool, ContainerError>;

    /// Run the project's setup script inside a container started from
    /// the resolved base image, commit the result to `req.tag`,
    /// streaming combined stdout/stderr lines through `log_tx` as they
    /// arrive.
    async fn build_snapshot(
        &self,
        req: BuildSnapshotRequest<'_>,
        log_tx: mpsc::Sender<String>,
    ) -> Result<(), ContainerError>;

    /// Assemble (but do not spawn) the `agent_cli` command vector for
    /// a chat's PTY-attached session.
    fn chat_launch_command(&self, req: &ChatLaunchRequest<'_>) -> Result<CommandSpec, ContainerError>;

    /// Best-effort removal of a cached snapshot image (`clean_start`).
    async fn remove_image(&self, tag: &str) -> Result<(), ContainerError>;
}

/// Shells out to the `docker` CLI found on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct DockerRuntime;

impl DockerRuntime {
    pub fn new() -> Self {
        Self
    }

    fn mount_args(ro_mounts: &[Mount], rw_mounts: &[Mount]) -> Vec<String> {
        let mut args = Vec::new();
        for mount in ro_mounts {
            args.push("--ro-mount".to_string());
            args.push(format!("{}:{}", mount.host_path, mount.container_path));
        }
        for mount in rw_mounts {
            args.push("--rw-mount".to_string());
            args.push(format!("{}:{}", mount.host_path, mount.container_path));
        }
        args
    }

    /// `--credentials-file <path>`, passed unconditionally; `agent_cli`
    /// tolerates the file being absent.
    fn credentials_args(openai_credentials_file: &Path) -> Vec<String> {
        vec!["--credentials-file".to_string(), openai_credentials_file.display().to_string()]
    }

    /// `--git-ssh-key-file`/`--git-ssh-known-hosts-file`, present only
    /// when the vault has materialized a deploy key for this chat.
    fn github_ssh_args(ssh_key_file: Option<&Path>, ssh_known_hosts_file: Option<&Path>) -> Vec<String> {
        match (ssh_key_file, ssh_known_hosts_file) {
            (Some(key), Some(known_hosts)) => vec![
                "--git-ssh-key-file".to_string(),
                key.display().to_string(),
                "--git-ssh-known-hosts-file".to_string(),
                known_hosts.display().to_string(),
            ],
            _ => Vec::new(),
        }
    }

    /// `--base-image <value>` for a registry tag, or `--base
    /// <resolved-path>` for a path inside the project's own checkout —
    /// the latter validated to stay under `repo_checkout` so a project
    /// can't point the launcher outside its clone.
    fn base_image_args(base_image: &BaseImageRef, repo_checkout: &Path) -> Result<Vec<String>, ContainerError> {
        match base_image {
            BaseImageRef::Tag { value } => Ok(vec!["--base-image".to_string(), value.clone()]),
            BaseImageRef::RepoPath { value } => {
                let resolved = repo_checkout.join(value);
                let canonical_checkout =
                    repo_checkout.canonicalize().map_err(ContainerError::Exec)?;
                let canonical_resolved = resolved.canonicalize().map_err(ContainerError::Exec)?;
                if !canonical_resolved.starts_with(&canonical_checkout) {
                    return Err(ContainerError::BaseImageOutsideWorkspace(value.clone()));
                }
                Ok(vec!["--base".to_string(), canonical_resolved.display().to_string()])
            }
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn image_exists(&self, tag: &str) -> Result<bool, ContainerError> {
        let output = Command::new("docker").args(["image", "inspect", tag]).output().await.map_err(ContainerError::Exec)?;
        Ok(output.status.success())
    }

    async fn build_snapshot(
        &self,
        req: BuildSnapshotRequest<'_>,
        log_tx: mpsc::Sender<String>,
    ) -> Result<(), ContainerError> {
        let mut args: Vec<String> = vec![
            "--project".to_string(),
            req.repo_checkout.display().to_string(),
            "--config-file".to_string(),
            req.agent_config_file.display().to_string(),
            "--no-alt-screen".to_string(),
        ];
        args.extend(Self::credentials_args(req.openai_credentials_file));
        args.extend(Self::github_ssh_args(req.ssh_key_file, req.ssh_known_hosts_file));
        args.extend(Self::base_image_args(req.base_image, req.repo_checkout)?);
        args.extend(Self::mount_args(req.ro_mounts, req.rw_mounts));
        for env in req.env_vars {
            args.push("--env-var".to_string());
            args.push(format!("{}={}", env.key, env.value));
        }
        args.push("--snapshot-image-tag".to_string());
        args.push(req.tag.to_string());
        args.push("--setup-script".to_string());
        args.push(req.setup_script.to_string());
        args.push("--prepare-snapshot-only".to_string());

        stream_command("agent_cli", &args, log_tx).await
    }

    fn chat_launch_command(&self, req: &ChatLaunchRequest<'_>) -> Result<CommandSpec, ContainerError> {
        let mut args: Vec<String> = vec![
            "--project".to_string(),
            req.workspace_host_path.display().to_string(),
            "--config-file".to_string(),
            req.agent_config_file.display().to_string(),
            "--no-alt-screen".to_string(),
        ];
        if let Some(path) = req.openai_key_file {
            args.extend(Self::credentials_args(path));
        }
        args.extend(Self::github_ssh_args(req.ssh_key_file, req.ssh_known_hosts_file));
        args.extend(Self::base_image_args(req.base_image, req.workspace_host_path)?);
        args.push("--snapshot-image-tag".to_string());
        args.push(req.snapshot_image_tag.to_string());
        args.extend(Self::mount_args(req.ro_mounts, req.rw_mounts));
        for (key, value) in req.env_vars {
            args.push("--env-var".to_string());
            args.push(format!("{key}={value}"));
        }
        if !req.agent_args.is_empty() {
            args.push("--".to_string());
            args.extend(req.agent_args.iter().cloned());
        }

        Ok(CommandSpec { program: "agent_cli".to_string(), args, env: Vec::new() })
    }

    async fn remove_image(&self, tag: &str) -> Result<(), ContainerError> {
        match run_docker(&["rmi", "-f", tag]).await {
            Ok(_) => Ok(()),
            Err(err) => {
                warn!(tag, error = %err, "failed to remove cached snapshot image (best-effort)");
                Ok(())
            }
        }
    }
}

async fn run_docker(args: &[&str]) -> Result<String, ContainerError> {
    let output = Command::new("docker").args(args).output().await.map_err(ContainerError::Exec)?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        Err(ContainerError::CommandFailed {
            command: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Run `program <args>`, streaming combined stdout+stderr lines to
/// `log_tx` as they arrive rather than buffering to completion. Used
/// for `agent_cli` invocations, which can run arbitrarily long setup
/// scripts.
async fn stream_command(program: &str, args: &[String], log_tx: mpsc::Sender<String>) -> Result<(), ContainerError> {
    let mut child = Command::new(program)
        .args(args)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .map_err(ContainerError::Exec)?;

    let stdout = child.stdout.take().ok_or_else(|| {
        ContainerError::Exec(std::io::Error::new(std::io::ErrorKind::Other, "child stdout was not piped"))
    })?;
    let stderr = child.stderr.take().ok_or_else(|| {
        ContainerError::Exec(std::io::Error::new(std::io::ErrorKind::Other, "child stderr was not piped"))
    })?;
    let mut stdout_lines = BufReader::new(stdout).lines();
    let mut stderr_lines = BufReader::new(stderr).lines();

    loop {
        tokio::select! {
            line = stdout_lines.next_line() => {
                match line {
                    Ok(Some(line)) => { let _ = log_tx.send(line).await; }
                    Ok(None) => break,
                    Err(err) => { warn!(error = %err, program, "error reading child stdout"); break; }
                }
            }
            line = stderr_lines.next_line() => {
                match line {
                    Ok(Some(line)) => { let _ = log_tx.send(line).await; }
                    Ok(None) => {}
                    Err(err) => { warn!(error = %err, program, "error reading child stderr"); }
                }
            }
        }
    }

    let status = child.wait().await.map_err(ContainerError::Exec)?;
    if status.success() {
        info!(program, command = args.join(" "), "command completed");
        Ok(())
    } else {
        Err(ContainerError::CommandFailed { command: format!("{program} {}", args.join(" ")), stderr: format!("exit status {status}") })
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
