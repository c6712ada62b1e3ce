// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The git workspace adapter (spec §4.D, §4.E).
//!
//! Two distinct clone lifecycles share the same primitives:
//! - a project's cached clone, fetched and hard-reset in place whenever
//!   a new snapshot build needs a fresh checkout;
//! - a chat's per-chat clone, re-created from scratch if `.git` is
//!   ever found missing (a previous run left a half-deleted workspace).
//!
//! Both resolve "the default branch" the same way: prefer the remote's
//! advertised HEAD symref, falling back to `main` then `master` if the
//! remote has no symref (common for bare mirrors pushed to by tooling
//! that never sets one).

use std::path::Path;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to exec git: {0}")]
    Exec(std::io::Error),
    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
    #[error("no usable branch: symref and main/master fallbacks all failed")]
    NoDefaultBranch,
}

#[async_trait::async_trait]
pub trait GitWorkspace: Send + Sync {
    /// Ensure a working clone of `repo_url` exists at `path`, fetch,
    /// resolve the default branch (honoring `preferred_branch` if
    /// given), and hard-reset the checkout to it. Returns the resolved
    /// branch name.
    async fn ensure_clone(
        &self,
        repo_url: &str,
        path: &Path,
        preferred_branch: Option<&str>,
    ) -> Result<String, GitError>;

    /// Resolve the remote's default branch without touching any
    /// checkout (used by project creation to populate `default_branch`
    /// before a clone necessarily exists).
    async fn resolve_default_branch(&self, repo_url: &str) -> Result<String, GitError>;
}

#[derive(Debug, Clone, Default)]
pub struct LocalGitWorkspace;

impl LocalGitWorkspace {
    pub fn new() -> Self {
        Self
    }

    async fn clone_fresh(&self, repo_url: &str, path: &Path) -> Result<(), GitError> {
        if path.exists() {
            tokio::fs::remove_dir_all(path).await.map_err(GitError::Exec)?;
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(GitError::Exec)?;
        }
        run_git(None, &["clone", repo_url, &path.display().to_string()]).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl GitWorkspace for LocalGitWorkspace {
    async fn ensure_clone(
        &self,
        repo_url: &str,
        path: &Path,
        preferred_branch: Option<&str>,
    ) -> Result<String, GitError> {
        if !path.join(".git").exists() {
            debug!(path = %path.display(), ".git missing, cloning fresh");
            self.clone_fresh(repo_url, path).await?;
        }

        run_git(Some(path), &["fetch", "--prune", "origin"]).await?;

        let branch = match preferred_branch {
            Some(branch) => branch.to_string(),
            None => resolve_branch(path).await?,
        };

        let reset_target = format!("origin/{branch}");
        let reset_result = run_git(Some(path), &["reset", "--hard", &reset_target]).await;
        if reset_result.is_err() {
            warn!(branch, "preferred branch not found on remote, falling back to symref resolution");
            let fallback_branch = resolve_branch(path).await?;
            run_git(Some(path), &["reset", "--hard", &format!("origin/{fallback_branch}")]).await?;
            return Ok(fallback_branch);
        }

        Ok(branch)
    }

    async fn resolve_default_branch(&self, repo_url: &str) -> Result<String, GitError> {
        let output = run_git(None, &["ls-remote", "--symref", repo_url, "HEAD"]).await?;
        if let Some(branch) = parse_symref_output(&output) {
            return Ok(branch);
        }
        for candidate in ["main", "master"] {
            let check = run_git(None, &["ls-remote", "--exit-code", "--heads", repo_url, candidate]).await;
            if check.is_ok() {
                return Ok(candidate.to_string());
            }
        }
        Err(GitError::NoDefaultBranch)
    }
}

/// Resolve the default branch of an already-cloned working copy by
/// reading `origin/HEAD`'s symref, falling back to probing for `main`
/// then `master` among the remote-tracking branches.
async fn resolve_branch(path: &Path) -> Result<String, GitError> {
    if let Ok(output) = run_git(Some(path), &["symbolic-ref", "refs/remotes/origin/HEAD"]).await {
        if let Some(branch) = output.strip_prefix("refs/remotes/origin/") {
            return Ok(branch.to_string());
        }
    }
    for candidate in ["main", "master"] {
        let check = run_git(Some(path), &["rev-parse", "--verify", &format!("origin/{candidate}")]).await;
        if check.is_ok() {
            return Ok(candidate.to_string());
        }
    }
    Err(GitError::NoDefaultBranch)
}

/// Parse the two-line output of `git ls-remote --symref <url> HEAD`:
/// `ref: refs/heads/<branch>\tHEAD\n<sha>\tHEAD`.
fn parse_symref_output(output: &str) -> Option<String> {
    let first_line = output.lines().next()?;
    let refs_part = first_line.strip_prefix("ref: ")?;
    let branch_ref = refs_part.split_whitespace().next()?;
    branch_ref.strip_prefix("refs/heads/").map(str::to_string)
}

async fn run_git(cwd: Option<&Path>, args: &[&str]) -> Result<String, GitError> {
    let mut command = Command::new("git");
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }
    command.args(args);
    let output = command.output().await.map_err(GitError::Exec)?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        Err(GitError::CommandFailed {
            command: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[cfg(test)]
#[path = "git_workspace_tests.rs"]
mod tests;
