// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::process::Command as StdCommand;

#[test]
fn parse_symref_output_extracts_branch_name() {
    let output = "ref: refs/heads/trunk\tHEAD\ndeadbeef\tHEAD";
    assert_eq!(parse_symref_output(output), Some("trunk".to_string()));
}

#[test]
fn parse_symref_output_returns_none_for_garbage() {
    assert_eq!(parse_symref_output("not a symref line"), None);
}

/// Builds a local bare repository fixture with a single commit on
/// `trunk` and a HEAD symref pointing at it, used by the integration
/// tests below to exercise real `git` invocations against `file://`
/// remotes rather than the network.
fn init_bare_fixture(dir: &std::path::Path) -> std::path::PathBuf {
    let bare_path = dir.join("origin.git");
    let scratch_path = dir.join("scratch");

    StdCommand::new("git").args(["init", "--bare", "-b", "trunk"]).arg(&bare_path).status().unwrap();
    StdCommand::new("git").args(["init", "-b", "trunk"]).arg(&scratch_path).status().unwrap();
    StdCommand::new("git").args(["-C", scratch_path.to_str().unwrap(), "config", "user.email", "test@test"]).status().unwrap();
    StdCommand::new("git").args(["-C", scratch_path.to_str().unwrap(), "config", "user.name", "test"]).status().unwrap();
    std::fs::write(scratch_path.join("README.md"), "hello").unwrap();
    StdCommand::new("git").args(["-C", scratch_path.to_str().unwrap(), "add", "."]).status().unwrap();
    StdCommand::new("git").args(["-C", scratch_path.to_str().unwrap(), "commit", "-m", "initial"]).status().unwrap();
    StdCommand::new("git")
        .args(["-C", scratch_path.to_str().unwrap(), "push", bare_path.to_str().unwrap(), "trunk"])
        .status()
        .unwrap();
    StdCommand::new("git")
        .args(["-C", bare_path.to_str().unwrap(), "symbolic-ref", "HEAD", "refs/heads/trunk"])
        .status()
        .unwrap();

    bare_path
}

#[tokio::test]
#[serial_test::serial]
async fn ensure_clone_clones_then_fetches_on_second_call() {
    let dir = tempfile::tempdir().unwrap();
    let bare_path = init_bare_fixture(dir.path());
    let repo_url = format!("file://{}", bare_path.display());
    let checkout = dir.path().join("checkout");

    let workspace = LocalGitWorkspace::new();
    let branch = workspace.ensure_clone(&repo_url, &checkout, None).await.unwrap();
    assert_eq!(branch, "trunk");
    assert!(checkout.join("README.md").exists());

    // Second call against an already-cloned checkout should fetch + reset, not re-clone.
    let branch_again = workspace.ensure_clone(&repo_url, &checkout, None).await.unwrap();
    assert_eq!(branch_again, "trunk");
}

#[tokio::test]
#[serial_test::serial]
async fn ensure_clone_recreates_when_dot_git_missing() {
    let dir = tempfile::tempdir().unwrap();
    let bare_path = init_bare_fixture(dir.path());
    let repo_url = format!("file://{}", bare_path.display());
    let checkout = dir.path().join("checkout");

    std::fs::create_dir_all(&checkout).unwrap();
    std::fs::write(checkout.join("stray.txt"), "leftover").unwrap();

    let workspace = LocalGitWorkspace::new();
    workspace.ensure_clone(&repo_url, &checkout, None).await.unwrap();
    assert!(checkout.join(".git").exists());
    assert!(checkout.join("README.md").exists());
}

#[tokio::test]
#[serial_test::serial]
async fn resolve_default_branch_follows_remote_symref() {
    let dir = tempfile::tempdir().unwrap();
    let bare_path = init_bare_fixture(dir.path());
    let repo_url = format!("file://{}", bare_path.display());

    let workspace = LocalGitWorkspace::new();
    let branch = workspace.resolve_default_branch(&repo_url).await.unwrap();
    assert_eq!(branch, "trunk");
}
