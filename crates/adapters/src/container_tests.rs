// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agent_hub_core::project::BaseImageRef;
use std::path::PathBuf;

fn base_image() -> BaseImageRef {
    BaseImageRef::Tag { value: "ubuntu:22.04".to_string() }
}

#[test]
fn chat_launch_command_assembles_agent_cli_with_project_and_config_file() {
    let runtime = DockerRuntime::new();
    let ro = vec![Mount { host_path: "/host/ro".to_string(), container_path: "/mnt/ro".to_string() }];
    let rw = vec![Mount { host_path: "/host/rw".to_string(), container_path: "/mnt/rw".to_string() }];
    let env = vec![("AGENT_HUB_READY_ACK_GUID".to_string(), "abc".to_string())];
    let agent_args = vec!["--resume".to_string(), "chat-1".to_string()];
    let base_image = base_image();

    let req = ChatLaunchRequest {
        snapshot_image_tag: "setup-prj12345-deadbeefcafef00d",
        base_image: &base_image,
        workspace_host_path: &PathBuf::from("/var/lib/agent-hub/chats/chat-1"),
        ro_mounts: &ro,
        rw_mounts: &rw,
        env_vars: &env,
        agent_args: &agent_args,
        agent_config_file: &PathBuf::from("/etc/agent-hub/agent.toml"),
        openai_key_file: None,
        ssh_key_file: None,
        ssh_known_hosts_file: None,
    };

    let spec = runtime.chat_launch_command(&req).unwrap();
    assert_eq!(spec.program, "agent_cli");
    assert!(spec.args.windows(2).any(|w| w == ["--project", "/var/lib/agent-hub/chats/chat-1"]));
    assert!(spec.args.windows(2).any(|w| w == ["--config-file", "/etc/agent-hub/agent.toml"]));
    assert!(spec.args.contains(&"--no-alt-screen".to_string()));
    assert!(spec.args.windows(2).any(|w| w == ["--base-image", "ubuntu:22.04"]));
    assert!(spec.args.windows(2).any(|w| w == ["--snapshot-image-tag", "setup-prj12345-deadbeefcafef00d"]));
    assert!(spec.args.windows(2).any(|w| w == ["--ro-mount", "/host/ro:/mnt/ro"]));
    assert!(spec.args.windows(2).any(|w| w == ["--rw-mount", "/host/rw:/mnt/rw"]));
    assert!(spec.args.windows(2).any(|w| w == ["--env-var", "AGENT_HUB_READY_ACK_GUID=abc"]));

    let separator = spec.args.iter().position(|a| a == "--").expect("agent args separator");
    assert_eq!(&spec.args[separator + 1..], agent_args.as_slice());
}

#[test]
fn chat_launch_command_passes_credential_files_never_inlines_the_key() {
    let runtime = DockerRuntime::new();
    let env = vec![];
    let agent_args = vec![];
    let base_image = base_image();

    let req = ChatLaunchRequest {
        snapshot_image_tag: "setup-prj12345-deadbeefcafef00d",
        base_image: &base_image,
        workspace_host_path: &PathBuf::from("/var/lib/agent-hub/chats/chat-1"),
        ro_mounts: &[],
        rw_mounts: &[],
        env_vars: &env,
        agent_args: &agent_args,
        agent_config_file: &PathBuf::from("/etc/agent-hub/agent.toml"),
        openai_key_file: Some(std::path::Path::new("/data/secrets/openai.env")),
        ssh_key_file: Some(std::path::Path::new("/data/secrets/github_ssh_key")),
        ssh_known_hosts_file: Some(std::path::Path::new("/data/secrets/github_known_hosts")),
    };

    let spec = runtime.chat_launch_command(&req).unwrap();
    assert!(spec.args.windows(2).any(|w| w == ["--credentials-file", "/data/secrets/openai.env"]));
    assert!(spec.args.windows(2).any(|w| w == ["--git-ssh-key-file", "/data/secrets/github_ssh_key"]));
    assert!(spec.args.windows(2).any(|w| w == ["--git-ssh-known-hosts-file", "/data/secrets/github_known_hosts"]));
    assert!(!spec.args.iter().any(|a| a.starts_with("OPENAI_API_KEY") || a.contains("OPENAI_API_KEY=")));
}

#[test]
fn chat_launch_command_omits_ssh_flags_when_no_deploy_key_is_connected() {
    let runtime = DockerRuntime::new();
    let env = vec![];
    let agent_args = vec![];
    let base_image = base_image();

    let req = ChatLaunchRequest {
        snapshot_image_tag: "setup-prj12345-deadbeefcafef00d",
        base_image: &base_image,
        workspace_host_path: &PathBuf::from("/var/lib/agent-hub/chats/chat-1"),
        ro_mounts: &[],
        rw_mounts: &[],
        env_vars: &env,
        agent_args: &agent_args,
        agent_config_file: &PathBuf::from("/etc/agent-hub/agent.toml"),
        openai_key_file: None,
        ssh_key_file: None,
        ssh_known_hosts_file: None,
    };

    let spec = runtime.chat_launch_command(&req).unwrap();
    assert!(!spec.args.iter().any(|a| a == "--git-ssh-key-file"));
    assert!(!spec.args.iter().any(|a| a == "--credentials-file"));
    assert!(!spec.args.contains(&"--".to_string()));
}

#[test]
fn chat_launch_command_rejects_a_repo_path_base_image_outside_the_workspace() {
    let tempdir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tempdir.path().join("workspace")).unwrap();
    std::fs::create_dir_all(tempdir.path().join("outside")).unwrap();
    let workspace = tempdir.path().join("workspace");

    let runtime = DockerRuntime::new();
    let env = vec![];
    let agent_args = vec![];
    let base_image = BaseImageRef::RepoPath { value: "../outside".to_string() };

    let req = ChatLaunchRequest {
        snapshot_image_tag: "tag",
        base_image: &base_image,
        workspace_host_path: &workspace,
        ro_mounts: &[],
        rw_mounts: &[],
        env_vars: &env,
        agent_args: &agent_args,
        agent_config_file: &PathBuf::from("/etc/agent-hub/agent.toml"),
        openai_key_file: None,
        ssh_key_file: None,
        ssh_known_hosts_file: None,
    };

    let err = runtime.chat_launch_command(&req).unwrap_err();
    assert!(matches!(err, ContainerError::BaseImageOutsideWorkspace(_)));
}

#[test]
fn mount_args_uses_ro_mount_and_rw_mount_flags() {
    let ro = vec![Mount { host_path: "/a".to_string(), container_path: "/b".to_string() }];
    let rw = vec![];
    let args = DockerRuntime::mount_args(&ro, &rw);
    assert_eq!(args, vec!["--ro-mount".to_string(), "/a:/b".to_string()]);
}
