// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mount and environment variable entries shared by projects and chats.

use serde::{Deserialize, Serialize};

/// A single bind mount from the host into a chat's container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    pub host_path: String,
    pub container_path: String,
}

/// A single `KEY=value` environment entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

/// Environment keys the hub injects itself; callers may never set them.
pub const RESERVED_ENV_KEYS: &[&str] = &[
    "OPENAI_API_KEY",
    "AGENT_HUB_ARTIFACTS_URL",
    "AGENT_HUB_ARTIFACT_TOKEN",
    "AGENT_HUB_READY_ACK_GUID",
];

/// Validate a mount path is non-empty and absolute inside the container.
pub fn validate_mount(mount: &Mount) -> Result<(), String> {
    if mount.host_path.trim().is_empty() {
        return Err("mount host_path must not be empty".to_string());
    }
    if !mount.container_path.starts_with('/') {
        return Err(format!(
            "mount container_path must be absolute: {:?}",
            mount.container_path
        ));
    }
    Ok(())
}

/// Validate a caller-supplied env list: no empty keys, no reserved keys.
pub fn validate_env_entries(entries: &[EnvVar]) -> Result<(), String> {
    for entry in entries {
        if entry.key.trim().is_empty() {
            return Err("env key must not be empty".to_string());
        }
        if RESERVED_ENV_KEYS.contains(&entry.key.as_str()) {
            return Err(format!("env key {:?} is reserved", entry.key));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "mount_tests.rs"]
mod tests;
