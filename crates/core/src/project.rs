// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The project entity (spec section 3): a git repository plus a
//! reproducible setup recipe, parent of many chats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mount::{EnvVar, Mount};
use crate::{define_id, fingerprint};

define_id! {
    pub struct ProjectId("prj-");
}

/// How the project's snapshot build resolves its base container image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BaseImageRef {
    /// A registry reference, passed through to the builder verbatim.
    Tag { value: String },
    /// A path inside the checked-out repo resolving to a Dockerfile or
    /// image-ref file; must stay under the workspace.
    RepoPath { value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Pending,
    Building,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub display_name: String,
    pub repo_url: String,
    pub default_branch: Option<String>,
    pub setup_script: String,
    pub base_image: BaseImageRef,
    pub default_ro_mounts: Vec<Mount>,
    pub default_rw_mounts: Vec<Mount>,
    pub default_env_vars: Vec<EnvVar>,
    pub setup_snapshot_image: String,
    pub build_status: BuildStatus,
    pub build_error: Option<String>,
    pub build_started_at: Option<DateTime<Utc>>,
    pub build_finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Schema version mixed into the build fingerprint; bump whenever a
/// fingerprinted field's meaning changes so previously-cached tags are
/// correctly treated as stale.
const BUILD_FINGERPRINT_SCHEMA_VERSION: u32 = 1;

impl Project {
    pub fn new(
        id: ProjectId,
        display_name: impl Into<String>,
        repo_url: impl Into<String>,
        setup_script: impl Into<String>,
        base_image: BaseImageRef,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            repo_url: repo_url.into(),
            default_branch: None,
            setup_script: setup_script.into(),
            base_image,
            default_ro_mounts: Vec::new(),
            default_rw_mounts: Vec::new(),
            default_env_vars: Vec::new(),
            setup_snapshot_image: String::new(),
            build_status: BuildStatus::Pending,
            build_error: None,
            build_started_at: None,
            build_finished_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The deterministic snapshot tag for this project's current
    /// configuration: `setup-<id-prefix>-<sha256_16(fingerprint)>`.
    pub fn deterministic_snapshot_tag(&self) -> String {
        let digest = fingerprint::fingerprint(&self.build_fingerprint_json());
        format!("setup-{}-{}", self.id.short(8), &digest[..16])
    }

    fn build_fingerprint_json(&self) -> serde_json::Value {
        serde_json::json!({
            "schema_version": BUILD_FINGERPRINT_SCHEMA_VERSION,
            "project_id": self.id.as_str(),
            "setup_script": self.setup_script,
            "base_image": self.base_image,
            "default_ro_mounts": self.default_ro_mounts,
            "default_rw_mounts": self.default_rw_mounts,
            "default_env_vars": self.default_env_vars,
        })
    }

    /// True when the stored tag matches this project's current
    /// deterministic configuration and the build is ready.
    pub fn is_snapshot_current(&self) -> bool {
        self.build_status == BuildStatus::Ready
            && !self.setup_snapshot_image.is_empty()
            && self.setup_snapshot_image == self.deterministic_snapshot_tag()
    }

    /// Reset build status to `pending` and clear the cached tag. Must be
    /// called by every mutation of a snapshot-sensitive field (script,
    /// base image, default mounts/envs, branch).
    pub fn invalidate_snapshot(&mut self, now: DateTime<Utc>) {
        self.build_status = BuildStatus::Pending;
        self.setup_snapshot_image.clear();
        self.build_error = None;
        self.updated_at = now;
    }

    pub fn set_setup_script(&mut self, script: impl Into<String>, now: DateTime<Utc>) {
        self.setup_script = script.into();
        self.invalidate_snapshot(now);
    }

    pub fn set_base_image(&mut self, base_image: BaseImageRef, now: DateTime<Utc>) {
        self.base_image = base_image;
        self.invalidate_snapshot(now);
    }

    pub fn set_default_mounts(&mut self, ro: Vec<Mount>, rw: Vec<Mount>, now: DateTime<Utc>) {
        self.default_ro_mounts = ro;
        self.default_rw_mounts = rw;
        self.invalidate_snapshot(now);
    }

    pub fn set_default_env_vars(&mut self, env_vars: Vec<EnvVar>, now: DateTime<Utc>) {
        self.default_env_vars = env_vars;
        self.invalidate_snapshot(now);
    }

    pub fn set_default_branch(&mut self, branch: Option<String>, now: DateTime<Utc>) {
        self.default_branch = branch;
        self.invalidate_snapshot(now);
    }

    pub fn mark_building(&mut self, now: DateTime<Utc>) {
        self.build_status = BuildStatus::Building;
        self.build_started_at = Some(now);
        self.build_error = None;
        self.updated_at = now;
    }

    pub fn mark_ready(&mut self, tag: impl Into<String>, now: DateTime<Utc>) {
        self.setup_snapshot_image = tag.into();
        self.build_status = BuildStatus::Ready;
        self.build_finished_at = Some(now);
        self.build_error = None;
        self.updated_at = now;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>, now: DateTime<Utc>) {
        self.build_status = BuildStatus::Failed;
        self.build_error = Some(error.into());
        self.build_finished_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
