// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The artifact entity (spec section 3): a file the in-container agent
//! published under a chat's workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::define_id;

define_id! {
    pub struct ArtifactId("art-");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub display_name: String,
    pub relative_path: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(
        id: ArtifactId,
        display_name: impl Into<String>,
        relative_path: impl Into<String>,
        size_bytes: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self { id, display_name: display_name.into(), relative_path: relative_path.into(), size_bytes, created_at }
    }
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
