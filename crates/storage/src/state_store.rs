// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single JSON state document (spec §4.A).
//!
//! `state.json` is the hub's only durable record: projects, chats, and
//! the singleton OpenAI account login session. Every mutation goes
//! through [`StateStore::mutate`], which serializes writers behind one
//! process-wide mutex, normalizes the document on load, and replaces
//! the file atomically via tmp-then-rename.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use agent_hub_core::{
    Chat, ChatId, LoginSessionSlot, Project, ProjectId, ARTIFACT_LIST_CAP, PROMPT_ARTIFACT_GROUP_CAP,
    TITLE_PROMPT_HISTORY_CAP,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Current schema version. Bumped whenever `normalize` gains a new
/// migration so older documents can be told apart from fresh ones.
const SCHEMA_VERSION: u32 = 1;

/// The complete persisted document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HubState {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub projects: HashMap<String, Project>,
    #[serde(default)]
    pub chats: HashMap<String, Chat>,
}

fn default_version() -> u32 {
    SCHEMA_VERSION
}

impl HubState {
    pub fn new() -> Self {
        Self { version: SCHEMA_VERSION, projects: HashMap::new(), chats: HashMap::new() }
    }

    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.get(id.as_str())
    }

    pub fn project_mut(&mut self, id: &ProjectId) -> Option<&mut Project> {
        self.projects.get_mut(id.as_str())
    }

    pub fn chat(&self, id: &ChatId) -> Option<&Chat> {
        self.chats.get(id.as_str())
    }

    pub fn chat_mut(&mut self, id: &ChatId) -> Option<&mut Chat> {
        self.chats.get_mut(id.as_str())
    }

    pub fn chats_for_project(&self, project_id: &ProjectId) -> Vec<&Chat> {
        let mut chats: Vec<&Chat> =
            self.chats.values().filter(|c| c.project_id.as_str() == project_id.as_str()).collect();
        chats.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        chats
    }

    pub fn insert_project(&mut self, project: Project) {
        self.projects.insert(project.id.as_str().to_string(), project);
    }

    pub fn insert_chat(&mut self, chat: Chat) {
        self.chats.insert(chat.id.as_str().to_string(), chat);
    }

    pub fn remove_project(&mut self, id: &ProjectId) -> Option<Project> {
        self.projects.remove(id.as_str())
    }

    pub fn remove_chat(&mut self, id: &ChatId) -> Option<Chat> {
        self.chats.remove(id.as_str())
    }

    /// Normalize a document freshly loaded from disk: clamp bounded
    /// lists to their caps and discard cached titles that look like
    /// terminal control payloads (a stale bug's leftovers, per §4.A).
    fn normalize(&mut self) {
        self.version = SCHEMA_VERSION;
        for chat in self.chats.values_mut() {
            if chat.title_prompt_history.len() > TITLE_PROMPT_HISTORY_CAP {
                let overflow = chat.title_prompt_history.len() - TITLE_PROMPT_HISTORY_CAP;
                chat.title_prompt_history.drain(0..overflow);
            }
            if chat.artifacts.len() > ARTIFACT_LIST_CAP {
                let overflow = chat.artifacts.len() - ARTIFACT_LIST_CAP;
                chat.artifacts.drain(0..overflow);
            }
            if chat.prompt_artifact_groups.len() > PROMPT_ARTIFACT_GROUP_CAP {
                let overflow = chat.prompt_artifact_groups.len() - PROMPT_ARTIFACT_GROUP_CAP;
                chat.prompt_artifact_groups.drain(0..overflow);
            }
            if let Some(title) = &chat.title_cached {
                if agent_hub_core::prompt::looks_like_terminal_control_payload(title) {
                    chat.title_cached = None;
                }
            }
            // A crash mid-spawn can persist a PID with no surviving OS
            // process; the supervisor reconciles this at startup, but a
            // freshly loaded document should never claim a chat is
            // `running` without a PID.
            if chat.status == agent_hub_core::ChatStatus::Running && chat.pid.is_none() {
                chat.status = agent_hub_core::ChatStatus::Stopped;
            }
        }
    }
}

/// Single-file JSON document store with one process-wide mutex.
pub struct StateStore {
    path: PathBuf,
    state: Mutex<HubState>,
}

impl StateStore {
    /// Load `<data>/state.json` if present, otherwise start from an
    /// empty document. Never errors on a missing file.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StateStoreError> {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let mut state: HubState = serde_json::from_str(&raw)?;
                state.normalize();
                state
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => HubState::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, state: Mutex::new(state) })
    }

    /// A snapshot of the current document (cloned out from under the
    /// lock so callers never hold `state_lock` while serializing).
    pub fn snapshot(&self) -> HubState {
        self.state.lock().clone()
    }

    /// Run `f` against the document under the lock, persisting the
    /// result afterward. `f`'s return value is passed through.
    pub fn mutate<T>(&self, f: impl FnOnce(&mut HubState) -> T) -> Result<T, StateStoreError> {
        let mut guard = self.state.lock();
        let result = f(&mut guard);
        self.write_locked(&guard)?;
        Ok(result)
    }

    /// Read-only access under the lock, without touching disk.
    pub fn read<T>(&self, f: impl FnOnce(&HubState) -> T) -> T {
        f(&self.state.lock())
    }

    fn write_locked(&self, state: &HubState) -> Result<(), StateStoreError> {
        write_atomic(&self.path, state)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Serialize `state` and replace `path` atomically: write to a sibling
/// `.tmp` file, `fsync`, then rename over the destination. A crash
/// mid-write leaves either the prior document or the new one, never a
/// partial (spec §4.A's atomicity property).
fn write_atomic(path: &Path, state: &HubState) -> Result<(), StateStoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    let payload = serde_json::to_vec_pretty(state)?;
    {
        use std::io::Write;
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(&payload)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    info!(path = %path.display(), bytes = payload.len(), "state document persisted");
    Ok(())
}

/// The OpenAI account login session is a singleton that intentionally
/// lives outside `HubState` (it has no stable id worth indexing and is
/// reset on every process restart per spec §3) — held instead behind
/// its own mutex, constructed fresh at startup.
pub struct LoginSessionStore {
    slot: Mutex<LoginSessionSlot>,
}

impl Default for LoginSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginSessionStore {
    pub fn new() -> Self {
        Self { slot: Mutex::new(LoginSessionSlot::new()) }
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut LoginSessionSlot) -> T) -> T {
        f(&mut self.slot.lock())
    }
}

/// Best-effort removal of derived filesystem trees, used by
/// `clean_start` (spec §4.E). Missing directories are not an error.
pub fn remove_dir_best_effort(path: &Path) {
    if let Err(err) = std::fs::remove_dir_all(path) {
        if err.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %err, "failed to remove directory (best-effort)");
        }
    }
}

#[cfg(test)]
#[path = "state_store_tests.rs"]
mod tests;
