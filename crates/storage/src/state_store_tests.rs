// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agent_hub_core::{BaseImageRef, ChatStatus, Project};
use chrono::Utc;

fn sample_project() -> Project {
    Project::new(
        ProjectId::new(),
        "demo",
        "https://example.test/repo.git",
        "echo setup",
        BaseImageRef::Tag { value: "ubuntu:22.04".to_string() },
        Utc::now(),
    )
}

#[test]
fn round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let store = StateStore::load(&path).unwrap();
    let project = sample_project();
    let project_id = project.id;
    store.mutate(|state| state.insert_project(project)).unwrap();

    let reloaded = StateStore::load(&path).unwrap();
    let snapshot = reloaded.snapshot();
    assert!(snapshot.project(&project_id).is_some());
    assert_eq!(snapshot.version, 1);
}

#[test]
fn missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nonexistent/state.json");
    let store = StateStore::load(&path).unwrap();
    let snapshot = store.snapshot();
    assert!(snapshot.projects.is_empty());
    assert!(snapshot.chats.is_empty());
}

#[test]
fn normalize_clamps_bounded_lists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let project = sample_project();
    let mut chat = Chat::new(ChatId::new(), &project, Utc::now());
    for i in 0..(TITLE_PROMPT_HISTORY_CAP + 10) {
        chat.title_prompt_history.push(format!("prompt-{i}"));
    }
    let mut raw_state = HubState::new();
    raw_state.insert_project(project);
    raw_state.insert_chat(chat.clone());
    std::fs::write(&path, serde_json::to_vec(&raw_state).unwrap()).unwrap();

    let store = StateStore::load(&path).unwrap();
    let snapshot = store.snapshot();
    let loaded_chat = snapshot.chat(&chat.id).unwrap();
    assert_eq!(loaded_chat.title_prompt_history.len(), TITLE_PROMPT_HISTORY_CAP);
    assert_eq!(loaded_chat.title_prompt_history.last().unwrap(), "prompt-109");
}

#[test]
fn normalize_discards_terminal_control_titles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let project = sample_project();
    let mut chat = Chat::new(ChatId::new(), &project, Utc::now());
    chat.title_cached = Some("]10;rgb:e7e7/eded/f7f7\\".to_string());
    let mut raw_state = HubState::new();
    raw_state.insert_project(project);
    raw_state.insert_chat(chat.clone());
    std::fs::write(&path, serde_json::to_vec(&raw_state).unwrap()).unwrap();

    let store = StateStore::load(&path).unwrap();
    let snapshot = store.snapshot();
    assert!(snapshot.chat(&chat.id).unwrap().title_cached.is_none());
}

#[test]
fn normalize_reconciles_running_without_pid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let project = sample_project();
    let mut chat = Chat::new(ChatId::new(), &project, Utc::now());
    chat.status = ChatStatus::Running;
    chat.pid = None;
    let mut raw_state = HubState::new();
    raw_state.insert_project(project);
    raw_state.insert_chat(chat.clone());
    std::fs::write(&path, serde_json::to_vec(&raw_state).unwrap()).unwrap();

    let store = StateStore::load(&path).unwrap();
    let snapshot = store.snapshot();
    assert_eq!(snapshot.chat(&chat.id).unwrap().status, ChatStatus::Stopped);
}

#[test]
fn mutate_is_atomic_across_a_simulated_crash() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let store = StateStore::load(&path).unwrap();
    store.mutate(|state| state.insert_project(sample_project())).unwrap();

    // The tmp file must never be left behind after a successful write.
    assert!(!path.with_extension("json.tmp").exists());
    assert!(path.exists());
}
