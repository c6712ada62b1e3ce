use super::*;
use crate::project::BaseImageRef;
use chrono::TimeZone;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

fn ready_project() -> Project {
    let mut project = Project::new(
        ProjectId::new(),
        "demo",
        "https://example.test/repo.git",
        "echo setup",
        BaseImageRef::Tag { value: "ubuntu:22.04".into() },
        now(),
    );
    let tag = project.deterministic_snapshot_tag();
    project.mark_ready(tag, now());
    project
}

#[test]
fn new_chat_inherits_project_defaults() {
    let project = ready_project();
    let chat = Chat::new(ChatId::new(), &project, now());
    assert_eq!(chat.project_id, project.id);
    assert_eq!(chat.status, ChatStatus::Stopped);
    assert!(chat.display_name.starts_with("chat-"));
}

#[test]
fn cannot_start_when_project_not_ready() {
    let mut project = ready_project();
    project.build_status = crate::project::BuildStatus::Pending;
    let chat = Chat::new(ChatId::new(), &project, now());
    assert!(chat.can_start(&project).is_err());
}

#[test]
fn cannot_start_when_already_running() {
    let project = ready_project();
    let mut chat = Chat::new(ChatId::new(), &project, now());
    chat.mark_running(1234, "deadbeef", now());
    assert!(chat.can_start(&project).is_err());
}

#[test]
fn can_start_when_project_ready_and_chat_stopped() {
    let project = ready_project();
    let chat = Chat::new(ChatId::new(), &project, now());
    assert!(chat.can_start(&project).is_ok());
}

#[test]
fn mark_running_then_stopped_clears_pid_and_token() {
    let project = ready_project();
    let mut chat = Chat::new(ChatId::new(), &project, now());
    chat.mark_running(4242, "abc123", now());
    assert_eq!(chat.pid, Some(4242));
    chat.mark_stopped(now());
    assert_eq!(chat.pid, None);
    assert!(chat.artifact_token_hash.is_none());
}

#[test]
fn push_title_prompt_coalesces_consecutive_duplicate() {
    let project = ready_project();
    let mut chat = Chat::new(ChatId::new(), &project, now());
    chat.push_title_prompt("fix login".to_string());
    chat.push_title_prompt("fix login".to_string());
    assert_eq!(chat.title_prompt_history.len(), 1);
}

#[test]
fn push_title_prompt_caps_history_dropping_oldest() {
    let project = ready_project();
    let mut chat = Chat::new(ChatId::new(), &project, now());
    for i in 0..(TITLE_PROMPT_HISTORY_CAP + 10) {
        chat.push_title_prompt(format!("prompt {i}"));
    }
    assert_eq!(chat.title_prompt_history.len(), TITLE_PROMPT_HISTORY_CAP);
    assert_eq!(chat.title_prompt_history.first().unwrap(), "prompt 10");
}

#[test]
fn record_artifact_bounds_list_and_tracks_current_group() {
    let project = ready_project();
    let mut chat = Chat::new(ChatId::new(), &project, now());
    let id = ArtifactId::new();
    chat.record_artifact(id);
    assert_eq!(chat.artifacts.len(), 1);
    assert_eq!(chat.current_artifact_ids.len(), 1);
}

#[test]
fn archive_current_artifact_group_moves_into_history() {
    let project = ready_project();
    let mut chat = Chat::new(ChatId::new(), &project, now());
    chat.record_artifact(ArtifactId::new());
    chat.archive_current_artifact_group();
    assert!(chat.current_artifact_ids.is_empty());
    assert_eq!(chat.prompt_artifact_groups.len(), 1);
}

#[yare::parameterized(
    simple_name = { "My Project", "cht-abc123", "My_Project_cht-abc123" },
    punctuation_collapses = { "my--- project!!", "cht-xyz", "my_project_cht-xyz" },
    leading_trailing_trim = { "__leading", "cht-1", "leading_cht-1" },
)]
fn sanitizes_workspace_dir_component(project_name: &str, chat_id: &str, expected: &str) {
    let sanitized = sanitize_workspace_component(project_name);
    let combined = format!("{sanitized}_{chat_id}");
    assert_eq!(combined, expected);
}
