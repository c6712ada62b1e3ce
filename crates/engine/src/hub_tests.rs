use agent_hub_core::{BaseImageRef, Project, ProjectId};
use chrono::Utc;

use super::*;

fn config(tempdir: &tempfile::TempDir) -> HubConfig {
    HubConfig { data_dir: tempdir.path().to_path_buf(), ..HubConfig::default() }
}

#[tokio::test]
async fn new_wires_every_component_against_an_empty_store() {
    let tempdir = tempfile::tempdir().unwrap();
    let hub = Hub::new(config(&tempdir)).unwrap();

    assert_eq!(hub.events.subscriber_count(), 0);
    let state = hub.store.snapshot();
    assert!(state.projects.is_empty());
    assert!(state.chats.is_empty());
}

#[tokio::test]
async fn resume_interrupted_builds_retriggers_building_projects() {
    let tempdir = tempfile::tempdir().unwrap();
    let hub = Hub::new(config(&tempdir)).unwrap();

    let project_id = ProjectId::new();
    let mut project = Project::new(
        project_id,
        "demo",
        "https://example.test/repo.git",
        "echo setup",
        BaseImageRef::Tag { value: "ubuntu:22.04".to_string() },
        Utc::now(),
    );
    project.mark_building(Utc::now());
    hub.store.mutate(|s| s.insert_project(project)).unwrap();

    hub.resume_interrupted_builds();

    for _ in 0..200 {
        let status = hub.store.read(|s| s.project(&project_id).map(|p| p.build_status));
        if matches!(status, Some(agent_hub_core::BuildStatus::Ready) | Some(agent_hub_core::BuildStatus::Failed)) {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("resumed build never reached a terminal state");
}

#[tokio::test]
async fn record_title_prompt_rejects_an_empty_prompt() {
    let tempdir = tempfile::tempdir().unwrap();
    let hub = Hub::new(config(&tempdir)).unwrap();

    let project_id = ProjectId::new();
    let project = Project::new(
        project_id,
        "demo",
        "https://example.test/repo.git",
        "echo setup",
        BaseImageRef::Tag { value: "ubuntu:22.04".to_string() },
        Utc::now(),
    );
    hub.store.mutate(|s| s.insert_project(project.clone())).unwrap();
    let chat = agent_hub_core::Chat::new(agent_hub_core::ChatId::new(), &project, Utc::now());
    let chat_id = chat.id;
    hub.store.mutate(|s| s.insert_chat(chat)).unwrap();

    let err = hub.record_title_prompt(chat_id, "   ".to_string()).unwrap_err();
    assert!(matches!(err, agent_hub_core::HubError::InvalidRequest(_)));
}

#[tokio::test]
async fn record_title_prompt_appends_to_history_and_triggers_the_pipeline() {
    let tempdir = tempfile::tempdir().unwrap();
    let hub = Hub::new(config(&tempdir)).unwrap();

    let project_id = ProjectId::new();
    let project = Project::new(
        project_id,
        "demo",
        "https://example.test/repo.git",
        "echo setup",
        BaseImageRef::Tag { value: "ubuntu:22.04".to_string() },
        Utc::now(),
    );
    hub.store.mutate(|s| s.insert_project(project.clone())).unwrap();
    let chat = agent_hub_core::Chat::new(agent_hub_core::ChatId::new(), &project, Utc::now());
    let chat_id = chat.id;
    hub.store.mutate(|s| s.insert_chat(chat)).unwrap();

    let subscriber = hub.events.subscribe();
    let updated = hub.record_title_prompt(chat_id, "build me a todo app".to_string()).unwrap();
    assert_eq!(updated.title_prompt_history, vec!["build me a todo app".to_string()]);

    let reasons: Vec<String> = subscriber
        .drain()
        .into_iter()
        .filter_map(|envelope| {
            (envelope.kind == "state_changed").then(|| envelope.payload["reason"].as_str().unwrap().to_string())
        })
        .collect();
    assert!(reasons.contains(&"title_prompt_recorded".to_string()), "saw {reasons:?}");
}
