use std::sync::Arc;
use std::time::Duration;

use agent_hub_adapters::container::CommandSpec;
use agent_hub_adapters::fakes::{FakeContainerRuntime, FakeGitWorkspace};
use agent_hub_adapters::CredentialVault;
use agent_hub_core::{BaseImageRef, ChatStatus, Clock, FakeClock, Project, ProjectId};
use agent_hub_storage::{EventBus, StateStore};
use chrono::Utc;

use super::*;

struct Fixture {
    supervisor: Arc<ChatSupervisor>,
    store: Arc<StateStore>,
    terminal: Arc<TerminalHub>,
    container: Arc<FakeContainerRuntime>,
    project_id: ProjectId,
    _tempdir: tempfile::TempDir,
}

fn ready_project(now: chrono::DateTime<chrono::Utc>) -> Project {
    let mut project = Project::new(
        ProjectId::new(),
        "demo",
        "https://example.test/repo.git",
        "echo setup",
        BaseImageRef::Tag { value: "ubuntu:22.04".to_string() },
        now,
    );
    let tag = project.deterministic_snapshot_tag();
    project.mark_ready(tag, now);
    project
}

fn fixture() -> Fixture {
    let tempdir = tempfile::tempdir().unwrap();
    let store = Arc::new(StateStore::load(tempdir.path().join("state.json")).unwrap());
    let events = Arc::new(EventBus::default());
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(Utc::now()));
    let container = Arc::new(FakeContainerRuntime::new());
    container.set_image_exists(true);
    container.set_launch_command(CommandSpec { program: "cat".to_string(), args: vec![], env: vec![] });
    let git = Arc::new(FakeGitWorkspace::new());
    let vault = Arc::new(CredentialVault::new(tempdir.path().join("secrets")));
    let terminal = TerminalHub::new(Arc::clone(&store), Arc::clone(&clock), Arc::clone(&events), tempdir.path());

    let now = Utc::now();
    let project = ready_project(now);
    let project_id = project.id;
    store.mutate(|s| s.insert_project(project)).unwrap();

    let supervisor = Arc::new(ChatSupervisor::new(
        Arc::clone(&store),
        events,
        clock,
        container.clone() as Arc<dyn agent_hub_adapters::ContainerRuntime>,
        git as Arc<dyn agent_hub_adapters::GitWorkspace>,
        vault,
        Arc::clone(&terminal),
        tempdir.path(),
        "http://127.0.0.1:4123",
        tempdir.path().join("agent.config.toml"),
    ));

    Fixture { supervisor, store, terminal, container, project_id, _tempdir: tempdir }
}

#[tokio::test]
async fn create_inserts_a_stopped_chat_with_project_defaults() {
    let f = fixture();
    let chat = f.supervisor.create(f.project_id, ChatCreateRequest::default()).unwrap();
    assert_eq!(chat.status, ChatStatus::Stopped);
    assert_eq!(chat.project_id, f.project_id);

    let stored = f.store.read(|s| s.chat(&chat.id).cloned()).unwrap();
    assert_eq!(stored.id, chat.id);
}

#[tokio::test]
async fn create_rejects_reserved_env_keys() {
    let f = fixture();
    let req = ChatCreateRequest {
        env_vars: Some(vec![agent_hub_core::EnvVar { key: "OPENAI_API_KEY".to_string(), value: "x".to_string() }]),
        ..Default::default()
    };
    let err = f.supervisor.create(f.project_id, req).unwrap_err();
    assert!(matches!(err, ChatSupervisorError::InvalidRequest(_)));
}

#[tokio::test]
async fn start_spawns_a_pty_and_marks_the_chat_running() {
    let f = fixture();
    let chat = f.supervisor.create(f.project_id, ChatCreateRequest::default()).unwrap();

    let started = f.supervisor.start(chat.id).await.unwrap();
    assert_eq!(started.status, ChatStatus::Running);
    assert!(started.pid.is_some());
    assert!(started.artifact_token_hash.is_some());
    assert!(started.ready_ack_guid.is_some());
    assert!(f.terminal.is_registered(&chat.id));
}

#[tokio::test]
async fn start_passes_openai_credential_as_a_file_mount_never_inline() {
    let f = fixture();
    let secrets_dir = f._tempdir.path().join("secrets");
    std::fs::create_dir_all(&secrets_dir).unwrap();
    std::fs::write(secrets_dir.join("openai.env"), "OPENAI_API_KEY=\"sk-test-1234567890\"\n").unwrap();

    let chat = f.supervisor.create(f.project_id, ChatCreateRequest::default()).unwrap();
    f.supervisor.start(chat.id).await.unwrap();

    assert_eq!(f.container.last_launch_had_openai_key_file(), Some(true));
    for (key, value) in f.container.last_launch_env_vars() {
        assert!(key != "OPENAI_API_KEY", "raw key leaked as env var {key}={value}");
        assert!(!value.contains("sk-test-1234567890"), "raw key value leaked in env vars");
    }
}

#[tokio::test]
async fn start_refuses_when_project_is_not_ready() {
    let f = fixture();
    let now = Utc::now();
    let mut pending_project = Project::new(
        ProjectId::new(),
        "other",
        "https://example.test/other.git",
        "echo setup",
        BaseImageRef::Tag { value: "ubuntu:22.04".to_string() },
        now,
    );
    pending_project.invalidate_snapshot(now);
    let project_id = pending_project.id;
    f.store.mutate(|s| s.insert_project(pending_project)).unwrap();
    let chat = f.supervisor.create(project_id, ChatCreateRequest::default()).unwrap();

    let err = f.supervisor.start(chat.id).await.unwrap_err();
    assert!(matches!(err, ChatSupervisorError::Conflict(_)));
}

#[tokio::test]
async fn starting_twice_is_a_conflict() {
    let f = fixture();
    let chat = f.supervisor.create(f.project_id, ChatCreateRequest::default()).unwrap();
    f.supervisor.start(chat.id).await.unwrap();

    let err = f.supervisor.start(chat.id).await.unwrap_err();
    assert!(matches!(err, ChatSupervisorError::Conflict(_)));
}

#[tokio::test]
async fn close_stops_a_running_chat_and_unregisters_its_terminal() {
    let f = fixture();
    let chat = f.supervisor.create(f.project_id, ChatCreateRequest::default()).unwrap();
    f.supervisor.start(chat.id).await.unwrap();

    let closed = f.supervisor.close(chat.id).await.unwrap();
    assert_eq!(closed.status, ChatStatus::Stopped);
    assert!(closed.pid.is_none());
    assert!(!f.terminal.is_registered(&chat.id));
}

#[tokio::test]
async fn close_on_a_stopped_chat_is_a_conflict() {
    let f = fixture();
    let chat = f.supervisor.create(f.project_id, ChatCreateRequest::default()).unwrap();
    let err = f.supervisor.close(chat.id).await.unwrap_err();
    assert!(matches!(err, ChatSupervisorError::Conflict(_)));
}

#[tokio::test]
async fn shutdown_stops_every_running_chat() {
    let f = fixture();
    let a = f.supervisor.create(f.project_id, ChatCreateRequest::default()).unwrap();
    let b = f.supervisor.create(f.project_id, ChatCreateRequest::default()).unwrap();
    f.supervisor.start(a.id).await.unwrap();
    f.supervisor.start(b.id).await.unwrap();

    f.supervisor.shutdown().await;

    let statuses = f.store.read(|s| (s.chat(&a.id).unwrap().status, s.chat(&b.id).unwrap().status));
    assert_eq!(statuses.0, ChatStatus::Stopped);
    assert_eq!(statuses.1, ChatStatus::Stopped);
}

#[tokio::test]
async fn clean_start_invalidates_every_project_snapshot() {
    let f = fixture();
    f.supervisor.clean_start().await;

    let project = f.store.read(|s| s.project(&f.project_id).cloned()).unwrap();
    assert_eq!(project.build_status, agent_hub_core::BuildStatus::Pending);
    assert!(project.setup_snapshot_image.is_empty());
}

#[tokio::test]
async fn start_fails_when_snapshot_image_is_missing_from_the_runtime() {
    let f = fixture();
    f.container.set_image_exists(false);
    let chat = f.supervisor.create(f.project_id, ChatCreateRequest::default()).unwrap();

    let err = f.supervisor.start(chat.id).await.unwrap_err();
    assert!(matches!(err, ChatSupervisorError::Conflict(_)));
}

#[tokio::test]
async fn resize_after_start_does_not_error() {
    let f = fixture();
    let chat = f.supervisor.create(f.project_id, ChatCreateRequest::default()).unwrap();
    f.supervisor.start(chat.id).await.unwrap();

    f.terminal
        .handle_input(&chat.id, crate::terminal::InputMessage::Resize { cols: 100, rows: 30 })
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
}
