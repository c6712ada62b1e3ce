use std::sync::Arc;

use agent_hub_core::{BaseImageRef, Chat, Clock, FakeClock, Project};
use agent_hub_storage::{EventBus, StateStore};
use chrono::Utc;

use super::*;

struct Fixture {
    router: AgentToolsRouter,
    store: Arc<StateStore>,
    chat_id: ChatId,
    token: String,
    _tempdir: tempfile::TempDir,
    _workspace: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let tempdir = tempfile::tempdir().unwrap();
    let workspace = tempfile::tempdir().unwrap();
    let store = Arc::new(StateStore::load(tempdir.path().join("state.json")).unwrap());
    let events = Arc::new(EventBus::default());
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(Utc::now()));
    let vault = Arc::new(agent_hub_adapters::CredentialVault::new(tempdir.path().join("secrets")));

    let now = Utc::now();
    let project = Project::new(
        agent_hub_core::ProjectId::new(),
        "demo",
        "https://example.test/repo.git",
        "echo setup",
        BaseImageRef::Tag { value: "ubuntu:22.04".to_string() },
        now,
    );
    let project_id = project.id;
    store.mutate(|s| s.insert_project(project)).unwrap();

    let mut chat = Chat::new(ChatId::new(), &store.read(|s| s.project(&project_id).cloned().unwrap()), now);
    chat.workspace_path = workspace.path().display().to_string();
    let token = agent_hub_core::token::generate_token();
    chat.artifact_token_hash = Some(agent_hub_core::token::hash_token(&token));
    chat.ready_ack_guid = Some("guid-123".to_string());
    let chat_id = chat.id;
    store.mutate(|s| s.insert_chat(chat)).unwrap();

    let router = AgentToolsRouter::new(Arc::clone(&store), events, clock, vault, tempdir.path());

    Fixture { router, store, chat_id, token, _tempdir: tempdir, _workspace: workspace }
}

#[tokio::test]
async fn publish_artifact_writes_the_file_and_records_it_on_the_chat() {
    let f = fixture();
    let req =
        ArtifactPublishRequest { relative_path: "out/report.txt".to_string(), display_name: None, bytes: b"hi".to_vec() };

    let artifact = f.router.publish_artifact(f.chat_id, &f.token, req).await.unwrap();
    assert_eq!(artifact.relative_path, "out/report.txt");
    assert_eq!(artifact.display_name, "report.txt");
    assert_eq!(artifact.size_bytes, 2);

    let stored = f.store.read(|s| s.chat(&f.chat_id).unwrap().artifacts.clone());
    assert_eq!(stored, vec![artifact.id]);

    let listed = f.router.list_artifacts(&f.chat_id);
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn republishing_the_same_path_overwrites_the_existing_record() {
    let f = fixture();
    let req_a =
        ArtifactPublishRequest { relative_path: "out/report.txt".to_string(), display_name: None, bytes: b"v1".to_vec() };
    let first = f.router.publish_artifact(f.chat_id, &f.token, req_a).await.unwrap();

    let req_b =
        ArtifactPublishRequest { relative_path: "out/report.txt".to_string(), display_name: None, bytes: b"v2v2".to_vec() };
    let second = f.router.publish_artifact(f.chat_id, &f.token, req_b).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.size_bytes, 4);
    assert_eq!(f.router.list_artifacts(&f.chat_id).len(), 1);

    let stored = f.store.read(|s| s.chat(&f.chat_id).unwrap().artifacts.clone());
    assert_eq!(stored, vec![first.id]);
}

#[tokio::test]
async fn publish_artifact_rejects_a_path_that_escapes_the_workspace() {
    let f = fixture();
    let req = ArtifactPublishRequest { relative_path: "../../etc/passwd".to_string(), display_name: None, bytes: vec![] };
    let err = f.router.publish_artifact(f.chat_id, &f.token, req).await.unwrap_err();
    assert!(matches!(err, AgentToolsError::InvalidRequest(_)));
}

#[tokio::test]
async fn publish_artifact_rejects_a_bad_token() {
    let f = fixture();
    let req = ArtifactPublishRequest { relative_path: "a.txt".to_string(), display_name: None, bytes: vec![] };
    let err = f.router.publish_artifact(f.chat_id, "wrong-token", req).await.unwrap_err();
    assert!(matches!(err, AgentToolsError::AuthFailed(_)));
}

#[tokio::test]
async fn ack_with_the_correct_guid_records_the_readiness_ack() {
    let f = fixture();
    f.router
        .ack(&f.chat_id, &f.token, "guid-123", "entrypoint", serde_json::json!({"pid": 42}))
        .unwrap();

    let stored = f.store.read(|s| s.chat(&f.chat_id).unwrap().readiness_ack.clone()).unwrap();
    assert_eq!(stored.guid, "guid-123");
    assert_eq!(stored.stage, "entrypoint");
}

#[tokio::test]
async fn ack_with_the_wrong_guid_is_rejected() {
    let f = fixture();
    let err = f.router.ack(&f.chat_id, &f.token, "not-the-guid", "entrypoint", serde_json::json!({})).unwrap_err();
    assert!(matches!(err, AgentToolsError::AuthFailed(_)));
}

#[tokio::test]
async fn project_binding_returns_the_parent_projects_repo_url() {
    let f = fixture();
    let value = f.router.project_binding(&f.chat_id, &f.token).unwrap();
    assert_eq!(value["repo_url"], "https://example.test/repo.git");
}

#[tokio::test]
async fn list_credentials_reports_disconnected_when_nothing_is_configured() {
    let f = fixture();
    let value = f.router.list_credentials(&f.chat_id, &f.token).await.unwrap();
    assert_eq!(value["openai"]["connected"], false);
    assert_eq!(value["github"]["connected"], false);
}

#[tokio::test]
async fn resolve_credential_fails_when_nothing_is_connected() {
    let f = fixture();
    let err = f
        .router
        .resolve_credential(&f.chat_id, &f.token, CredentialResolveRequest::OpenAiApiKey)
        .await
        .unwrap_err();
    assert!(matches!(err, AgentToolsError::NotFound(_)));
}

#[tokio::test]
async fn temporary_sessions_authenticate_independently_of_any_chat() {
    let f = fixture();
    let (session, token) = f.router.create_temporary_session();
    assert!(session.is_temporary());

    let value = f.router.list_credentials_temporary(session.id.as_str(), &token).await.unwrap();
    assert_eq!(value["openai"]["connected"], false);

    f.router.destroy_temporary_session(&session.id);
    let err = f.router.list_credentials_temporary(session.id.as_str(), &token).await.unwrap_err();
    assert!(matches!(err, AgentToolsError::AuthFailed(_)));
}
