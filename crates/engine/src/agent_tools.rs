// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Agent Tools router (spec §4.G): the per-chat HTTP surface the
//! in-container agent calls to publish artifacts, resolve credentials,
//! and post its readiness acknowledgement.
//!
//! This is framework-agnostic business logic; [`agent-hub-server`] binds
//! these methods to axum routes and extracts the bearer token from
//! `Authorization` or `x-agent-hub-agent-tools-token`. Grounded on the
//! same token-hash-not-plaintext discipline as
//! [`crate::chat_supervisor::ChatSupervisor`]'s launch token minting.
//!
//! Artifact metadata (display name, size, publish time) lives in a
//! small per-chat sidecar JSON file next to the chat's workspace rather
//! than in `state.json` — the `Chat` entity only tracks artifact *ids*
//! (see `agent_hub_core::chat::Chat::record_artifact`), so this router
//! owns the id-to-metadata mapping the same way `StateStore` owns
//! `state.json`: tmp-then-rename atomic writes, never partial.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use agent_hub_adapters::CredentialVault;
use agent_hub_core::artifact_path::{normalize_artifact_name, normalize_artifact_path};
use agent_hub_core::chat::ReadinessAck;
use agent_hub_core::token::{generate_token, hash_token, verify_token};
use agent_hub_core::{Artifact, ArtifactId, Chat, ChatId, Clock, HubEvent, ARTIFACT_LIST_CAP};
use agent_hub_core::{AgentToolsSession, SessionId};
use agent_hub_storage::{EventBus, StateStore};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, Clone)]
pub enum AgentToolsError {
    #[error("auth failed: {0}")]
    AuthFailed(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<AgentToolsError> for agent_hub_core::HubError {
    fn from(err: AgentToolsError) -> Self {
        match err {
            AgentToolsError::AuthFailed(m) => agent_hub_core::HubError::AuthFailed(m),
            AgentToolsError::NotFound(m) => agent_hub_core::HubError::NotFound(m),
            AgentToolsError::InvalidRequest(m) => agent_hub_core::HubError::InvalidRequest(m),
            AgentToolsError::Conflict(m) => agent_hub_core::HubError::Conflict(m),
            AgentToolsError::Internal(m) => agent_hub_core::HubError::Internal(m),
        }
    }
}

/// An artifact body plus its caller-supplied relative path and optional
/// display name (spec §4.G `POST /artifacts/submit`).
#[derive(Debug, Clone)]
pub struct ArtifactPublishRequest {
    pub relative_path: String,
    pub display_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Which credential the in-container agent wants resolved (spec §4.G
/// `POST /credentials/resolve`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialResolveRequest {
    OpenAiApiKey,
    GithubSsh,
}

pub struct AgentToolsRouter {
    store: Arc<StateStore>,
    events: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    vault: Arc<CredentialVault>,
    data_dir: PathBuf,
    /// Temporary (non-chat-bound) sessions for "auto-configure a new
    /// project" one-off runs, keyed by session id. In-memory only; never
    /// persisted, destroyed on process exit (spec §4.G).
    sessions: Mutex<HashMap<String, AgentToolsSession>>,
}

impl AgentToolsRouter {
    pub fn new(
        store: Arc<StateStore>,
        events: Arc<EventBus>,
        clock: Arc<dyn Clock>,
        vault: Arc<CredentialVault>,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self { store, events, clock, vault, data_dir: data_dir.into(), sessions: Mutex::new(HashMap::new()) }
    }

    fn artifacts_meta_path(&self, chat_id: &ChatId) -> PathBuf {
        self.data_dir.join("artifacts").join(format!("{chat_id}.json"))
    }

    fn publish_state_changed(&self, reason: &str) {
        self.events.publish(HubEvent::StateChanged { reason: reason.to_string() }.into_envelope(self.clock.now()));
    }

    // --- Temporary session registry ---

    /// Mint a new temporary session (one-off project auto-configuration
    /// run that has no chat yet), returning it alongside the raw bearer
    /// token the caller must hand to the process it spawns.
    pub fn create_temporary_session(&self) -> (AgentToolsSession, String) {
        let token = generate_token();
        let session = AgentToolsSession::new(None, hash_token(&token), generate_token());
        self.sessions.lock().insert(session.id.as_str().to_string(), session.clone());
        (session, token)
    }

    pub fn destroy_temporary_session(&self, session_id: &SessionId) {
        self.sessions.lock().remove(session_id.as_str());
    }

    fn authenticate_temporary(&self, session_id: &str, token: &str) -> Result<AgentToolsSession, AgentToolsError> {
        let session = self
            .sessions
            .lock()
            .get(session_id)
            .cloned()
            .ok_or_else(|| AgentToolsError::AuthFailed("unknown agent tools session".to_string()))?;
        if !verify_token(token, &session.token_hash) {
            return Err(AgentToolsError::AuthFailed("invalid token".to_string()));
        }
        Ok(session)
    }

    fn authenticate_chat(&self, chat_id: &ChatId, token: &str) -> Result<Chat, AgentToolsError> {
        let chat = self
            .store
            .read(|s| s.chat(chat_id).cloned())
            .ok_or_else(|| AgentToolsError::NotFound(format!("chat {chat_id} not found")))?;
        let hash = chat
            .artifact_token_hash
            .as_deref()
            .ok_or_else(|| AgentToolsError::AuthFailed("chat has no active session".to_string()))?;
        if !verify_token(token, hash) {
            return Err(AgentToolsError::AuthFailed("invalid token".to_string()));
        }
        Ok(chat)
    }

    // --- Artifacts ---

    /// Publish (or overwrite) an artifact under the chat's workspace
    /// (spec §4.G, property I8: containment, name/path caps, 200-entry
    /// drop-oldest bound).
    pub async fn publish_artifact(
        &self,
        chat_id: ChatId,
        token: &str,
        req: ArtifactPublishRequest,
    ) -> Result<Artifact, AgentToolsError> {
        let chat = self.authenticate_chat(&chat_id, token)?;

        let relative_path = normalize_artifact_path(&req.relative_path).map_err(AgentToolsError::InvalidRequest)?;
        let display_name = match req.display_name.as_deref() {
            Some(name) => normalize_artifact_name(name).map_err(AgentToolsError::InvalidRequest)?,
            None => relative_path.rsplit('/').next().unwrap_or(&relative_path).to_string(),
        };

        let workspace_root = PathBuf::from(&chat.workspace_path);
        let dest = workspace_root.join(&relative_path);
        if !dest.starts_with(&workspace_root) {
            return Err(AgentToolsError::InvalidRequest("artifact path escapes chat workspace".to_string()));
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| AgentToolsError::Internal(e.to_string()))?;
        }
        let size_bytes = req.bytes.len() as u64;
        tokio::fs::write(&dest, &req.bytes).await.map_err(|e| AgentToolsError::Internal(e.to_string()))?;

        let now = self.clock.now();
        let mut metadata = self.read_artifact_metadata(&chat_id);
        let artifact_id = metadata
            .iter()
            .find(|a| a.relative_path == relative_path)
            .map(|a| a.id)
            .unwrap_or_else(ArtifactId::new);
        let artifact = Artifact::new(artifact_id, display_name, relative_path.clone(), size_bytes, now);

        if let Some(existing) = metadata.iter_mut().find(|a| a.relative_path == relative_path) {
            *existing = artifact.clone();
        } else {
            metadata.push(artifact.clone());
            if metadata.len() > ARTIFACT_LIST_CAP {
                metadata.remove(0);
            }
        }
        self.write_artifact_metadata(&chat_id, &metadata)?;

        self.store
            .mutate(|s| {
                if let Some(chat) = s.chat_mut(&chat_id) {
                    chat.record_artifact(artifact.id);
                    chat.updated_at = now;
                }
            })
            .map_err(|e| AgentToolsError::Internal(e.to_string()))?;

        self.publish_state_changed("artifact_published");
        info!(chat_id = %chat_id, relative_path = %artifact.relative_path, size_bytes, "artifact published");
        Ok(artifact)
    }

    pub fn list_artifacts(&self, chat_id: &ChatId) -> Vec<Artifact> {
        self.read_artifact_metadata(chat_id)
    }

    pub fn download_path(&self, chat_id: &ChatId, artifact_id: &ArtifactId) -> Result<PathBuf, AgentToolsError> {
        let chat = self
            .store
            .read(|s| s.chat(chat_id).cloned())
            .ok_or_else(|| AgentToolsError::NotFound(format!("chat {chat_id} not found")))?;
        let artifact = self
            .read_artifact_metadata(chat_id)
            .into_iter()
            .find(|a| &a.id == artifact_id)
            .ok_or_else(|| AgentToolsError::NotFound(format!("artifact {artifact_id} not found")))?;
        Ok(PathBuf::from(chat.workspace_path).join(artifact.relative_path))
    }

    fn read_artifact_metadata(&self, chat_id: &ChatId) -> Vec<Artifact> {
        match std::fs::read_to_string(self.artifacts_meta_path(chat_id)) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    fn write_artifact_metadata(&self, chat_id: &ChatId, metadata: &[Artifact]) -> Result<(), AgentToolsError> {
        let path = self.artifacts_meta_path(chat_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AgentToolsError::Internal(e.to_string()))?;
        }
        let tmp_path = path.with_extension("json.tmp");
        let payload = serde_json::to_vec_pretty(metadata).map_err(|e| AgentToolsError::Internal(e.to_string()))?;
        std::fs::write(&tmp_path, &payload).map_err(|e| AgentToolsError::Internal(e.to_string()))?;
        std::fs::rename(&tmp_path, &path).map_err(|e| AgentToolsError::Internal(e.to_string()))?;
        Ok(())
    }

    // --- Credentials ---

    pub async fn list_credentials(&self, chat_id: &ChatId, token: &str) -> Result<serde_json::Value, AgentToolsError> {
        self.authenticate_chat(chat_id, token)?;
        self.credentials_status().await
    }

    pub async fn list_credentials_temporary(
        &self,
        session_id: &str,
        token: &str,
    ) -> Result<serde_json::Value, AgentToolsError> {
        self.authenticate_temporary(session_id, token)?;
        self.credentials_status().await
    }

    async fn credentials_status(&self) -> Result<serde_json::Value, AgentToolsError> {
        let openai = self.vault.openai_status().await.map_err(|e| AgentToolsError::Internal(e.to_string()))?;
        let github = self.vault.github_status().await.map_err(|e| AgentToolsError::Internal(e.to_string()))?;
        Ok(serde_json::json!({
            "openai": { "connected": openai.connected, "key_hint": openai.key_hint, "account_connected": openai.account_connected },
            "github": { "connected": github.connected, "account_connected": github.account_connected },
        }))
    }

    pub async fn resolve_credential(
        &self,
        chat_id: &ChatId,
        token: &str,
        req: CredentialResolveRequest,
    ) -> Result<serde_json::Value, AgentToolsError> {
        self.authenticate_chat(chat_id, token)?;
        self.do_resolve_credential(req).await
    }

    pub async fn resolve_credential_temporary(
        &self,
        session_id: &str,
        token: &str,
        req: CredentialResolveRequest,
    ) -> Result<serde_json::Value, AgentToolsError> {
        self.authenticate_temporary(session_id, token)?;
        self.do_resolve_credential(req).await
    }

    async fn do_resolve_credential(&self, req: CredentialResolveRequest) -> Result<serde_json::Value, AgentToolsError> {
        match req {
            CredentialResolveRequest::OpenAiApiKey => {
                let key = self
                    .vault
                    .openai_api_key()
                    .await
                    .map_err(|e| AgentToolsError::Internal(e.to_string()))?
                    .ok_or_else(|| AgentToolsError::NotFound("no openai credential connected".to_string()))?;
                Ok(serde_json::json!({ "kind": "openai_api_key", "value": key }))
            }
            CredentialResolveRequest::GithubSsh => {
                let (private_key, known_hosts) = self
                    .vault
                    .github_ssh_credentials()
                    .await
                    .map_err(|e| AgentToolsError::Internal(e.to_string()))?
                    .ok_or_else(|| AgentToolsError::NotFound("no github credential connected".to_string()))?;
                Ok(serde_json::json!({ "kind": "github_ssh", "private_key": private_key, "known_hosts": known_hosts }))
            }
        }
    }

    // --- Project binding ---

    /// The project the chat belongs to, for the container's git
    /// remote/branch bookkeeping (spec §4.G `POST /project-binding`).
    pub fn project_binding(&self, chat_id: &ChatId, token: &str) -> Result<serde_json::Value, AgentToolsError> {
        let chat = self.authenticate_chat(chat_id, token)?;
        let project = self
            .store
            .read(|s| s.project(&chat.project_id).cloned())
            .ok_or_else(|| AgentToolsError::NotFound(format!("project {} not found", chat.project_id)))?;
        Ok(serde_json::json!({
            "project_id": project.id.as_str(),
            "repo_url": project.repo_url,
            "default_branch": project.default_branch,
        }))
    }

    // --- Readiness ACK ---

    /// Record the container entrypoint's readiness acknowledgement,
    /// verified against the guid minted at launch (spec §4.G `POST
    /// /ack`).
    pub fn ack(
        &self,
        chat_id: &ChatId,
        token: &str,
        guid: &str,
        stage: impl Into<String>,
        meta: serde_json::Value,
    ) -> Result<(), AgentToolsError> {
        let chat = self.authenticate_chat(chat_id, token)?;
        let expected = chat
            .ready_ack_guid
            .as_deref()
            .ok_or_else(|| AgentToolsError::Conflict("chat has no pending readiness handshake".to_string()))?;
        if guid != expected {
            return Err(AgentToolsError::AuthFailed("readiness ack guid mismatch".to_string()));
        }

        let now = self.clock.now();
        let stage = stage.into();
        self.store
            .mutate(|s| {
                if let Some(chat) = s.chat_mut(chat_id) {
                    chat.readiness_ack = Some(ReadinessAck { guid: guid.to_string(), stage, received_at: now, meta });
                    chat.updated_at = now;
                }
            })
            .map_err(|e| AgentToolsError::Internal(e.to_string()))?;

        self.publish_state_changed("chat_ready_ack");
        Ok(())
    }
}

#[cfg(test)]
#[path = "agent_tools_tests.rs"]
mod tests;
