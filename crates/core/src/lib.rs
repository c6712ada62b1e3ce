// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! agent-hub-core: entities, pure algorithms and shared abstractions
//! for Agent Hub's supervisor.

pub mod agent_tools_session;
pub mod ansi;
pub mod artifact;
pub mod artifact_path;
pub mod chat;
pub mod chat_preview;
pub mod clock;
pub mod credential;
pub mod error;
pub mod event;
pub mod fingerprint;
pub mod id;
pub mod mount;
pub mod openai_session;
pub mod project;
pub mod prompt;
pub mod title;
pub mod token;

pub use agent_tools_session::{AgentToolsSession, SessionId};
pub use artifact::{Artifact, ArtifactId};
pub use chat::{
    chat_workspace_dir_name, sanitize_workspace_component, AgentType, Chat, ChatId, ChatStatus, ReadinessAck,
    TitleStatus, ARTIFACT_LIST_CAP, PROMPT_ARTIFACT_GROUP_CAP, TITLE_PROMPT_HISTORY_CAP,
};
pub use chat_preview::{preview_lines, PreviewLine, PreviewRole, CHAT_PREVIEW_LOG_MAX_BYTES};
pub use clock::{Clock, FakeClock, SystemClock};
pub use credential::{CredentialBinding, CredentialId};
pub use error::{ErrorPayload, HubError};
pub use event::{Envelope, HubEvent};
pub use mount::{validate_env_entries, validate_mount, EnvVar, Mount, RESERVED_ENV_KEYS};
pub use openai_session::{
    LoginMethod, LoginSessionId, LoginSessionSlot, LoginStatus, OpenAiAccountSession,
};
pub use project::{BaseImageRef, BuildStatus, Project, ProjectId};

pub type HubResult<T> = Result<T, HubError>;
