// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! agent-hub-engine: the stateful supervisors that compose
//! `agent-hub-storage` + `agent-hub-adapters` into Agent Hub's
//! supervisor (spec §4.D-§4.H).
//!
//! Nothing in this crate knows about HTTP; `agent-hub-server` drives
//! every public type here from its axum handlers.

pub mod agent_tools;
pub mod chat_supervisor;
pub mod hub;
pub mod snapshot_builder;
pub mod terminal;
pub mod title_pipeline;

pub use agent_tools::{AgentToolsError, AgentToolsRouter, ArtifactPublishRequest, CredentialResolveRequest};
pub use chat_supervisor::{ChatSupervisor, ChatSupervisorError};
pub use hub::Hub;
pub use snapshot_builder::SnapshotBuilder;
pub use terminal::{InputMessage, TerminalHub, TerminalSubscriber};
pub use title_pipeline::{TitleGenerator, TitlePipeline};
