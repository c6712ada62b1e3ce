// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Agent Tools session registry entity (spec section 3): per-chat
//! bearer tokens and the readiness-ACK guid the container must present.
//!
//! This is runtime-only bookkeeping — it never persists to `state.json`
//! (the chat's own `artifact_token_hash`/`ready_ack_guid` fields are the
//! durable record); the registry in `agent-hub-engine` holds the live
//! in-memory map keyed by this id.

use serde::{Deserialize, Serialize};

use crate::define_id;

define_id! {
    pub struct SessionId("ats-");
}

/// A live agent-tools session: either bound to a chat (`chat_id` set) or
/// a temporary one-off session used for project auto-configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentToolsSession {
    pub id: SessionId,
    pub chat_id: Option<String>,
    pub token_hash: String,
    pub ready_ack_guid: String,
}

impl AgentToolsSession {
    pub fn new(chat_id: Option<String>, token_hash: impl Into<String>, ready_ack_guid: impl Into<String>) -> Self {
        Self { id: SessionId::new(), chat_id, token_hash: token_hash.into(), ready_ack_guid: ready_ack_guid.into() }
    }

    pub fn is_temporary(&self) -> bool {
        self.chat_id.is_none()
    }
}

#[cfg(test)]
#[path = "agent_tools_session_tests.rs"]
mod tests;
