// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Event Bus's typed envelope and payload set (spec section 4.B).

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One event as delivered to a subscriber: `{type, payload, sent_at}`.
///
/// `sent_at` is serialized at second resolution, matching the spec's
/// `ISO-8601 UTC, second resolution` requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub payload: serde_json::Value,
    pub sent_at: DateTime<Utc>,
}

impl Envelope {
    pub fn new(kind: &'static str, payload: serde_json::Value, sent_at: DateTime<Utc>) -> Self {
        Self { kind, payload, sent_at }
    }

    /// Render `sent_at` as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn sent_at_iso(&self) -> String {
        self.sent_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Typed event payloads, each carrying its own envelope `type` name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum HubEvent {
    #[serde(rename = "snapshot")]
    Snapshot { state: serde_json::Value },

    #[serde(rename = "state_changed")]
    StateChanged { reason: String },

    #[serde(rename = "auth_changed")]
    AuthChanged { reason: String },

    #[serde(rename = "openai_account_session")]
    OpenAiAccountSession { session: serde_json::Value },

    #[serde(rename = "project_build_log")]
    ProjectBuildLog { project_id: String, text: String, replace: bool },
}

impl HubEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            HubEvent::Snapshot { .. } => "snapshot",
            HubEvent::StateChanged { .. } => "state_changed",
            HubEvent::AuthChanged { .. } => "auth_changed",
            HubEvent::OpenAiAccountSession { .. } => "openai_account_session",
            HubEvent::ProjectBuildLog { .. } => "project_build_log",
        }
    }

    /// Build the wire envelope for this event at the given time.
    pub fn into_envelope(self, sent_at: DateTime<Utc>) -> Envelope {
        let kind = self.kind();
        let payload = match self {
            HubEvent::Snapshot { state } => state,
            HubEvent::StateChanged { reason } => serde_json::json!({ "reason": reason }),
            HubEvent::AuthChanged { reason } => serde_json::json!({ "reason": reason }),
            HubEvent::OpenAiAccountSession { session } => session,
            HubEvent::ProjectBuildLog { project_id, text, replace } => {
                serde_json::json!({ "project_id": project_id, "text": text, "replace": replace })
            }
        };
        Envelope::new(kind, payload, sent_at)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
