// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The OpenAI account login session (spec section 3): a singleton
//! tracking an in-progress or completed browser/device OAuth flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::define_id;

define_id! {
    pub struct LoginSessionId("ols-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginMethod {
    BrowserCallback,
    DeviceAuth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginStatus {
    Starting,
    Running,
    WaitingForBrowser,
    WaitingForDeviceCode,
    CallbackReceived,
    Connected,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiAccountSession {
    pub id: LoginSessionId,
    pub method: LoginMethod,
    pub status: LoginStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub exit_code: Option<i32>,
    pub login_url: Option<String>,
    pub device_code: Option<String>,
    pub local_callback_url: Option<String>,
    pub local_callback_port: Option<u16>,
    pub local_callback_path: Option<String>,
    pub log_tail: Vec<String>,
}

const LOG_TAIL_CAP: usize = 200;

impl OpenAiAccountSession {
    pub fn new(id: LoginSessionId, method: LoginMethod, now: DateTime<Utc>) -> Self {
        Self {
            id,
            method,
            status: LoginStatus::Starting,
            started_at: now,
            completed_at: None,
            exit_code: None,
            login_url: None,
            device_code: None,
            local_callback_url: None,
            local_callback_port: None,
            local_callback_path: None,
            log_tail: Vec::new(),
        }
    }

    pub fn push_log_line(&mut self, line: impl Into<String>) {
        self.log_tail.push(line.into());
        if self.log_tail.len() > LOG_TAIL_CAP {
            self.log_tail.remove(0);
        }
    }

    pub fn transition(&mut self, status: LoginStatus) {
        self.status = status;
    }

    pub fn complete(&mut self, status: LoginStatus, exit_code: Option<i32>, now: DateTime<Utc>) {
        self.status = status;
        self.exit_code = exit_code;
        self.completed_at = Some(now);
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, LoginStatus::Connected | LoginStatus::Failed | LoginStatus::Cancelled)
    }
}

/// The hub keeps at most one active login session; starting a new one
/// (possibly with a different method) supersedes whatever is running.
#[derive(Debug, Default)]
pub struct LoginSessionSlot {
    current: Option<OpenAiAccountSession>,
}

impl LoginSessionSlot {
    pub fn new() -> Self {
        Self { current: None }
    }

    pub fn current(&self) -> Option<&OpenAiAccountSession> {
        self.current.as_ref()
    }

    /// Replace whatever session is active with a freshly started one,
    /// cancelling the old one first if it wasn't already terminal.
    pub fn start(&mut self, method: LoginMethod, now: DateTime<Utc>) -> &mut OpenAiAccountSession {
        if let Some(old) = self.current.as_mut() {
            if !old.is_terminal() {
                old.complete(LoginStatus::Cancelled, None, now);
            }
        }
        self.current.insert(OpenAiAccountSession::new(LoginSessionId::new(), method, now))
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), String> {
        match self.current.as_mut() {
            Some(session) if !session.is_terminal() => {
                session.complete(LoginStatus::Cancelled, None, now);
                Ok(())
            }
            Some(_) => Err("login session already finished".to_string()),
            None => Err("no active login session".to_string()),
        }
    }

    pub fn current_mut(&mut self) -> Option<&mut OpenAiAccountSession> {
        self.current.as_mut()
    }
}

#[cfg(test)]
#[path = "openai_session_tests.rs"]
mod tests;
