// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The chat title pipeline (spec §4.H): fingerprint-gated auto-titling
//! dispatched through the same single-in-flight-per-resource worker
//! loop as [`crate::snapshot_builder::SnapshotBuilder`], keyed by chat
//! id instead of project id, plus a pending-rerun flag so a burst of
//! submissions while a job is running collapses into one more pass
//! instead of a queue.

use std::collections::HashSet;
use std::sync::Arc;

use agent_hub_adapters::CredentialVault;
use agent_hub_core::title::truncate_title;
use agent_hub_core::{Chat, ChatId, Clock, HubEvent, TitleStatus};
use agent_hub_storage::{EventBus, StateStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info_span, warn, Instrument};

/// The maximum number of trailing prompts folded into the title
/// fingerprint and handed to the generator (spec §4.H step 1).
const PROMPT_WINDOW: usize = 16;

/// Produces a raw title string from a model name and a window of
/// submitted prompts. The real implementation ([`ProcessTitleGenerator`])
/// picks between the account-bound CLI and the bare API-key path; tests
/// substitute a fake that returns canned titles without touching the
/// network or spawning a process.
#[async_trait]
pub trait TitleGenerator: Send + Sync {
    async fn generate_title(&self, model: &str, prompts: &[String]) -> Result<String, String>;
}

/// Spawns the `codex` CLI when an OAuth account session is connected,
/// otherwise calls the OpenAI chat-completions API directly with the
/// vault's bare API key (spec §4.H step 4).
pub struct ProcessTitleGenerator {
    vault: Arc<CredentialVault>,
}

impl ProcessTitleGenerator {
    pub fn new(vault: Arc<CredentialVault>) -> Self {
        Self { vault }
    }

    async fn has_account_session(&self) -> bool {
        self.vault.openai_status().await.map(|s| s.account_connected).unwrap_or(false)
    }

    async fn generate_via_cli(&self, prompt: &str) -> Result<String, String> {
        let tmp_path =
            std::env::temp_dir().join(format!("agent-hub-title-{}.txt", agent_hub_core::token::generate_token()));
        let status = tokio::process::Command::new("codex")
            .arg("exec")
            .arg("--sandbox")
            .arg("read-only")
            .arg("--output-last-message")
            .arg(&tmp_path)
            .arg(prompt)
            .status()
            .await
            .map_err(|e| format!("failed to exec codex: {e}"))?;
        if !status.success() {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(format!("codex exec exited with status {status}"));
        }
        let contents = tokio::fs::read_to_string(&tmp_path).await.map_err(|e| e.to_string())?;
        let _ = tokio::fs::remove_file(&tmp_path).await;
        Ok(contents)
    }

    async fn generate_via_api(&self, key: &str, model: &str, prompt: &str) -> Result<String, String> {
        let client = reqwest::Client::new();
        let body = serde_json::json!({
            "model": model,
            "messages": [
                {"role": "system", "content": "Reply with a short descriptive chat title, one line, no quotes."},
                {"role": "user", "content": prompt},
            ],
            "max_tokens": 32,
        });
        let response = client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("openai request failed: {e}"))?;
        if !response.status().is_success() {
            return Err(format!("openai chat completion failed with status {}", response.status()));
        }
        let value: serde_json::Value = response.json().await.map_err(|e| e.to_string())?;
        value
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| "openai response missing message content".to_string())
    }
}

#[async_trait]
impl TitleGenerator for ProcessTitleGenerator {
    async fn generate_title(&self, model: &str, prompts: &[String]) -> Result<String, String> {
        let prompt_text = prompts.join("\n");
        if prompt_text.trim().is_empty() {
            return Err("no prompts submitted yet".to_string());
        }
        if self.has_account_session().await {
            return self.generate_via_cli(&prompt_text).await;
        }
        match self.vault.openai_api_key().await {
            Ok(Some(key)) => self.generate_via_api(&key, model, &prompt_text).await,
            Ok(None) => Err("no OpenAI credentials connected".to_string()),
            Err(err) => Err(err.to_string()),
        }
    }
}

pub struct TitlePipeline {
    store: Arc<StateStore>,
    events: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    generator: Arc<dyn TitleGenerator>,
    model: String,
    max_chars: usize,
    inflight: Mutex<HashSet<String>>,
    pending_rerun: Mutex<HashSet<String>>,
}

impl TitlePipeline {
    pub fn new(
        store: Arc<StateStore>,
        events: Arc<EventBus>,
        clock: Arc<dyn Clock>,
        generator: Arc<dyn TitleGenerator>,
        model: impl Into<String>,
        max_chars: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            events,
            clock,
            generator,
            model: model.into(),
            max_chars,
            inflight: Mutex::new(HashSet::new()),
            pending_rerun: Mutex::new(HashSet::new()),
        })
    }

    /// Called on every submitted prompt (wired to
    /// [`crate::terminal::TerminalHub::set_on_submit`] by
    /// [`crate::hub::Hub`]). No-ops if the fingerprint over the current
    /// prompt window hasn't changed; otherwise marks the chat `pending`
    /// and starts (or flags a rerun for) its worker loop.
    pub fn trigger(self: &Arc<Self>, chat_id: ChatId) {
        let Some(chat) = self.store.read(|s| s.chat(&chat_id).cloned()) else { return };
        let fingerprint = self.fingerprint(&chat);
        if chat.title_prompt_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            return;
        }

        let mut inflight = self.inflight.lock();
        if inflight.contains(chat_id.as_str()) {
            self.pending_rerun.lock().insert(chat_id.as_str().to_string());
            return;
        }
        inflight.insert(chat_id.as_str().to_string());
        drop(inflight);

        let _ = self.store.mutate(|s| {
            if let Some(chat) = s.chat_mut(&chat_id) {
                chat.title_status = TitleStatus::Pending;
            }
        });
        self.publish_state_changed("title_generation_pending");

        let this = Arc::clone(self);
        tokio::spawn(async move { this.worker_loop(chat_id).await });
    }

    async fn worker_loop(self: Arc<Self>, chat_id: ChatId) {
        loop {
            let span = info_span!("title_generate", chat_id = %chat_id);
            self.run_once(&chat_id).instrument(span).await;

            let mut pending = self.pending_rerun.lock();
            if pending.remove(chat_id.as_str()) {
                continue;
            }
            break;
        }
        self.inflight.lock().remove(chat_id.as_str());
    }

    async fn run_once(&self, chat_id: &ChatId) {
        let Some(chat) = self.store.read(|s| s.chat(chat_id).cloned()) else { return };
        let fingerprint = self.fingerprint(&chat);
        let prompts = self.prompt_window(&chat);

        match self.generator.generate_title(&self.model, &prompts).await {
            Ok(raw) => {
                let title = postprocess_title(&raw, self.max_chars);
                let now = self.clock.now();
                let _ = self.store.mutate(|s| {
                    if let Some(chat) = s.chat_mut(chat_id) {
                        chat.title_cached = Some(title);
                        chat.title_prompt_fingerprint = Some(fingerprint);
                        chat.title_source = Some(self.model.clone());
                        chat.title_status = TitleStatus::Ready;
                        chat.title_error = None;
                        chat.title_updated_at = Some(now);
                    }
                });
                self.publish_state_changed("title_generation_ready");
            }
            Err(err) => {
                warn!(chat_id = %chat_id, error = %err, "title generation failed");
                let now = self.clock.now();
                let _ = self.store.mutate(|s| {
                    if let Some(chat) = s.chat_mut(chat_id) {
                        chat.title_status = TitleStatus::Error;
                        chat.title_error = Some(err);
                        chat.title_updated_at = Some(now);
                    }
                });
                self.publish_state_changed("title_generation_error");
            }
        }
    }

    fn prompt_window(&self, chat: &Chat) -> Vec<String> {
        let start = chat.title_prompt_history.len().saturating_sub(PROMPT_WINDOW);
        chat.title_prompt_history[start..].to_vec()
    }

    /// SHA-256 over the canonical JSON of `{model, max_chars, prompts}`
    /// (spec §4.H step 1), so any change to the model, the truncation
    /// cap, or the trailing prompt window invalidates a cached title.
    fn fingerprint(&self, chat: &Chat) -> String {
        let prompts = self.prompt_window(chat);
        let value = serde_json::json!({ "model": self.model, "max_chars": self.max_chars, "prompts": prompts });
        agent_hub_core::fingerprint::fingerprint(&value)
    }

    fn publish_state_changed(&self, reason: &str) {
        self.events.publish(HubEvent::StateChanged { reason: reason.to_string() }.into_envelope(self.clock.now()));
    }
}

/// First non-empty line of the generator's raw output, quote-stripped
/// and truncated (spec §4.H step 5).
fn postprocess_title(raw: &str, max_chars: usize) -> String {
    let first_line = raw.lines().map(str::trim).find(|line| !line.is_empty()).unwrap_or("");
    let stripped = first_line.trim_matches(|c: char| matches!(c, '"' | '\'' | '\u{201c}' | '\u{201d}'));
    truncate_title(stripped, max_chars)
}

#[cfg(test)]
#[path = "title_pipeline_tests.rs"]
mod tests;
