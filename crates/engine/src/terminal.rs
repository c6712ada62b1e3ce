// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The terminal multiplexer (spec §4.F): one reader thread per running
//! chat fanning raw PTY output out to websocket listeners, plus the
//! input-side prompt submission detector.
//!
//! Grounded on `agent_hub_storage::EventBus`'s ring-buffer idiom (Open
//! Question 3 in `DESIGN.md`): [`TerminalSubscriber`] is the same
//! bounded drop-oldest queue shape, just carrying decoded output chunks
//! instead of typed envelopes, since the facade forwards bytes on this
//! channel rather than events.

use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use agent_hub_adapters::{PtyProcess, PtySize};
use agent_hub_core::prompt::{self, PromptBuffer};
use agent_hub_core::{Chat, ChatId, Clock, HubEvent};
use agent_hub_storage::{EventBus, StateStore};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{info, warn};

const SUBSCRIBER_CAPACITY: usize = 512;
const READ_CHUNK_BYTES: usize = 8192;

struct SubscriberInner {
    queue: Mutex<VecDeque<Option<String>>>,
    notify: Notify,
}

/// A single terminal websocket's bounded drop-oldest queue of decoded
/// output chunks.
#[derive(Clone)]
pub struct TerminalSubscriber {
    inner: Arc<SubscriberInner>,
}

impl TerminalSubscriber {
    fn new() -> Self {
        Self { inner: Arc::new(SubscriberInner { queue: Mutex::new(VecDeque::new()), notify: Notify::new() }) }
    }

    fn push(&self, chunk: Option<String>) {
        let mut queue = self.inner.queue.lock();
        if queue.len() >= SUBSCRIBER_CAPACITY {
            queue.pop_front();
        }
        queue.push_back(chunk);
        drop(queue);
        self.inner.notify.notify_one();
    }

    /// Await the next chunk, or `None` once the chat's PTY has closed.
    pub async fn recv(&self) -> Option<String> {
        loop {
            if let Some(item) = self.inner.queue.lock().pop_front() {
                return item;
            }
            self.inner.notify.notified().await;
        }
    }
}

/// A message arriving on a chat's terminal websocket (spec §4.F): a
/// bare string is forwarded as raw keystrokes by the facade before it
/// ever reaches this type; a structured frame carries resize/submit.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputMessage {
    Input { data: String },
    Resize { cols: u16, rows: u16 },
    Submit { text: String },
}

struct ChatChannel {
    writer: Mutex<Box<dyn Write + Send>>,
    pty: Mutex<PtyProcess>,
    subscribers: Mutex<Vec<TerminalSubscriber>>,
    input_buffer: Mutex<PromptBuffer>,
    log_path: PathBuf,
}

/// Owns every running chat's PTY reader thread and fan-out queues.
pub struct TerminalHub {
    store: Arc<StateStore>,
    clock: Arc<dyn Clock>,
    events: Arc<EventBus>,
    data_dir: PathBuf,
    channels: Mutex<HashMap<String, Arc<ChatChannel>>>,
    on_submit: Mutex<Option<Arc<dyn Fn(ChatId, String) + Send + Sync>>>,
}

impl TerminalHub {
    pub fn new(
        store: Arc<StateStore>,
        clock: Arc<dyn Clock>,
        events: Arc<EventBus>,
        data_dir: impl Into<PathBuf>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            clock,
            events,
            data_dir: data_dir.into(),
            channels: Mutex::new(HashMap::new()),
            on_submit: Mutex::new(None),
        })
    }

    fn publish_state_changed(&self, reason: &str) {
        self.events.publish(HubEvent::StateChanged { reason: reason.to_string() }.into_envelope(self.clock.now()));
    }

    /// Register the callback invoked with `(chat_id, prompt)` whenever
    /// the input normalizer detects a submitted line (wired to
    /// `TitlePipeline::trigger` by [`crate::hub::Hub`]).
    pub fn set_on_submit(&self, cb: Arc<dyn Fn(ChatId, String) + Send + Sync>) {
        *self.on_submit.lock() = Some(cb);
    }

    /// Path of the transcript log file the facade reads back for `GET
    /// /api/chats/{id}/logs`.
    pub fn log_path(&self, chat_id: &ChatId) -> PathBuf {
        self.data_dir.join("logs").join(format!("{chat_id}.log"))
    }

    /// Register a freshly spawned PTY under `chat_id` and start its
    /// reader thread.
    pub fn register(self: &Arc<Self>, chat_id: ChatId, pty: PtyProcess) -> Result<(), String> {
        let reader = pty.reader().map_err(|e| e.to_string())?;
        let writer = pty.writer().map_err(|e| e.to_string())?;

        let log_path = self.log_path(&chat_id);
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = std::fs::File::create(&log_path);

        let channel = Arc::new(ChatChannel {
            writer: Mutex::new(writer),
            pty: Mutex::new(pty),
            subscribers: Mutex::new(Vec::new()),
            input_buffer: Mutex::new(PromptBuffer::new()),
            log_path,
        });
        self.channels.lock().insert(chat_id.as_str().to_string(), Arc::clone(&channel));

        let this = Arc::clone(self);
        std::thread::spawn(move || this.reader_loop(chat_id, reader, channel));
        Ok(())
    }

    fn reader_loop(self: Arc<Self>, chat_id: ChatId, mut reader: Box<dyn Read + Send>, channel: Arc<ChatChannel>) {
        let mut chunk = [0u8; READ_CHUNK_BYTES];
        let mut pending: Vec<u8> = Vec::new();
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    pending.extend_from_slice(&chunk[..n]);
                    let (decoded, rest) = decode_utf8_prefix(&pending);
                    pending = rest;
                    if decoded.is_empty() {
                        continue;
                    }
                    append_to_log(&channel.log_path, decoded.as_bytes());
                    let subscribers = channel.subscribers.lock().clone();
                    for sub in &subscribers {
                        sub.push(Some(decoded.clone()));
                    }
                }
                Err(err) => {
                    warn!(chat_id = %chat_id, error = %err, "pty reader error, closing channel");
                    break;
                }
            }
        }
        let subscribers = channel.subscribers.lock().clone();
        for sub in &subscribers {
            sub.push(None);
        }
        self.channels.lock().remove(chat_id.as_str());
        info!(chat_id = %chat_id, "terminal reader thread exited");
    }

    /// Attach a new subscriber, returning it plus the on-disk backlog
    /// accumulated so far (spec §4.F: attach returns the listener queue
    /// and the full log backlog).
    pub fn attach(&self, chat_id: &ChatId) -> Option<(TerminalSubscriber, String)> {
        let channel = self.channels.lock().get(chat_id.as_str()).cloned()?;
        let backlog = std::fs::read_to_string(&channel.log_path).unwrap_or_default();
        let subscriber = TerminalSubscriber::new();
        channel.subscribers.lock().push(subscriber.clone());
        Some((subscriber, backlog))
    }

    pub fn detach(&self, chat_id: &ChatId, subscriber: &TerminalSubscriber) {
        if let Some(channel) = self.channels.lock().get(chat_id.as_str()).cloned() {
            channel.subscribers.lock().retain(|s| !Arc::ptr_eq(&s.inner, &subscriber.inner));
        }
    }

    pub fn is_registered(&self, chat_id: &ChatId) -> bool {
        self.channels.lock().contains_key(chat_id.as_str())
    }

    /// Write input to the PTY and run it through the submitted-prompt
    /// detector (spec §4.F).
    pub fn handle_input(&self, chat_id: &ChatId, message: InputMessage) -> Result<(), String> {
        let channel = self.channels.lock().get(chat_id.as_str()).cloned().ok_or("chat has no active terminal")?;
        match message {
            InputMessage::Input { data } => {
                self.write_raw(&channel, &data)?;
                self.detect_submissions(chat_id, &channel, &data);
            }
            InputMessage::Submit { text } => {
                let mut data = text;
                data.push('\r');
                self.write_raw(&channel, &data)?;
                self.detect_submissions(chat_id, &channel, &data);
            }
            InputMessage::Resize { cols, rows } => self.resize(&channel, cols, rows)?,
        }
        Ok(())
    }

    fn write_raw(&self, channel: &ChatChannel, data: &str) -> Result<(), String> {
        channel.writer.lock().write_all(data.as_bytes()).map_err(|e| e.to_string())
    }

    fn resize(&self, channel: &ChatChannel, cols: u16, rows: u16) -> Result<(), String> {
        // `PtyProcess::resize` issues the TIOCSWINSZ ioctl, which the
        // kernel turns into a SIGWINCH to the foreground process group
        // on its own; no separate signal call is needed.
        channel.pty.lock().resize(PtySize { cols, rows }).map_err(|e| e.to_string())
    }

    fn detect_submissions(&self, chat_id: &ChatId, channel: &ChatChannel, data: &str) {
        let submitted = channel.input_buffer.lock().feed(data);
        for raw in submitted {
            if prompt::looks_like_terminal_control_payload(&raw) {
                continue;
            }
            let sanitized = prompt::sanitize_submitted_prompt(&raw);
            if sanitized.is_empty() {
                continue;
            }
            let now = self.clock.now();
            let recorded = self
                .store
                .mutate(|s| match s.chat_mut(chat_id) {
                    Some(chat) => {
                        record_submission(chat, sanitized.clone(), now);
                        true
                    }
                    None => false,
                })
                .unwrap_or(false);
            if recorded {
                self.publish_state_changed("title_prompt_recorded");
                if let Some(cb) = self.on_submit.lock().clone() {
                    cb(*chat_id, sanitized);
                }
            }
        }
    }

    /// Best-effort shutdown of a chat's reader/writer (called by
    /// [`crate::chat_supervisor::ChatSupervisor::close`] after the
    /// process itself has been signalled). Dropping the channel's
    /// `PtyProcess` and writer closes the master fd, so the reader
    /// thread's next `read()` returns EOF and exits on its own
    /// (property I5).
    pub fn unregister(&self, chat_id: &ChatId) {
        self.channels.lock().remove(chat_id.as_str());
    }

    /// Signal a chat's process group SIGTERM, wait up to `grace` for it
    /// to exit, then SIGKILL any survivor before unregistering (spec
    /// §4.E `close`/`shutdown`).
    pub async fn terminate(&self, chat_id: &ChatId, grace: std::time::Duration) {
        if let Some(channel) = self.channels.lock().get(chat_id.as_str()).cloned() {
            let _ = channel.pty.lock().signal_group(nix::sys::signal::Signal::SIGTERM);
            tokio::time::sleep(grace).await;
            let still_running = matches!(channel.pty.lock().try_wait(), Ok(None));
            if still_running {
                let _ = channel.pty.lock().signal_group(nix::sys::signal::Signal::SIGKILL);
            }
        }
        self.unregister(chat_id);
    }
}

fn record_submission(chat: &mut Chat, prompt: String, now: chrono::DateTime<chrono::Utc>) {
    chat.push_title_prompt(prompt);
    chat.archive_current_artifact_group();
    chat.updated_at = now;
}

fn append_to_log(path: &std::path::Path, bytes: &[u8]) {
    if let Ok(mut file) = std::fs::OpenOptions::new().create(true).append(true).open(path) {
        let _ = file.write_all(bytes);
    }
}

/// Split `bytes` at the last valid UTF-8 boundary, returning the valid
/// prefix and the undecoded suffix (an incomplete multi-byte sequence
/// straddling the chunk boundary) to prepend to the next read.
fn decode_utf8_prefix(bytes: &[u8]) -> (String, Vec<u8>) {
    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), Vec::new()),
        Err(err) => {
            let valid_up_to = err.valid_up_to();
            let (valid, rest) = bytes.split_at(valid_up_to);
            (String::from_utf8_lossy(valid).into_owned(), rest.to_vec())
        }
    }
}

#[cfg(test)]
#[path = "terminal_tests.rs"]
mod tests;
