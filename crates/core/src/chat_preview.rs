// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A "what was this chat about" preview derived from the tail of a
//! chat's transcript log (spec §12 supplement): read-only derived data
//! surfaced on the chat list payload, never persisted.

use crate::ansi::strip_ansi;

/// The facade never reads more than this many trailing bytes of a
/// chat's log file before deriving a preview.
pub const CHAT_PREVIEW_LOG_MAX_BYTES: usize = 150_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PreviewLine {
    pub role: PreviewRole,
    pub text: String,
}

/// Classify the non-empty lines of a (already tail-truncated) log
/// excerpt as user-authored or assistant output. A leading `›`, `>`, or
/// `You:` marker means user-authored; a `Tip:`-prefixed line is dropped
/// entirely (the agent CLI's own help text, not conversation content).
pub fn preview_lines(log_tail: &str) -> Vec<PreviewLine> {
    let sanitized = sanitize_terminal_log_text(log_tail);
    sanitized
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed.starts_with('\u{203a}') || trimmed.starts_with('>') || trimmed.starts_with("You:") {
                let mut normalized = trimmed.trim_start_matches(['\u{203a}', '>']).trim().to_string();
                if normalized.to_ascii_lowercase().starts_with("you:") {
                    normalized = normalized[4..].trim().to_string();
                }
                if normalized.is_empty() {
                    return None;
                }
                return Some(PreviewLine { role: PreviewRole::User, text: normalized });
            }
            if trimmed.starts_with("Tip:") {
                return None;
            }
            Some(PreviewLine { role: PreviewRole::Assistant, text: trimmed.to_string() })
        })
        .collect()
}

/// Strip ANSI control sequences, fold carriage returns (animated
/// terminal redraws) into line breaks, and drop any remaining C0
/// control bytes other than the newline just introduced.
fn sanitize_terminal_log_text(raw: &str) -> String {
    let stripped = strip_ansi(raw);
    let folded = stripped.replace('\r', "\n");
    folded.chars().filter(|c| *c == '\n' || !c.is_control()).collect()
}

#[cfg(test)]
#[path = "chat_preview_tests.rs"]
mod tests;
