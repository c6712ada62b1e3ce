// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Submitted-prompt detection over raw terminal input bytes.
//!
//! The terminal websocket forwards every keystroke typed by the user to
//! the PTY. [`PromptBuffer`] watches that byte stream and reconstructs
//! the lines the user actually submitted (pressed Enter on), so the
//! hub can auto-title a chat from what was typed without shelling out
//! to the agent itself.

use std::sync::OnceLock;

use regex::Regex;

const MAX_BUFFERED_CHARS: usize = 2000;

/// Accumulates raw input bytes and yields a submitted line whenever the
/// user presses Enter.
///
/// A CSI/OSC/DCS escape sequence straddling a chunk boundary (the
/// terminal websocket forwards keystrokes as they arrive, not in
/// escape-sequence-aligned chunks) is carried in `esc_carry` and
/// resolved on the next `feed` call, the same technique
/// [`crate::ansi::AnsiStripper`] uses for PTY output.
#[derive(Debug, Default)]
pub struct PromptBuffer {
    buf: String,
    esc_carry: String,
}

impl PromptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of raw terminal input. Returns any lines the user
    /// submitted within this chunk, in order.
    pub fn feed(&mut self, input: &str) -> Vec<String> {
        let combined = if self.esc_carry.is_empty() {
            input.to_string()
        } else {
            let mut s = std::mem::take(&mut self.esc_carry);
            s.push_str(input);
            s
        };
        let chars: Vec<char> = combined.chars().collect();
        let mut submitted = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '\r' => {
                    // \r\n counts as a single Enter.
                    if i + 1 < chars.len() && chars[i + 1] == '\n' {
                        i += 1;
                    }
                    submitted.push(std::mem::take(&mut self.buf));
                    i += 1;
                }
                '\n' => {
                    submitted.push(std::mem::take(&mut self.buf));
                    i += 1;
                }
                '\u{7f}' | '\u{8}' => {
                    self.buf.pop();
                    i += 1;
                }
                '\u{15}' => {
                    // Ctrl-U: clear the current line.
                    self.buf.clear();
                    i += 1;
                }
                '\u{1b}' => {
                    if i + 1 >= chars.len() {
                        self.esc_carry = chars[i..].iter().collect();
                        return submitted;
                    }
                    match chars[i + 1] {
                        // Application-keypad Enter: ESC O M.
                        'O' => {
                            if i + 2 >= chars.len() {
                                self.esc_carry = chars[i..].iter().collect();
                                return submitted;
                            }
                            if chars[i + 2] == 'M' {
                                submitted.push(std::mem::take(&mut self.buf));
                            }
                            i += 3;
                        }
                        // CSI: ESC [ ... final-byte in '@'..='~'. xterm
                        // Enter is CSI "13~"; every other CSI sequence is
                        // terminal control and contributes no text.
                        '[' => {
                            let mut j = i + 2;
                            let mut end = None;
                            while j < chars.len() {
                                if ('@'..='~').contains(&chars[j]) {
                                    end = Some(j);
                                    break;
                                }
                                j += 1;
                            }
                            match end {
                                Some(end) => {
                                    let seq: String = chars[i + 2..=end].iter().collect();
                                    if seq == "13~" {
                                        submitted.push(std::mem::take(&mut self.buf));
                                    }
                                    i = end + 1;
                                }
                                None => {
                                    self.esc_carry = chars[i..].iter().collect();
                                    return submitted;
                                }
                            }
                        }
                        // OSC / DCS: terminated by BEL or ESC \.
                        ']' | 'P' => {
                            let mut j = i + 2;
                            let mut end = None;
                            while j < chars.len() {
                                if chars[j] == '\u{7}' {
                                    end = Some(j + 1);
                                    break;
                                }
                                if chars[j] == '\u{1b}' && j + 1 < chars.len() && chars[j + 1] == '\\' {
                                    end = Some(j + 2);
                                    break;
                                }
                                j += 1;
                            }
                            match end {
                                Some(end) => i = end,
                                None => {
                                    self.esc_carry = chars[i..].iter().collect();
                                    return submitted;
                                }
                            }
                        }
                        // Any other two-byte escape: terminal control, not
                        // printable input.
                        _ => i += 2,
                    }
                }
                c if (c as u32) < 0x20 => {
                    i += 1;
                }
                c => {
                    if self.buf.chars().count() < MAX_BUFFERED_CHARS {
                        self.buf.push(c);
                    }
                    i += 1;
                }
            }
        }

        submitted
    }

    /// The text typed so far but not yet submitted.
    pub fn pending(&self) -> &str {
        &self.buf
    }
}

/// Collapses any run of whitespace to a single space and trims the
/// ends, mirroring the original's `_compact_whitespace`.
fn compact_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Matches an OSC color-response fragment embedded anywhere in a line
/// (e.g. a terminal's `]10;rgb:e7e7/eded/f7f7` echo riding along with
/// typed text), unanchored so it can be substituted out rather than
/// just rejecting the whole line.
fn osc_color_fragment_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"(?i)(?:^|\s)\]?\d{1,3};(?:rgb|rgba):[0-9a-f]{2,4}/[0-9a-f]{2,4}/[0-9a-f]{2,4}").unwrap()
    })
}

/// Strips control characters, substitutes out embedded OSC color-echo
/// fragments, and collapses whitespace from a submitted line before it
/// is considered as a chat title source.
pub fn sanitize_submitted_prompt(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
    let cleaned = compact_whitespace(&cleaned);
    if cleaned.is_empty() {
        return String::new();
    }
    let cleaned = osc_color_fragment_pattern().replace_all(&cleaned, " ");
    compact_whitespace(&cleaned).trim_matches(|c| c == ' ' || c == ';').to_string()
}

fn osc_rgb_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^\]?\d{1,3};(?:rgb|rgba):[0-9a-f]{2,4}/[0-9a-f]{2,4}/[0-9a-f]{2,4}").unwrap()
    })
}

fn osc_index_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^\]?\d{1,3};").unwrap()
    })
}

/// True if a submitted line looks like a terminal's OSC color-response
/// echo (e.g. `]10;rgb:e7e7/eded/f7f7`) rather than typed prose, in
/// which case it should not be used to auto-title a chat (spec §4.F).
/// Ported from the original's `_looks_like_terminal_control_payload`.
pub fn looks_like_terminal_control_payload(raw: &str) -> bool {
    let value = compact_whitespace(raw);
    if value.is_empty() {
        return false;
    }
    let lowered = value.to_lowercase();
    if osc_rgb_pattern().is_match(&lowered) {
        return true;
    }
    if osc_index_pattern().is_match(&lowered) && lowered.contains("rgb:") {
        return true;
    }
    false
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
