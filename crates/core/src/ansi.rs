// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streaming ANSI/CSI/OSC/DCS stripper.
//!
//! PTY output arrives in arbitrarily sized chunks; an escape sequence can
//! straddle a chunk boundary. [`AnsiStripper`] carries an undigested
//! partial-escape prefix across calls to `feed` so the cleaned text is
//! identical regardless of how the underlying reads were chunked.

/// Strips terminal control sequences from a chunked text stream.
#[derive(Debug, Default)]
pub struct AnsiStripper {
    carry: String,
}

impl AnsiStripper {
    pub fn new() -> Self {
        Self { carry: String::new() }
    }

    /// The undigested partial-escape prefix currently held across calls.
    pub fn carry(&self) -> &str {
        &self.carry
    }

    /// Feed the next chunk and return the cleaned text produced so far.
    /// Any trailing incomplete escape sequence is retained internally and
    /// resolved (or re-carried) on the next call.
    pub fn feed(&mut self, input: &str) -> String {
        let combined = if self.carry.is_empty() {
            input.to_string()
        } else {
            let mut s = std::mem::take(&mut self.carry);
            s.push_str(input);
            s
        };

        let chars: Vec<char> = combined.chars().collect();
        let mut out = String::with_capacity(combined.len());
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c != '\u{1b}' {
                out.push(c);
                i += 1;
                continue;
            }

            if i + 1 >= chars.len() {
                self.carry = chars[i..].iter().collect();
                return out;
            }

            match chars[i + 1] {
                '[' => {
                    // CSI: ESC [ ... final-byte in '@'..='~'
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
                        Some(end) => i = end + 1,
                        None => {
                            self.carry = chars[i..].iter().collect();
                            return out;
                        }
                    }
                }
                ']' | 'P' => {
                    // OSC / DCS: terminated by BEL or ESC \
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
                            self.carry = chars[i..].iter().collect();
                            return out;
                        }
                    }
                }
                _ => {
                    // Two-byte escape, e.g. ESC O M (application-keypad Enter).
                    i += 2;
                }
            }
        }

        out
    }
}

/// One-shot strip with no carry (for already-complete strings).
pub fn strip_ansi(input: &str) -> String {
    AnsiStripper::new().feed(input)
}

#[cfg(test)]
#[path = "ansi_tests.rs"]
mod tests;
