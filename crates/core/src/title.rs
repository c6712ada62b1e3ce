// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat auto-title truncation.
//!
//! Prefers breaking at a natural delimiter over a hard character cut,
//! so a long submitted prompt still reads as a sentence fragment
//! rather than being chopped mid-word.

const DELIMITERS: &[&str] = &[" -- ", " - ", " | ", ": ", "; ", ". ", ", "];

/// Truncate `title` to at most `max_len` characters, preferring to break
/// at one of [`DELIMITERS`], then at a word boundary, then hard-cutting.
/// A delimiter break is returned verbatim (no ellipsis); the word-
/// boundary and hard-cut fallbacks are suffixed with one.
pub fn truncate_title(title: &str, max_len: usize) -> String {
    let title = title.trim();
    if title.chars().count() <= max_len {
        return title.to_string();
    }
    if max_len == 0 {
        return String::new();
    }

    let ellipsis_len = 1;
    let budget = max_len.saturating_sub(ellipsis_len);

    const MIN_DELIMITER_HEAD_LEN: usize = 12;

    for delim in DELIMITERS {
        if let Some(byte_idx) = title.find(delim) {
            let candidate = title[..byte_idx].trim();
            let char_len = candidate.chars().count();
            if (MIN_DELIMITER_HEAD_LEN..=max_len).contains(&char_len) {
                return candidate.to_string();
            }
        }
    }

    // Word-boundary accumulation: take whole words until the budget is
    // exhausted.
    let mut acc = String::new();
    for word in title.split_whitespace() {
        let candidate_len = if acc.is_empty() {
            word.chars().count()
        } else {
            acc.chars().count() + 1 + word.chars().count()
        };
        if candidate_len > budget {
            break;
        }
        if !acc.is_empty() {
            acc.push(' ');
        }
        acc.push_str(word);
    }
    if !acc.is_empty() {
        return format!("{acc}\u{2026}");
    }

    // Hard truncate as a last resort.
    let cut: String = title.chars().take(budget).collect();
    format!("{cut}\u{2026}")
}

#[cfg(test)]
#[path = "title_tests.rs"]
mod tests;
