// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relative-path normalization for published artifacts.
//!
//! Every artifact is published at a caller-supplied relative path
//! underneath a project's artifact root. The path must never escape
//! that root, so it is normalized and rejected rather than resolved
//! against the filesystem (which would let a symlink or `..` segment
//! walk out of the sandbox).

const MAX_PATH_LEN: usize = 512;
const MAX_SEGMENT_LEN: usize = 255;

/// Normalize and validate a caller-supplied artifact relative path.
///
/// Backslashes are treated as path separators (Windows-style input is
/// common from agent tool calls). Returns the normalized forward-slash
/// path, or an error describing why the path is rejected.
pub fn normalize_artifact_path(raw: &str) -> Result<String, String> {
    let unified = raw.replace('\\', "/");
    let trimmed = unified.trim();

    if trimmed.is_empty() {
        return Err("artifact path must not be empty".to_string());
    }
    if trimmed.len() > MAX_PATH_LEN {
        return Err(format!("artifact path exceeds {MAX_PATH_LEN} characters"));
    }
    if trimmed.starts_with('/') {
        return Err("artifact path must be relative".to_string());
    }

    let mut segments = Vec::new();
    for segment in trimmed.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            return Err("artifact path must not contain '..'".to_string());
        }
        if segment.len() > MAX_SEGMENT_LEN {
            return Err(format!("path segment exceeds {MAX_SEGMENT_LEN} characters"));
        }
        if segment.contains('\0') {
            return Err("artifact path must not contain null bytes".to_string());
        }
        segments.push(segment);
    }

    if segments.is_empty() {
        return Err("artifact path must not be empty".to_string());
    }

    Ok(segments.join("/"))
}

/// Normalize a display name for an artifact (the leaf name shown in
/// listings), rejecting path separators and control characters. Names
/// longer than [`MAX_SEGMENT_LEN`] are truncated with an ellipsis
/// rather than rejected (spec §4.G: "oversize names and paths are
/// truncated to their caps").
pub fn normalize_artifact_name(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("artifact name must not be empty".to_string());
    }
    if trimmed.contains(['/', '\\']) || trimmed.chars().any(char::is_control) {
        return Err("artifact name must not contain path separators or control characters".to_string());
    }
    if trimmed.chars().count() > MAX_SEGMENT_LEN {
        let head: String = trimmed.chars().take(MAX_SEGMENT_LEN.saturating_sub(1)).collect();
        return Ok(format!("{}\u{2026}", head.trim_end()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "artifact_path_tests.rs"]
mod tests;
