// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The hub's single error taxonomy.
//!
//! Every component returns `HubError` at its public boundary (or a
//! layer-specific error that implements `From<LayerError> for HubError`)
//! so the facade translates exactly one enum into an HTTP response.

use thiserror::Error;

/// HTTP-status-coupled error taxonomy (spec section "Error Handling Design").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HubError {
    /// Schema/shape violations: invalid mount path, empty env key, base
    /// path outside workspace, oversized secret, malformed SSH PEM,
    /// missing prompt.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown project / chat / artifact.
    #[error("not found: {0}")]
    NotFound(String),

    /// Chat already running; chat not running; project not ready; login
    /// callback without an active session.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing/invalid bearer token or publish token; OpenAI 401/403
    /// during verification.
    #[error("auth failed: {0}")]
    AuthFailed(String),

    /// OpenAI network failure; OAuth callback proxy failure.
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// Filesystem write failure on secrets, or any other internal fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HubError {
    /// The taxonomy's short machine-readable kind, surfaced in the
    /// `{status, kind, message}` error payload.
    pub fn kind(&self) -> &'static str {
        match self {
            HubError::InvalidRequest(_) => "invalid_request",
            HubError::NotFound(_) => "not_found",
            HubError::Conflict(_) => "conflict",
            HubError::AuthFailed(_) => "auth_failed",
            HubError::Upstream(_) => "upstream",
            HubError::Internal(_) => "internal",
        }
    }

    /// The HTTP status this error maps to at the facade boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            HubError::InvalidRequest(_) => 400,
            HubError::NotFound(_) => 404,
            HubError::Conflict(_) => 409,
            HubError::AuthFailed(_) => 401,
            HubError::Upstream(_) => 502,
            HubError::Internal(_) => 500,
        }
    }

    pub fn message(&self) -> String {
        match self {
            HubError::InvalidRequest(m)
            | HubError::NotFound(m)
            | HubError::Conflict(m)
            | HubError::AuthFailed(m)
            | HubError::Upstream(m)
            | HubError::Internal(m) => m.clone(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        HubError::InvalidRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        HubError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        HubError::Conflict(message.into())
    }

    pub fn auth_failed(message: impl Into<String>) -> Self {
        HubError::AuthFailed(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        HubError::Upstream(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        HubError::Internal(message.into())
    }
}

/// Serializable `{status, kind, message}` error payload.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorPayload {
    pub status: u16,
    pub kind: String,
    pub message: String,
}

impl From<&HubError> for ErrorPayload {
    fn from(err: &HubError) -> Self {
        ErrorPayload {
            status: err.http_status(),
            kind: err.kind().to_string(),
            message: err.message(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
