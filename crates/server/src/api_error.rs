// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single place `HubError` (and every layer error that converts
//! into it) becomes an HTTP response (spec §7, §4.I): one enum
//! translated once, at the facade boundary, matching the propagation
//! policy that validation/authorization errors are surfaced verbatim.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use agent_hub_core::{ErrorPayload, HubError};

pub struct ApiError(pub HubError);

impl From<HubError> for ApiError {
    fn from(err: HubError) -> Self {
        Self(err)
    }
}

impl From<agent_hub_engine::ChatSupervisorError> for ApiError {
    fn from(err: agent_hub_engine::ChatSupervisorError) -> Self {
        Self(err.into())
    }
}

impl From<agent_hub_engine::AgentToolsError> for ApiError {
    fn from(err: agent_hub_engine::AgentToolsError) -> Self {
        Self(err.into())
    }
}

impl From<agent_hub_adapters::CredentialVaultError> for ApiError {
    fn from(err: agent_hub_adapters::CredentialVaultError) -> Self {
        use agent_hub_adapters::CredentialVaultError as E;
        let mapped = match err {
            E::Validation(m) => HubError::invalid_request(m),
            E::VerifyUnauthorized => HubError::auth_failed("openai rejected the provided key"),
            E::VerifyTransport(e) => HubError::upstream(e.to_string()),
            E::Io(e) => HubError::internal(e.to_string()),
        };
        Self(mapped)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = ErrorPayload::from(&self.0);
        let status = StatusCode::from_u16(payload.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(payload)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
