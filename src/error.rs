// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error types.
//!
//! [`AgentError`] is the domain error returned by the session engine, the
//! OAuth flow, the alternate auth handlers and the credential issuer.
//! [`ApiError`] is its HTTP rendering: every error response carries a
//! machine-readable `error_code`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::oauth::AuthProvider;

/// Domain error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Malformed input, bad redirect URI, bad address.
    #[error("{0}")]
    Validation(String),

    /// Unknown OAuth `state` (never issued, or already consumed).
    #[error("Invalid or already used OAuth state")]
    InvalidState,

    /// Sign-in message does not match the expected challenge.
    #[error("Invalid sign-in message: {0}")]
    InvalidMessage(String),

    /// Signature does not recover the claimed address.
    #[error("Signature verification failed: {0}")]
    InvalidSignature(String),

    /// The session is live but does not own the requested subject.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Pending authorization or session past its deadline.
    #[error("{0} has expired")]
    Expired(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Missing or invalid secret/key outside development.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// OAuth provider, TEE backend, coordinator or storage failure.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Key material about to cross the session boundary, or an untrusted
    /// attestation in a context that requires a verified one.
    #[error("Security invariant violated: {0}")]
    SecurityInvariant(String),

    /// Bounded store is full.
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgentError {
    pub fn validation(message: impl Into<String>) -> Self {
        AgentError::Validation(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        AgentError::Upstream(message.into())
    }

    pub fn unsupported(provider: AuthProvider) -> Self {
        AgentError::UnsupportedProvider(provider.as_str().to_string())
    }

    /// Machine-readable reason included in every error response.
    pub fn error_code(&self) -> &'static str {
        match self {
            AgentError::Validation(_) => "validation_error",
            AgentError::InvalidState => "invalid_state",
            AgentError::InvalidMessage(_) => "invalid_message",
            AgentError::InvalidSignature(_) => "invalid_signature",
            AgentError::Forbidden(_) => "forbidden",
            AgentError::NotFound(_) => "not_found",
            AgentError::Expired(_) => "expired",
            AgentError::UnsupportedProvider(_) => "unsupported_provider",
            AgentError::Configuration(_) => "configuration_error",
            AgentError::Upstream(_) => "upstream_error",
            AgentError::SecurityInvariant(_) => "security_invariant_violation",
            AgentError::CapacityExceeded(_) => "capacity_exceeded",
            AgentError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AgentError::Validation(_)
            | AgentError::InvalidState
            | AgentError::InvalidMessage(_)
            | AgentError::UnsupportedProvider(_) => StatusCode::BAD_REQUEST,
            AgentError::InvalidSignature(_) | AgentError::Expired(_) => StatusCode::UNAUTHORIZED,
            AgentError::Forbidden(_) => StatusCode::FORBIDDEN,
            AgentError::NotFound(_) => StatusCode::NOT_FOUND,
            AgentError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AgentError::CapacityExceeded(_) => StatusCode::SERVICE_UNAVAILABLE,
            AgentError::Configuration(_)
            | AgentError::SecurityInvariant(_)
            | AgentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result alias for domain operations.
pub type AgentResult<T> = Result<T, AgentError>;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error_code: &'static str,
    pub message: String,
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[schema(example = "invalid_state")]
    pub error_code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error_code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        // Internal details of configuration and invariant failures stay in the logs.
        let message = match &err {
            AgentError::Configuration(_) | AgentError::Internal(_) => {
                tracing::error!(error = %err, "Request failed");
                "Service is misconfigured or unavailable".to_string()
            }
            AgentError::SecurityInvariant(_) => {
                tracing::error!(error = %err, "Security invariant violation, request aborted");
                "Request aborted by a security check".to_string()
            }
            _ => err.to_string(),
        };
        Self::new(err.status_code(), err.error_code(), message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
            error_code: self.error_code.to_string(),
        });
        (self.status, body).into_response()
    }
}
