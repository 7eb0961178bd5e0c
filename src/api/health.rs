// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;
use crate::tee::TeeProvider;

/// Readiness response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    /// "ok" or "degraded".
    pub status: String,
    pub node_id: String,
    pub node_address: String,
    pub chain_id: u64,
    /// Identity registry contract, when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_registry: Option<String>,
    pub dev_mode: bool,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthChecks {
    /// External storage gateway ("ok" or "unavailable").
    pub storage: String,
    /// Name-resolution service, when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_resolver: Option<String>,
    /// "initialized", "pending", or "disabled".
    pub threshold: String,
    pub tee: TeeProvider,
    pub active_sessions: usize,
    pub pending_authorizations: usize,
    pub cached_credentials: usize,
}

/// Liveness response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

async fn check_name_resolver(state: &AppState) -> Option<String> {
    let resolver = state.name_resolver.as_ref()?;
    Some(match resolver.is_available(&state.node.node_id).await {
        Ok(_) => "ok".to_string(),
        Err(_) => "unavailable".to_string(),
    })
}

/// Readiness with component checks.
///
/// Returns 503 when the storage gateway is unreachable. The name resolver is
/// informational only.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Storage is unavailable", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let storage_ok = state.storage.is_healthy().await;
    let name_resolver = check_name_resolver(&state).await;

    let threshold = match (&state.coordinator, state.sessions.threshold_ready()) {
        (None, _) => "disabled",
        (Some(_), true) => "initialized",
        (Some(_), false) => "pending",
    };

    let response = ReadyResponse {
        status: if storage_ok { "ok" } else { "degraded" }.to_string(),
        node_id: state.node.node_id.clone(),
        node_address: state.node.address.to_string(),
        chain_id: state.node.chain_id,
        identity_registry: state.node.identity_registry.map(|a| a.to_string()),
        dev_mode: state.node.dev_mode,
        checks: HealthChecks {
            storage: if storage_ok { "ok" } else { "unavailable" }.to_string(),
            name_resolver,
            threshold: threshold.to_string(),
            tee: state.attestor.provider(),
            active_sessions: state.sessions.active_sessions(),
            pending_authorizations: state.oauth.pending_count(),
            cached_credentials: state.credentials.cached_count(),
        },
    };

    let status = if storage_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Liveness check. Always 200 while the process runs.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
