// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use super::extract::ValidatedJson;
use crate::{
    auth::{auth_farcaster, auth_wallet, FarcasterAuthRequest, WalletAuthRequest},
    error::{ApiError, ErrorResponse},
    models::{AuthCallbackRequest, AuthInitRequest},
    oauth::{AuthInit, AuthProvider},
    session::Session,
    state::AppState,
};

/// Start an OAuth authorization.
#[utoipa::path(
    post,
    path = "/auth/init",
    request_body = AuthInitRequest,
    tag = "Auth",
    responses(
        (status = 200, body = AuthInit),
        (status = 400, description = "Unknown provider or rejected redirect URI", body = ErrorResponse),
        (status = 503, description = "Too many pending authorizations", body = ErrorResponse)
    )
)]
pub async fn init(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<AuthInitRequest>,
) -> Result<Json<AuthInit>, ApiError> {
    let provider: AuthProvider = request.provider.parse()?;
    let init = state
        .oauth
        .init(provider, &request.app_id, &request.redirect_uri)?;
    Ok(Json(init))
}

/// Complete an OAuth authorization and open the session.
#[utoipa::path(
    post,
    path = "/auth/callback",
    request_body = AuthCallbackRequest,
    tag = "Auth",
    responses(
        (status = 200, body = Session),
        (status = 400, description = "Unknown or consumed state", body = ErrorResponse),
        (status = 401, description = "Authorization request expired", body = ErrorResponse),
        (status = 502, description = "Provider rejected the exchange", body = ErrorResponse)
    )
)]
pub async fn callback(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<AuthCallbackRequest>,
) -> Result<Json<Session>, ApiError> {
    let result = state
        .oauth
        .handle_callback(&request.state, &request.code)
        .await?;
    Ok(Json(result.session))
}

#[utoipa::path(
    post,
    path = "/auth/farcaster",
    request_body = FarcasterAuthRequest,
    tag = "Auth",
    responses(
        (status = 200, body = Session),
        (status = 400, description = "Message does not match the challenge", body = ErrorResponse),
        (status = 401, description = "Signature does not recover the custody address", body = ErrorResponse),
        (status = 403, description = "Custody address does not hold the fid", body = ErrorResponse),
        (status = 502, description = "Farcaster Hub unavailable", body = ErrorResponse)
    )
)]
pub async fn farcaster(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<FarcasterAuthRequest>,
) -> Result<Json<Session>, ApiError> {
    let session = auth_farcaster(
        &state.sessions,
        state.custody_registry.as_deref(),
        &request,
    )
    .await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/auth/wallet",
    request_body = WalletAuthRequest,
    tag = "Auth",
    responses(
        (status = 200, body = Session),
        (status = 400, description = "Malformed address or message", body = ErrorResponse),
        (status = 401, description = "Signature does not recover the address", body = ErrorResponse)
    )
)]
pub async fn wallet(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<WalletAuthRequest>,
) -> Result<Json<Session>, ApiError> {
    let session = auth_wallet(&state.sessions, &request).await?;
    Ok(Json(session))
}
