// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::{ApiError, ErrorResponse},
    models::DeleteSessionResponse,
    session::{validate_session_id, Session},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/session/{session_id}",
    params(("session_id" = String, Path, description = "Session identifier")),
    tag = "Sessions",
    responses(
        (status = 200, body = Session),
        (status = 400, description = "Malformed session id", body = ErrorResponse),
        (status = 401, description = "Session has expired", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn get_session(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Session>, ApiError> {
    validate_session_id(&session_id)?;
    let session = state.sessions.get_session(&session_id).await?;
    Ok(Json(session))
}

/// Extend the session and rotate its signing key.
#[utoipa::path(
    post,
    path = "/session/{session_id}/refresh",
    params(("session_id" = String, Path, description = "Session identifier")),
    tag = "Sessions",
    responses(
        (status = 200, body = Session),
        (status = 400, description = "Malformed session id", body = ErrorResponse),
        (status = 401, description = "Session has expired", body = ErrorResponse),
        (status = 404, description = "Session is not held by this node", body = ErrorResponse)
    )
)]
pub async fn refresh_session(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Session>, ApiError> {
    validate_session_id(&session_id)?;
    let session = state.sessions.refresh_session(&session_id).await?;
    Ok(Json(session))
}

/// Idempotent.
#[utoipa::path(
    delete,
    path = "/session/{session_id}",
    params(("session_id" = String, Path, description = "Session identifier")),
    tag = "Sessions",
    responses(
        (status = 200, body = DeleteSessionResponse),
        (status = 400, description = "Malformed session id", body = ErrorResponse),
        (status = 502, description = "Storage gateway unavailable", body = ErrorResponse)
    )
)]
pub async fn delete_session(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DeleteSessionResponse>, ApiError> {
    validate_session_id(&session_id)?;
    state.sessions.delete_session(&session_id).await?;
    Ok(Json(DeleteSessionResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::AuthProvider;
    use crate::session::{SessionRequest, SESSION_TTL};
    use crate::state::testing;
    use axum::http::StatusCode;

    async fn open(state: &AppState) -> Session {
        state
            .sessions
            .create_session(SessionRequest {
                provider: AuthProvider::Github,
                provider_id: "583231".to_string(),
                handle: Some("octocat".to_string()),
                app_id: "demo-app".to_string(),
                session_id: None,
                smart_account: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn get_returns_public_projection() {
        let (state, _clock) = testing::state();
        let session = open(&state).await;

        let Json(fetched) = get_session(Path(session.session_id.clone()), State(state))
            .await
            .unwrap();
        assert_eq!(fetched, session);
    }

    #[tokio::test]
    async fn get_expired_session_is_unauthorized() {
        let (state, clock) = testing::state();
        let session = open(&state).await;
        clock.advance(SESSION_TTL);

        let err = get_session(Path(session.session_id), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.error_code, "expired");
        assert_eq!(state.sessions.active_sessions(), 0);
    }

    #[tokio::test]
    async fn refresh_rotates_key_and_extends_expiry() {
        let (state, _clock) = testing::state();
        let session = open(&state).await;

        let Json(refreshed) =
            refresh_session(Path(session.session_id.clone()), State(state))
                .await
                .unwrap();
        assert!(refreshed.expires_at > session.expires_at);
        assert_ne!(refreshed.signing_public_key, session.signing_public_key);
    }

    #[tokio::test]
    async fn delete_twice_succeeds() {
        let (state, _clock) = testing::state();
        let session = open(&state).await;

        for _ in 0..2 {
            let Json(response) =
                delete_session(Path(session.session_id.clone()), State(state.clone()))
                    .await
                    .unwrap();
            assert!(response.success);
        }
        let err = get_session(Path(session.session_id), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_session_ids_never_reach_storage() {
        let (state, _clock) = testing::state();
        let traversal = "../credentials/urn:uuid:victim".to_string();

        let err = delete_session(Path(traversal.clone()), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = get_session(Path(traversal.clone()), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = refresh_session(Path(traversal), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
