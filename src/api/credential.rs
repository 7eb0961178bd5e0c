// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::extract::ValidatedJson;
use crate::{
    credentials::{IssueCredentialRequest, VerifiableCredential},
    error::{ApiError, ErrorResponse},
    models::{VerifyCredentialRequest, VerifyCredentialResponse},
    state::AppState,
};

/// Issue an identity credential for a live session, signed by the node key.
#[utoipa::path(
    post,
    path = "/credential/issue",
    request_body = IssueCredentialRequest,
    tag = "Credentials",
    responses(
        (status = 201, body = VerifiableCredential),
        (status = 400, description = "Malformed wallet address or provider id", body = ErrorResponse),
        (status = 401, description = "Session has expired", body = ErrorResponse),
        (status = 403, description = "Identity or wallet is not the session's own", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn issue_credential(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<IssueCredentialRequest>,
) -> Result<(StatusCode, Json<VerifiableCredential>), ApiError> {
    let credential = state.credentials.issue(&request).await?;
    Ok((StatusCode::CREATED, Json(credential)))
}

/// A credential is valid when it is unexpired, was issued by this node and
/// its proof recovers the node address.
#[utoipa::path(
    post,
    path = "/credential/verify",
    request_body = VerifyCredentialRequest,
    tag = "Credentials",
    responses((status = 200, body = VerifyCredentialResponse))
)]
pub async fn verify_credential(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<VerifyCredentialRequest>,
) -> Json<VerifyCredentialResponse> {
    Json(VerifyCredentialResponse {
        valid: state.credentials.verify(&request.credential),
    })
}

#[utoipa::path(
    get,
    path = "/credential/{credential_id}",
    params(("credential_id" = String, Path, description = "Credential id (urn:uuid:...)")),
    tag = "Credentials",
    responses(
        (status = 200, body = VerifiableCredential),
        (status = 404, description = "Not in this node's cache", body = ErrorResponse)
    )
)]
pub async fn get_credential(
    Path(credential_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<VerifiableCredential>, ApiError> {
    state
        .credentials
        .cached(&credential_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("credential {credential_id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::AuthProvider;
    use crate::session::SessionRequest;
    use crate::state::testing;
    use std::time::Duration;

    const WALLET: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12";

    async fn issue(state: &AppState) -> VerifiableCredential {
        let session = state
            .sessions
            .create_session(SessionRequest {
                provider: AuthProvider::Discord,
                provider_id: "80351110224678912".to_string(),
                handle: Some("nelly".to_string()),
                app_id: "demo-app".to_string(),
                session_id: None,
                smart_account: Some(WALLET.parse().unwrap()),
            })
            .await
            .unwrap();

        let (status, Json(credential)) = issue_credential(
            State(state.clone()),
            ValidatedJson(IssueCredentialRequest {
                session_id: session.session_id,
                provider: AuthProvider::Discord,
                provider_id: "80351110224678912".to_string(),
                provider_handle: Some("nelly".to_string()),
                wallet_address: WALLET.to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        credential
    }

    async fn verify(
        state: &AppState,
        credential: VerifiableCredential,
    ) -> Json<VerifyCredentialResponse> {
        verify_credential(
            State(state.clone()),
            ValidatedJson(VerifyCredentialRequest { credential }),
        )
        .await
    }

    #[tokio::test]
    async fn issued_credential_verifies_until_expiry() {
        let (state, clock) = testing::state();
        let credential = issue(&state).await;

        let Json(response) = verify(&state, credential.clone()).await;
        assert!(response.valid);

        clock.advance(Duration::from_secs(366 * 24 * 60 * 60));
        let Json(response) = verify(&state, credential).await;
        assert!(!response.valid);
    }

    #[tokio::test]
    async fn tampered_subject_fails_verification() {
        let (state, _clock) = testing::state();
        let mut credential = issue(&state).await;
        credential.credential_subject.provider_id = "someone-else".to_string();

        let Json(response) = verify(&state, credential).await;
        assert!(!response.valid);
    }

    #[tokio::test]
    async fn issued_credential_is_served_from_cache() {
        let (state, _clock) = testing::state();
        let credential = issue(&state).await;

        let Json(cached) = get_credential(Path(credential.id.clone()), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(cached, credential);

        let err = get_credential(Path("urn:uuid:missing".to_string()), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_session_cannot_issue() {
        let (state, _clock) = testing::state();
        let err = issue_credential(
            State(state),
            ValidatedJson(IssueCredentialRequest {
                session_id: format!("0x{}", "00".repeat(32)),
                provider: AuthProvider::Github,
                provider_id: "583231".to_string(),
                provider_handle: None,
                wallet_address: WALLET.to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wallet_session_cannot_issue_for_an_oauth_subject() {
        let (state, _clock) = testing::state();
        let signer = crate::crypto::SessionKey::generate();
        let session = state
            .sessions
            .create_session(SessionRequest {
                provider: AuthProvider::Wallet,
                provider_id: signer.address().to_string().to_lowercase(),
                handle: None,
                app_id: "demo-app".to_string(),
                session_id: None,
                smart_account: Some(signer.address()),
            })
            .await
            .unwrap();

        let err = issue_credential(
            State(state.clone()),
            ValidatedJson(IssueCredentialRequest {
                session_id: session.session_id,
                provider: AuthProvider::Google,
                provider_id: "victim-sub".to_string(),
                provider_handle: Some("victim".to_string()),
                wallet_address: signer.address().to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.error_code, "forbidden");
        assert_eq!(state.credentials.cached_count(), 0);
    }
}
