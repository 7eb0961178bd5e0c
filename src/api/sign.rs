// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use super::extract::ValidatedJson;
use crate::{
    crypto::decode_message,
    error::{ApiError, ErrorResponse},
    models::SignRequest,
    session::{validate_session_id, SignResult},
    state::AppState,
};

/// Sign a message with the session's key, or with the threshold cluster once
/// it is initialized.
#[utoipa::path(
    post,
    path = "/sign",
    request_body = SignRequest,
    tag = "Signing",
    responses(
        (status = 200, body = SignResult),
        (status = 400, description = "Empty message or malformed session id", body = ErrorResponse),
        (status = 401, description = "Session has expired", body = ErrorResponse),
        (status = 404, description = "Session is not held by this node", body = ErrorResponse)
    )
)]
pub async fn sign(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SignRequest>,
) -> Result<Json<SignResult>, ApiError> {
    if request.message.is_empty() {
        return Err(ApiError::bad_request("message is required"));
    }
    validate_session_id(&request.session_id)?;
    let message = decode_message(&request.message);
    let result = state.sessions.sign(&request.session_id, &message).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::recover_personal_sign;
    use crate::oauth::AuthProvider;
    use crate::session::SessionRequest;
    use crate::state::testing;
    use crate::tee::TeeProvider;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn signs_hex_message_with_session_key() {
        let (state, _clock) = testing::state();
        let session = state
            .sessions
            .create_session(SessionRequest {
                provider: AuthProvider::Google,
                provider_id: "1234567890".to_string(),
                handle: None,
                app_id: "demo-app".to_string(),
                session_id: None,
                smart_account: None,
            })
            .await
            .unwrap();

        let Json(result) = sign(
            State(state.clone()),
            ValidatedJson(SignRequest {
                session_id: session.session_id.clone(),
                message: "0xdeadbeef".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(result.signature.len(), 65);
        assert_eq!(result.attestation.provider, TeeProvider::Simulated);

        let signer = recover_personal_sign(
            &[0xde, 0xad, 0xbe, 0xef],
            &alloy::hex::encode_prefixed(&result.signature),
        )
        .unwrap();
        let expected = alloy::primitives::Address::from_raw_public_key(
            &alloy::hex::decode(&session.signing_public_key).unwrap()[1..],
        );
        assert_eq!(signer, expected);
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let (state, _clock) = testing::state();
        let err = sign(
            State(state),
            ValidatedJson(SignRequest {
                session_id: format!("0x{}", "00".repeat(32)),
                message: String::new(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let (state, _clock) = testing::state();
        let err = sign(
            State(state),
            ValidatedJson(SignRequest {
                session_id: format!("0x{}", "00".repeat(32)),
                message: "hello".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_session_id_is_rejected() {
        let (state, _clock) = testing::state();
        let err = sign(
            State(state),
            ValidatedJson(SignRequest {
                session_id: "missing".to_string(),
                message: "hello".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
