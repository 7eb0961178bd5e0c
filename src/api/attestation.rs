// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    crypto::hash_parts,
    error::{ApiError, ErrorResponse},
    models::AttestationQuery,
    state::AppState,
    tee::TeeAttestation,
};

/// Attest caller-supplied data.
///
/// `reportData` is bound as `hash("attestation", data)`, never verbatim, so
/// this endpoint cannot mint a quote that passes for a session or signing
/// attestation. Without `reportData` the node identity hash is attested.
#[utoipa::path(
    get,
    path = "/attestation",
    params(AttestationQuery),
    tag = "Attestation",
    responses(
        (status = 200, body = TeeAttestation),
        (status = 400, description = "reportData is not hex", body = ErrorResponse),
        (status = 502, description = "TEE backend unavailable", body = ErrorResponse)
    )
)]
pub async fn get_attestation(
    State(state): State<AppState>,
    Query(query): Query<AttestationQuery>,
) -> Result<Json<TeeAttestation>, ApiError> {
    let binding = match query.report_data.as_deref() {
        Some(raw) => {
            let data = alloy::hex::decode(raw)
                .map_err(|_| ApiError::bad_request("reportData must be hex"))?;
            Some(hash_parts(&[b"attestation", &data]))
        }
        None => None,
    };
    let attestation = state
        .attestor
        .get_attestation(binding.as_ref().map(|hash| hash.as_slice()))
        .await?;
    Ok(Json(attestation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::AuthProvider;
    use crate::session::SessionRequest;
    use crate::state::testing;
    use crate::tee::TeeProvider;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn attests_domain_tagged_report_data() {
        let (state, _clock) = testing::state();
        let Json(attestation) = get_attestation(
            State(state),
            Query(AttestationQuery {
                report_data: Some("0xdeadbeef".to_string()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(attestation.provider, TeeProvider::Simulated);
        assert!(!attestation.verified);
        let expected = hash_parts(&[b"attestation", &[0xde_u8, 0xad, 0xbe, 0xef]]);
        assert_eq!(attestation.report_data.as_ref(), expected.as_slice());
    }

    #[tokio::test]
    async fn session_binding_cannot_be_replayed_through_caller_data() {
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
        let session_binding = hash_parts(&[
            b"session",
            session.session_id.as_bytes(),
            session.signing_public_key.as_bytes(),
        ]);
        assert_eq!(
            session.attestation.report_data.as_ref(),
            session_binding.as_slice()
        );

        let Json(attestation) = get_attestation(
            State(state),
            Query(AttestationQuery {
                report_data: Some(session_binding.to_string()),
            }),
        )
        .await
        .unwrap();
        assert_ne!(
            attestation.report_data.as_ref(),
            session_binding.as_slice()
        );
    }

    #[tokio::test]
    async fn defaults_to_node_identity_hash() {
        let (state, _clock) = testing::state();
        let expected = alloy::primitives::keccak256(state.node.address);
        let Json(attestation) =
            get_attestation(State(state), Query(AttestationQuery { report_data: None }))
                .await
                .unwrap();
        assert_eq!(attestation.report_data.as_ref(), expected.as_slice());
    }

    #[tokio::test]
    async fn rejects_non_hex_report_data() {
        let (state, _clock) = testing::state();
        let err = get_attestation(
            State(state),
            Query(AttestationQuery {
                report_data: Some("not-hex".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code, "validation_error");
    }
}
