// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{self, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{FarcasterAuthRequest, WalletAuthRequest},
    config::CorsOrigins,
    credentials::{
        CredentialIssuerRef, CredentialProof, CredentialSubject, IssueCredentialRequest,
        VerifiableCredential,
    },
    error::ErrorResponse,
    models::{
        AuthCallbackRequest, AuthInitRequest, DeleteSessionResponse, SignRequest,
        VerifyCredentialRequest, VerifyCredentialResponse,
    },
    oauth::{AuthInit, AuthProvider},
    session::{Session, SessionCapability, SignResult},
    state::AppState,
    tee::{TeeAttestation, TeeProvider},
};

pub mod attestation;
pub mod auth;
pub mod credential;
pub mod extract;
pub mod health;
pub mod session;
pub mod sign;

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors);

    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/attestation", get(attestation::get_attestation))
        .route("/auth/init", post(auth::init))
        .route("/auth/callback", post(auth::callback))
        .route("/auth/farcaster", post(auth::farcaster))
        .route("/auth/wallet", post(auth::wallet))
        .route(
            "/session/{session_id}",
            get(session::get_session).delete(session::delete_session),
        )
        .route(
            "/session/{session_id}/refresh",
            post(session::refresh_session),
        )
        .route("/sign", post(sign::sign))
        .route("/credential/issue", post(credential::issue_credential))
        .route("/credential/verify", post(credential::verify_credential))
        .route("/credential/{credential_id}", get(credential::get_credential))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    match origins {
        CorsOrigins::Any => CorsLayer::new()
            .allow_origin(cors::Any)
            .allow_methods(cors::Any)
            .allow_headers(cors::Any),
        CorsOrigins::List(list) => {
            let allowed: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match origin.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(origin = %origin, "Ignoring unparseable CORS origin");
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "OAuth3 Auth Agent",
        description = "TEE-attested sessions, threshold signing and identity credentials"
    ),
    paths(
        health::health,
        health::liveness,
        attestation::get_attestation,
        auth::init,
        auth::callback,
        auth::farcaster,
        auth::wallet,
        session::get_session,
        session::refresh_session,
        session::delete_session,
        sign::sign,
        credential::issue_credential,
        credential::verify_credential,
        credential::get_credential
    ),
    components(
        schemas(
            AuthProvider,
            AuthInitRequest,
            AuthInit,
            AuthCallbackRequest,
            FarcasterAuthRequest,
            WalletAuthRequest,
            Session,
            SessionCapability,
            DeleteSessionResponse,
            TeeAttestation,
            TeeProvider,
            SignRequest,
            SignResult,
            IssueCredentialRequest,
            VerifiableCredential,
            CredentialIssuerRef,
            CredentialSubject,
            CredentialProof,
            VerifyCredentialRequest,
            VerifyCredentialResponse,
            ErrorResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Attestation", description = "TEE quotes"),
        (name = "Auth", description = "OAuth, wallet and Farcaster sign-in"),
        (name = "Sessions", description = "Attested session lifecycle"),
        (name = "Signing", description = "Session and threshold signing"),
        (name = "Credentials", description = "Verifiable identity credentials")
    )
)]
struct ApiDoc;
