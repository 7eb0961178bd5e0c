// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request and response bodies of the HTTP API that are not domain types.
//!
//! Domain types that cross the wire directly ([`Session`](crate::session::Session),
//! [`TeeAttestation`](crate::tee::TeeAttestation), [`VerifiableCredential`], the
//! wallet and Farcaster requests) are defined next to their logic.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::credentials::VerifiableCredential;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthInitRequest {
    #[schema(example = "google")]
    pub provider: String,
    pub app_id: String,
    #[schema(example = "https://app.example/callback")]
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AuthCallbackRequest {
    pub state: String,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    pub session_id: String,
    /// `0x`-prefixed bytes, or UTF-8 text.
    #[schema(example = "0xdeadbeef")]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifyCredentialRequest {
    pub credential: VerifiableCredential,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerifyCredentialResponse {
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeleteSessionResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AttestationQuery {
    /// Hex data, bound into the quote as `hash("attestation", data)`.
    /// Defaults to the node identity hash.
    pub report_data: Option<String>,
}
