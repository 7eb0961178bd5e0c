// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Verifiable Credentials
//!
//! W3C-style credentials binding a provider identity to a wallet address,
//! signed with the node identity key.
//!
//! ## Proof
//!
//! `proofValue = sign(keccak256(json(credential with proofValue = "")))`
//!
//! The JSON is the serde encoding of [`VerifiableCredential`], whose field
//! order is fixed by the struct definition, so issuer and verifier hash the
//! same bytes.

pub mod cache;
pub mod issuer;

pub use cache::CredentialCache;
pub use issuer::{CredentialIssuer, IssueCredentialRequest, CREDENTIAL_TTL_DAYS};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const VC_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const VC_TYPE: &str = "VerifiableCredential";
pub const OAUTH3_TYPE: &str = "OAuth3IdentityCredential";
pub const PROOF_TYPE: &str = "EcdsaSecp256k1Signature2019";
pub const PROOF_PURPOSE: &str = "assertionMethod";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CredentialIssuerRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSubject {
    pub id: String,
    pub provider: String,
    pub provider_id: String,
    pub provider_handle: Option<String>,
    pub wallet_address: String,
    pub verified_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialProof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub created: String,
    pub verification_method: String,
    pub proof_purpose: String,
    /// 65-byte signature (hex); empty while hashing.
    pub proof_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub id: String,
    pub issuer: CredentialIssuerRef,
    /// RFC 3339.
    pub issuance_date: String,
    /// RFC 3339.
    pub expiration_date: String,
    pub credential_subject: CredentialSubject,
    pub proof: CredentialProof,
}
