// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Internal and public session representations.
//!
//! [`InternalSession`] owns the signing key and deliberately implements
//! neither `Serialize` nor `Clone`. [`Session`] has no field for key material
//! at all; [`InternalSession::to_public`] is the only way to obtain one from
//! a live session.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::store::Expiring;
use crate::crypto::SessionKey;
use crate::tee::TeeAttestation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionCapability {
    SignMessage,
    IssueCredential,
}

impl SessionCapability {
    pub fn defaults() -> Vec<SessionCapability> {
        vec![SessionCapability::SignMessage, SessionCapability::IssueCredential]
    }
}

/// Authoritative session record. Process memory only.
#[derive(Debug)]
pub struct InternalSession {
    pub session_id: String,
    pub identity_id: String,
    pub smart_account: Address,
    pub expires_at: u64,
    pub capabilities: Vec<SessionCapability>,
    pub signing_key: SessionKey,
    pub signing_public_key: String,
    pub attestation: TeeAttestation,
}

impl InternalSession {
    /// The public projection. Pure and total.
    pub fn to_public(&self) -> Session {
        Session {
            session_id: self.session_id.clone(),
            identity_id: self.identity_id.clone(),
            smart_account: self.smart_account,
            expires_at: self.expires_at,
            capabilities: self.capabilities.clone(),
            signing_public_key: self.signing_public_key.clone(),
            attestation: self.attestation.clone(),
        }
    }

    pub fn can(&self, capability: SessionCapability) -> bool {
        self.capabilities.contains(&capability)
    }
}

impl Expiring for InternalSession {
    fn expires_at(&self) -> u64 {
        self.expires_at
    }
}

/// Session as seen outside the enclave process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub identity_id: String,
    #[schema(value_type = String, example = "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12")]
    pub smart_account: Address,
    /// Unix milliseconds.
    pub expires_at: u64,
    pub capabilities: Vec<SessionCapability>,
    /// Uncompressed secp256k1 public key (hex).
    pub signing_public_key: String,
    pub attestation: TeeAttestation,
}

impl Expiring for Session {
    fn expires_at(&self) -> u64 {
        self.expires_at
    }
}
