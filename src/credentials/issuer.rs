// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential issuance and verification.

use std::sync::Arc;

use alloy::primitives::{keccak256, Signature, B256};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::{
    CredentialCache, CredentialIssuerRef, CredentialProof, CredentialSubject,
    VerifiableCredential, OAUTH3_TYPE, PROOF_PURPOSE, PROOF_TYPE, VC_CONTEXT, VC_TYPE,
};
use crate::auth::parse_address;
use crate::clock::Clock;
use crate::crypto::NodeIdentity;
use crate::error::{AgentError, AgentResult};
use crate::oauth::AuthProvider;
use crate::session::{identity_id, validate_session_id, SessionCapability, SessionEngine};
use crate::storage::SessionStorage;

pub const CREDENTIAL_TTL_DAYS: i64 = 365;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredentialRequest {
    pub session_id: String,
    pub provider: AuthProvider,
    pub provider_id: String,
    pub provider_handle: Option<String>,
    pub wallet_address: String,
}

pub struct CredentialIssuer {
    identity: NodeIdentity,
    chain_id: u64,
    node_name: String,
    sessions: Arc<SessionEngine>,
    storage: Arc<dyn SessionStorage>,
    clock: Arc<dyn Clock>,
    cache: CredentialCache,
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `keccak256` of the credential's JSON with an empty `proofValue`.
pub fn canonical_hash(credential: &VerifiableCredential) -> AgentResult<B256> {
    let mut unsigned = credential.clone();
    unsigned.proof.proof_value.clear();
    let bytes = serde_json::to_vec(&unsigned)
        .map_err(|e| AgentError::Internal(format!("credential encoding failed: {e}")))?;
    Ok(keccak256(bytes))
}

impl CredentialIssuer {
    pub fn new(
        identity: NodeIdentity,
        chain_id: u64,
        node_name: impl Into<String>,
        sessions: Arc<SessionEngine>,
        storage: Arc<dyn SessionStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identity,
            chain_id,
            node_name: node_name.into(),
            sessions,
            storage,
            clock,
            cache: CredentialCache::default(),
        }
    }

    pub fn issuer_did(&self) -> String {
        self.identity.did(self.chain_id)
    }

    pub fn cached(&self, credential_id: &str) -> Option<VerifiableCredential> {
        self.cache.get(credential_id)
    }

    pub fn cached_count(&self) -> usize {
        self.cache.cached_count()
    }

    /// Issue a credential binding the session's own identity to the
    /// session's own account. The request may only restate them.
    pub async fn issue(&self, request: &IssueCredentialRequest) -> AgentResult<VerifiableCredential> {
        validate_session_id(&request.session_id)?;
        let wallet = parse_address("walletAddress", &request.wallet_address)?;
        if request.provider_id.trim().is_empty() {
            return Err(AgentError::validation("providerId is required"));
        }

        let session = self.sessions.get_session(&request.session_id).await?;
        if !session
            .capabilities
            .contains(&SessionCapability::IssueCredential)
        {
            return Err(AgentError::validation(
                "session may not issue credentials",
            ));
        }
        if session.identity_id != identity_id(request.provider, &request.provider_id) {
            warn!(
                session_id = %request.session_id,
                provider = request.provider.as_str(),
                "Credential requested for an identity the session does not hold"
            );
            return Err(AgentError::Forbidden(
                "provider identity does not belong to this session".to_string(),
            ));
        }
        if session.smart_account != wallet {
            return Err(AgentError::Forbidden(
                "walletAddress is not this session's account".to_string(),
            ));
        }

        let now = self.clock.now_utc();
        let issuer = self.issuer_did();
        let mut credential = VerifiableCredential {
            context: vec![VC_CONTEXT.to_string()],
            types: vec![VC_TYPE.to_string(), OAUTH3_TYPE.to_string()],
            id: format!("urn:uuid:{}", uuid::Uuid::new_v4()),
            issuer: CredentialIssuerRef {
                id: issuer.clone(),
                name: self.node_name.clone(),
            },
            issuance_date: rfc3339(now),
            expiration_date: rfc3339(now + Duration::days(CREDENTIAL_TTL_DAYS)),
            credential_subject: CredentialSubject {
                id: format!("did:ethr:{}:{wallet}", self.chain_id),
                provider: request.provider.as_str().to_string(),
                provider_id: request.provider_id.clone(),
                provider_handle: request.provider_handle.clone(),
                wallet_address: wallet.to_string(),
                verified_at: rfc3339(now),
            },
            proof: CredentialProof {
                proof_type: PROOF_TYPE.to_string(),
                created: rfc3339(now),
                verification_method: format!("{issuer}#controller"),
                proof_purpose: PROOF_PURPOSE.to_string(),
                proof_value: String::new(),
            },
        };

        let hash = canonical_hash(&credential)?;
        let signature = self.identity.sign_hash(&hash)?;
        credential.proof.proof_value = alloy::hex::encode_prefixed(signature);

        self.storage.store_credential(&credential).await?;
        self.cache.put(credential.clone());

        info!(
            credential_id = %credential.id,
            session_id = %request.session_id,
            provider = request.provider.as_str(),
            "Credential issued"
        );
        Ok(credential)
    }

    /// `true` only for an unexpired credential issued and signed by this node.
    pub fn verify(&self, credential: &VerifiableCredential) -> bool {
        match self.check(credential) {
            Ok(()) => true,
            Err(reason) => {
                debug!(credential_id = %credential.id, reason, "Credential failed verification");
                false
            }
        }
    }

    fn check(&self, credential: &VerifiableCredential) -> Result<(), &'static str> {
        let expires = DateTime::parse_from_rfc3339(&credential.expiration_date)
            .map_err(|_| "unparseable expirationDate")?;
        if self.clock.now_utc() >= expires {
            return Err("expired");
        }
        if credential.issuer.id != self.issuer_did() {
            return Err("foreign issuer");
        }
        if credential.proof.proof_type != PROOF_TYPE {
            return Err("unknown proof type");
        }

        let bytes = alloy::hex::decode(&credential.proof.proof_value)
            .map_err(|_| "proofValue is not hex")?;
        let signature =
            Signature::try_from(bytes.as_slice()).map_err(|_| "proofValue is not a signature")?;
        let hash = canonical_hash(credential).map_err(|_| "unencodable credential")?;
        let signer = signature
            .recover_address_from_prehash(&hash)
            .map_err(|_| "unrecoverable signature")?;

        if signer != self.identity.address() {
            return Err("signer is not this node");
        }
        Ok(())
    }
}
