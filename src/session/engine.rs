// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Engine
//!
//! Mints, refreshes, deletes and signs with attested sessions.
//!
//! | Operation | Local table | External storage |
//! |-----------|-------------|------------------|
//! | create | insert (absent) | write projection |
//! | get | read, drop if expired | read-only fallback |
//! | refresh | replace (present), after the write | overwrite projection |
//! | delete | remove, before the delete | delete |
//! | sign | read | - |
//!
//! Every cryptographic result (key, attestation, signature) is obtained
//! before the local table is touched, so a cancelled request leaves no
//! partial record behind.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{keccak256, Address, Bytes};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use super::store::{BoundedStore, Expiring, InsertError};
use super::types::{InternalSession, Session, SessionCapability};
use crate::clock::Clock;
use crate::crypto::{hash_parts, random_bytes, SessionKey};
use crate::error::{AgentError, AgentResult};
use crate::oauth::AuthProvider;
use crate::storage::SessionStorage;
use crate::tee::{AttestationProvider, TeeAttestation};
use crate::threshold::ThresholdCoordinator;

pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const MAX_SESSIONS: usize = 100_000;

/// Who the session is for.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub provider: AuthProvider,
    pub provider_id: String,
    pub handle: Option<String>,
    pub app_id: String,
    /// Pre-allocated id (OAuth init hands one to the client).
    pub session_id: Option<String>,
    /// Address the session acts for; derived from the identity when absent.
    pub smart_account: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignResult {
    /// 65-byte `r || s || v` (hex).
    #[schema(value_type = String)]
    pub signature: Bytes,
    pub attestation: TeeAttestation,
}

pub struct SessionEngine {
    sessions: BoundedStore<InternalSession>,
    storage: Arc<dyn SessionStorage>,
    attestor: Arc<AttestationProvider>,
    coordinator: Option<Arc<dyn ThresholdCoordinator>>,
    clock: Arc<dyn Clock>,
    require_verified: bool,
}

/// `hash_parts(provider, providerId)`, hex.
pub fn identity_id(provider: AuthProvider, provider_id: &str) -> String {
    hash_parts(&[provider.as_str().as_bytes(), provider_id.as_bytes()]).to_string()
}

/// Deterministic account address for identities that bring none.
fn derived_account(identity_id: &str) -> Address {
    Address::from_word(hash_parts(&[b"smart-account", identity_id.as_bytes()]))
}

/// Reject anything that is not a `0x`-prefixed 32-byte hex id.
pub fn validate_session_id(raw: &str) -> AgentResult<()> {
    let well_formed = raw.len() == 66
        && raw.starts_with("0x")
        && raw[2..].bytes().all(|b| b.is_ascii_hexdigit());
    if well_formed {
        Ok(())
    } else {
        Err(AgentError::validation("sessionId must be 0x followed by 64 hex digits"))
    }
}

/// `hash_parts(seed, time, random)`, hex.
pub fn new_session_id(seed: &str, now_ms: u64) -> AgentResult<String> {
    let nonce = random_bytes::<16>()?;
    Ok(hash_parts(&[
        seed.as_bytes(),
        now_ms.to_string().as_bytes(),
        alloy::hex::encode(nonce).as_bytes(),
    ])
    .to_string())
}

impl SessionEngine {
    pub fn new(
        storage: Arc<dyn SessionStorage>,
        attestor: Arc<AttestationProvider>,
        coordinator: Option<Arc<dyn ThresholdCoordinator>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_capacity(storage, attestor, coordinator, clock, MAX_SESSIONS)
    }

    pub fn with_capacity(
        storage: Arc<dyn SessionStorage>,
        attestor: Arc<AttestationProvider>,
        coordinator: Option<Arc<dyn ThresholdCoordinator>>,
        clock: Arc<dyn Clock>,
        capacity: usize,
    ) -> Self {
        Self {
            sessions: BoundedStore::new(capacity),
            storage,
            attestor,
            coordinator,
            clock,
            require_verified: false,
        }
    }

    /// Refuse to mint or sign with unverified (simulated) attestations.
    pub fn require_verified_attestation(mut self, required: bool) -> Self {
        self.require_verified = required;
        self
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn threshold_ready(&self) -> bool {
        self.coordinator
            .as_ref()
            .is_some_and(|coordinator| coordinator.is_initialized())
    }

    fn ensure_trusted(&self, attestation: &TeeAttestation) -> AgentResult<()> {
        if self.require_verified && !attestation.verified {
            error!(
                provider = ?attestation.provider,
                "Unverified attestation produced where a verified one is required"
            );
            return Err(AgentError::SecurityInvariant(
                "attestation is not hardware-verified".to_string(),
            ));
        }
        Ok(())
    }

    async fn attest_key(&self, session_id: &str, key: &SessionKey) -> AgentResult<TeeAttestation> {
        let public_key = key.public_key_hex();
        let binding = hash_parts(&[b"session", session_id.as_bytes(), public_key.as_bytes()]);
        let attestation = self.attestor.get_attestation(Some(binding.as_slice())).await?;
        self.ensure_trusted(&attestation)?;
        Ok(attestation)
    }

    pub async fn create_session(&self, request: SessionRequest) -> AgentResult<Session> {
        let now = self.clock.now_ms();
        let identity_id = identity_id(request.provider, &request.provider_id);
        let session_id = match request.session_id {
            Some(id) => id,
            None => new_session_id(&format!("{}:{}", request.app_id, identity_id), now)?,
        };
        let smart_account = request
            .smart_account
            .unwrap_or_else(|| derived_account(&identity_id));

        let signing_key = SessionKey::generate();
        let attestation = self.attest_key(&session_id, &signing_key).await?;

        let internal = InternalSession {
            session_id: session_id.clone(),
            identity_id,
            smart_account,
            expires_at: now + SESSION_TTL.as_millis() as u64,
            capabilities: SessionCapability::defaults(),
            signing_public_key: signing_key.public_key_hex(),
            signing_key,
            attestation,
        };
        let public = internal.to_public();

        match self
            .sessions
            .insert_if_absent(session_id.clone(), internal, now)
        {
            Ok(()) => {}
            Err(InsertError::Full) => {
                warn!(capacity = self.sessions.capacity(), "Session table full");
                return Err(AgentError::CapacityExceeded(
                    "session capacity reached".to_string(),
                ));
            }
            Err(InsertError::Occupied) => {
                return Err(AgentError::validation("session already exists"));
            }
        }

        if let Err(e) = self.storage.store_session(&public).await {
            // Unwind the local insert.
            self.sessions.take(&session_id);
            warn!(session_id = %session_id, error = %e, "Failed to persist session");
            return Err(e);
        }

        info!(
            session_id = %session_id,
            provider = request.provider.as_str(),
            app_id = %request.app_id,
            handle = request.handle.as_deref().unwrap_or(""),
            "Session created"
        );
        Ok(public)
    }

    /// Local record first, then the external projection.
    pub async fn get_session(&self, session_id: &str) -> AgentResult<Session> {
        let now = self.clock.now_ms();
        let local = self.sessions.with(session_id, |session| {
            if session.is_expired(now) {
                None
            } else {
                Some(session.to_public())
            }
        });

        match local {
            Some(Some(public)) => return Ok(public),
            Some(None) => {
                self.sessions.take(session_id);
                debug!(session_id = %session_id, "Dropped expired session on lookup");
                return Err(AgentError::Expired("session".to_string()));
            }
            None => {}
        }

        match self.storage.retrieve_session(session_id).await? {
            Some(public) if public.is_expired(now) => {
                Err(AgentError::Expired("session".to_string()))
            }
            Some(public) => Ok(public),
            None => Err(AgentError::NotFound(format!("session {session_id}"))),
        }
    }

    pub async fn refresh_session(&self, session_id: &str) -> AgentResult<Session> {
        let now = self.clock.now_ms();
        let current = self.sessions.with(session_id, |session| {
            (
                session.is_expired(now),
                session.expires_at,
                session.identity_id.clone(),
                session.smart_account,
                session.capabilities.clone(),
            )
        });
        let (expired, old_expiry, identity_id, smart_account, capabilities) = match current {
            Some(fields) => fields,
            None => return Err(AgentError::NotFound(format!("session {session_id}"))),
        };
        if expired {
            self.sessions.take(session_id);
            return Err(AgentError::Expired("session".to_string()));
        }

        let signing_key = SessionKey::generate();
        let attestation = self.attest_key(session_id, &signing_key).await?;

        let refreshed = InternalSession {
            session_id: session_id.to_string(),
            identity_id,
            smart_account,
            expires_at: old_expiry.max(now) + SESSION_TTL.as_millis() as u64,
            capabilities,
            signing_public_key: signing_key.public_key_hex(),
            signing_key,
            attestation,
        };
        let public = refreshed.to_public();

        // The old key stays live until the new projection is persisted.
        self.storage.store_session(&public).await?;

        if self.sessions.replace_if_present(session_id, refreshed).is_err() {
            // Deleted while the refresh was in flight.
            if let Err(e) = self.storage.delete_session(session_id).await {
                warn!(session_id = %session_id, error = %e, "Failed to drop orphaned projection");
            }
            return Err(AgentError::NotFound(format!("session {session_id}")));
        }

        info!(session_id = %session_id, expires_at = public.expires_at, "Session refreshed");
        Ok(public)
    }

    /// Idempotent. The local key is destroyed even when the storage
    /// gateway is unreachable; the error is still returned so the caller can
    /// retry the external delete.
    pub async fn delete_session(&self, session_id: &str) -> AgentResult<()> {
        if self.sessions.take(session_id).is_some() {
            info!(session_id = %session_id, "Session deleted");
        }
        if let Err(e) = self.storage.delete_session(session_id).await {
            warn!(session_id = %session_id, error = %e, "Failed to delete session projection");
            return Err(e);
        }
        Ok(())
    }

    /// Sign `message` for a live local session.
    ///
    /// With an initialized threshold coordinator the cluster signs; otherwise
    /// the session key produces an EIP-191 signature.
    pub async fn sign(&self, session_id: &str, message: &[u8]) -> AgentResult<SignResult> {
        let now = self.clock.now_ms();
        let local = self.sessions.with(session_id, |session| {
            if session.is_expired(now) {
                return Err(AgentError::Expired("session".to_string()));
            }
            if !session.can(SessionCapability::SignMessage) {
                return Err(AgentError::validation("session may not sign messages"));
            }
            match &self.coordinator {
                Some(coordinator) if coordinator.is_initialized() => Ok(None),
                _ => session.signing_key.sign_message(message).map(Some),
            }
        });

        let local_signature = match local {
            None => {
                return Err(AgentError::NotFound(format!("local session {session_id}")))
            }
            Some(Err(AgentError::Expired(reason))) => {
                self.sessions.take(session_id);
                return Err(AgentError::Expired(reason));
            }
            Some(result) => result?,
        };

        let signature = match (local_signature, &self.coordinator) {
            (Some(signature), _) => signature,
            (None, Some(coordinator)) => coordinator.sign(message).await?.to_bytes(),
            (None, None) => {
                return Err(AgentError::Internal("no signer available".to_string()));
            }
        };

        let binding = hash_parts(&[b"sign", message]);
        let attestation = self.attestor.get_attestation(Some(binding.as_slice())).await?;
        self.ensure_trusted(&attestation)?;

        debug!(
            session_id = %session_id,
            message_hash = %keccak256(message),
            threshold = local_signature.is_none(),
            "Message signed"
        );
        Ok(SignResult {
            signature: Bytes::copy_from_slice(&signature),
            attestation,
        })
    }

    pub fn sweep(&self) -> usize {
        self.sessions.sweep_expired(self.clock.now_ms())
    }
}
