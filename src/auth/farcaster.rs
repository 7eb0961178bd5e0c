// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Farcaster sign-in.
//!
//! The client signs a fixed challenge with the FID's custody key:
//!
//! ```text
//! Sign in with Farcaster
//!
//! FID: {fid}
//! App: {appId}
//! Timestamp: {unix seconds}
//! ```
//!
//! A signature only proves control of `custodyAddress`. The link from that
//! address to `fid` comes from a [`CustodyRegistry`], normally a Farcaster
//! Hub reading the on-chain ID registry. Without a registry (development
//! chains only) the claimed fid is taken as given.

use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::parse_address;
use crate::crypto::verify_personal_sign;
use crate::error::{AgentError, AgentResult};
use crate::oauth::AuthProvider;
use crate::session::{Session, SessionEngine, SessionRequest};

const HUB_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of truth for which fid a custody address holds.
#[async_trait]
pub trait CustodyRegistry: Send + Sync {
    /// The fid currently registered to `custody`, if any.
    async fn fid_of(&self, custody: Address) -> AgentResult<Option<u64>>;
}

#[derive(Debug, Deserialize)]
struct IdRegistryEvent {
    fid: u64,
}

/// Farcaster Hub HTTP API:
/// `GET /v1/onChainIdRegistryEventByAddress?address={custody}`.
#[derive(Debug, Clone)]
pub struct HubCustodyRegistry {
    endpoint: String,
    http: Client,
}

impl HubCustodyRegistry {
    pub fn new(endpoint: impl Into<String>) -> AgentResult<Self> {
        let http = Client::builder()
            .timeout(HUB_TIMEOUT)
            .build()
            .map_err(|e| AgentError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl CustodyRegistry for HubCustodyRegistry {
    async fn fid_of(&self, custody: Address) -> AgentResult<Option<u64>> {
        let response = self
            .http
            .get(format!("{}/v1/onChainIdRegistryEventByAddress", self.endpoint))
            .query(&[("address", custody.to_string())])
            .send()
            .await
            .map_err(|e| AgentError::upstream(format!("hub lookup failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AgentError::upstream(format!(
                "hub lookup returned {}",
                response.status()
            )));
        }

        response
            .json::<IdRegistryEvent>()
            .await
            .map(|event| Some(event.fid))
            .map_err(|e| AgentError::upstream(format!("invalid hub response: {e}")))
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FarcasterAuthRequest {
    pub fid: u64,
    pub custody_address: String,
    pub signature: String,
    pub message: String,
    pub app_id: String,
}

/// Everything up to and including `Timestamp: `.
pub fn farcaster_challenge(fid: u64, app_id: &str) -> String {
    format!("Sign in with Farcaster\n\nFID: {fid}\nApp: {app_id}\nTimestamp: ")
}

pub async fn auth_farcaster(
    engine: &SessionEngine,
    registry: Option<&dyn CustodyRegistry>,
    request: &FarcasterAuthRequest,
) -> AgentResult<Session> {
    let custody = parse_address("custodyAddress", &request.custody_address)?;
    if request.app_id.trim().is_empty() {
        return Err(AgentError::validation("appId is required"));
    }

    let prefix = farcaster_challenge(request.fid, &request.app_id);
    let timestamp = request
        .message
        .strip_prefix(&prefix)
        .ok_or_else(|| AgentError::InvalidMessage("message does not match the Farcaster challenge".to_string()))?;
    if timestamp.trim().is_empty() {
        return Err(AgentError::InvalidMessage("message has no timestamp".to_string()));
    }

    if let Err(e) = verify_personal_sign(custody, request.message.as_bytes(), &request.signature) {
        warn!(fid = request.fid, "Farcaster signature rejected");
        return Err(e);
    }

    if let Some(registry) = registry {
        let registered = registry.fid_of(custody).await?;
        if registered != Some(request.fid) {
            warn!(
                fid = request.fid,
                registered = ?registered,
                custody = %custody,
                "Custody address does not hold the claimed fid"
            );
            return Err(AgentError::Forbidden(format!(
                "custodyAddress does not hold fid {}",
                request.fid
            )));
        }
    }

    let session = engine
        .create_session(SessionRequest {
            provider: AuthProvider::Farcaster,
            provider_id: request.fid.to_string(),
            handle: None,
            app_id: request.app_id.clone(),
            session_id: None,
            smart_account: Some(custody),
        })
        .await?;

    info!(fid = request.fid, session_id = %session.session_id, "Farcaster sign-in");
    Ok(session)
}
