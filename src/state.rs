// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared application state and component wiring.

use std::sync::Arc;

use alloy::primitives::Address;
use tracing::{info, warn};

use crate::auth::{CustodyRegistry, HubCustodyRegistry};
use crate::clock::Clock;
use crate::config::{AuthAgentConfig, CorsOrigins};
use crate::credentials::CredentialIssuer;
use crate::error::AgentResult;
use crate::oauth::OAuthFlow;
use crate::session::SessionEngine;
use crate::storage::{
    HttpNameResolver, HttpStorageClient, InMemoryStorage, NameResolver, SessionStorage,
};
use crate::tee::AttestationProvider;
use crate::threshold::{HttpThresholdCoordinator, ThresholdCoordinator};

/// Static facts about this node, reported by `/health`.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub node_id: String,
    pub cluster_id: String,
    pub chain_id: u64,
    pub address: Address,
    pub identity_registry: Option<Address>,
    pub dev_mode: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub node: NodeInfo,
    pub sessions: Arc<SessionEngine>,
    pub oauth: Arc<OAuthFlow>,
    pub credentials: Arc<CredentialIssuer>,
    pub attestor: Arc<AttestationProvider>,
    pub storage: Arc<dyn SessionStorage>,
    pub name_resolver: Option<Arc<dyn NameResolver>>,
    /// Farcaster fid ownership. Absent only on development chains.
    pub custody_registry: Option<Arc<dyn CustodyRegistry>>,
    pub coordinator: Option<Arc<dyn ThresholdCoordinator>>,
    pub cors: CorsOrigins,
}

impl AppState {
    pub fn from_config(config: &AuthAgentConfig, clock: Arc<dyn Clock>) -> AgentResult<Self> {
        let storage: Arc<dyn SessionStorage> = match &config.storage_endpoint {
            Some(endpoint) => Arc::new(HttpStorageClient::new(endpoint.clone())?),
            None => {
                warn!("STORAGE_ENDPOINT not set; session projections kept in memory");
                Arc::new(InMemoryStorage::new())
            }
        };

        let name_resolver = match &config.name_resolver_endpoint {
            Some(endpoint) => {
                Some(Arc::new(HttpNameResolver::new(endpoint.clone())?) as Arc<dyn NameResolver>)
            }
            None => None,
        };

        let custody_registry = match &config.farcaster_hub_endpoint {
            Some(endpoint) => Some(
                Arc::new(HubCustodyRegistry::new(endpoint.clone())?) as Arc<dyn CustodyRegistry>
            ),
            None => {
                warn!("FARCASTER_HUB_ENDPOINT not set; Farcaster fids are not checked against custody");
                None
            }
        };

        let coordinator = match &config.mpc {
            Some(settings) => Some(Arc::new(HttpThresholdCoordinator::new(
                settings.clone(),
                config.cluster_id.clone(),
            )?) as Arc<dyn ThresholdCoordinator>),
            None => None,
        };

        let address = config.node_identity.address();
        let attestor = Arc::new(AttestationProvider::new(
            config.tee_backend.clone(),
            address,
            clock.clone(),
        )?);

        let sessions = Arc::new(
            SessionEngine::new(
                storage.clone(),
                attestor.clone(),
                coordinator.clone(),
                clock.clone(),
            )
            .require_verified_attestation(!config.is_dev()),
        );

        let oauth = Arc::new(OAuthFlow::new(
            sessions.clone(),
            config.provider_credentials.clone(),
            clock.clone(),
            config.is_dev(),
        )?);

        let credentials = Arc::new(CredentialIssuer::new(
            config.node_identity.clone(),
            config.chain_id,
            config.node_id.clone(),
            sessions.clone(),
            storage.clone(),
            clock,
        ));

        info!(
            node_id = %config.node_id,
            node_address = %address,
            chain_id = config.chain_id,
            tee = ?attestor.provider(),
            threshold = coordinator.is_some(),
            "Components initialized"
        );

        Ok(Self {
            node: NodeInfo {
                node_id: config.node_id.clone(),
                cluster_id: config.cluster_id.clone(),
                chain_id: config.chain_id,
                address,
                identity_registry: config.identity_registry,
                dev_mode: config.is_dev(),
            },
            sessions,
            oauth,
            credentials,
            attestor,
            storage,
            name_resolver,
            custody_registry,
            coordinator,
            cors: config.allowed_origins.clone(),
        })
    }

    /// Bring up the threshold cluster. On failure sessions keep signing
    /// with their local keys.
    pub async fn initialize_cluster(&self) {
        let Some(coordinator) = &self.coordinator else {
            return;
        };
        match coordinator.initialize_cluster().await {
            Ok(()) => info!(cluster_id = %self.node.cluster_id, "Threshold cluster initialized"),
            Err(e) => warn!(
                cluster_id = %self.node.cluster_id,
                error = %e,
                "Threshold cluster unavailable; signing with session keys"
            ),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::clock::ManualClock;

    /// Development-chain state with in-memory storage and a simulated TEE.
    pub fn state() -> (AppState, Arc<ManualClock>) {
        let config = AuthAgentConfig::from_lookup(|key| match key {
            "GOOGLE_CLIENT_ID" => Some("google-client".to_string()),
            "GOOGLE_CLIENT_SECRET" => Some("google-secret".to_string()),
            _ => None,
        })
        .unwrap();
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        (AppState::from_config(&config, clock.clone()).unwrap(), clock)
    }
}
