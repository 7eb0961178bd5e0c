// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Threshold Signing Coordinator
//!
//! The session engine depends only on [`ThresholdCoordinator`]: bring the
//! cluster up once, then ask it for `{r, s, v}` over a message. Key
//! generation, share distribution and the signing rounds belong to the
//! cluster and are not modelled here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use alloy::primitives::B256;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::{AgentError, AgentResult};

const COORDINATOR_TIMEOUT: Duration = Duration::from_secs(15);

/// Signature components returned by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdSignature {
    pub r: B256,
    pub s: B256,
    pub v: u8,
}

impl ThresholdSignature {
    /// Standard `r || s || v` encoding.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(self.r.as_slice());
        out[32..64].copy_from_slice(self.s.as_slice());
        out[64] = self.v;
        out
    }
}

/// Threshold parameters (`MPC_THRESHOLD` of `MPC_PARTIES`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpcSettings {
    pub threshold: u16,
    pub parties: u16,
    pub coordinator_url: String,
}

#[async_trait]
pub trait ThresholdCoordinator: Send + Sync {
    async fn initialize_cluster(&self) -> AgentResult<()>;

    fn is_initialized(&self) -> bool;

    async fn sign(&self, message: &[u8]) -> AgentResult<ThresholdSignature>;
}

/// Coordinator reached over HTTP.
pub struct HttpThresholdCoordinator {
    settings: MpcSettings,
    cluster_id: String,
    initialized: AtomicBool,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    r: B256,
    s: B256,
    v: u8,
}

impl HttpThresholdCoordinator {
    pub fn new(settings: MpcSettings, cluster_id: impl Into<String>) -> AgentResult<Self> {
        let http = Client::builder()
            .timeout(COORDINATOR_TIMEOUT)
            .build()
            .map_err(|e| AgentError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            settings,
            cluster_id: cluster_id.into(),
            initialized: AtomicBool::new(false),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}{}",
            self.settings.coordinator_url.trim_end_matches('/'),
            path
        )
    }
}

#[async_trait]
impl ThresholdCoordinator for HttpThresholdCoordinator {
    async fn initialize_cluster(&self) -> AgentResult<()> {
        let response = self
            .http
            .post(self.url("/cluster/init"))
            .json(&json!({
                "clusterId": self.cluster_id,
                "threshold": self.settings.threshold,
                "parties": self.settings.parties,
            }))
            .send()
            .await
            .map_err(|e| AgentError::upstream(format!("cluster init failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AgentError::upstream(format!(
                "cluster init returned {}",
                response.status()
            )));
        }

        self.initialized.store(true, Ordering::SeqCst);
        info!(
            cluster_id = %self.cluster_id,
            threshold = self.settings.threshold,
            parties = self.settings.parties,
            "Threshold signing cluster initialized"
        );
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    async fn sign(&self, message: &[u8]) -> AgentResult<ThresholdSignature> {
        if !self.is_initialized() {
            return Err(AgentError::upstream("threshold cluster is not initialized"));
        }

        let response = self
            .http
            .post(self.url("/sign"))
            .json(&json!({
                "clusterId": self.cluster_id,
                "message": format!("0x{}", alloy::hex::encode(message)),
            }))
            .send()
            .await
            .map_err(|e| AgentError::upstream(format!("threshold sign failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AgentError::upstream(format!(
                "threshold sign returned {}",
                response.status()
            )));
        }

        let parsed: SignResponse = response
            .json()
            .await
            .map_err(|e| AgentError::upstream(format!("invalid threshold signature: {e}")))?;

        Ok(ThresholdSignature {
            r: parsed.r,
            s: parsed.s,
            v: parsed.v,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(url: String) -> MpcSettings {
        MpcSettings {
            threshold: 2,
            parties: 3,
            coordinator_url: url,
        }
    }

    #[test]
    fn signature_bytes_are_r_s_v() {
        let sig = ThresholdSignature {
            r: B256::repeat_byte(1),
            s: B256::repeat_byte(2),
            v: 28,
        };
        let bytes = sig.to_bytes();
        assert_eq!(&bytes[..32], &[1u8; 32]);
        assert_eq!(&bytes[32..64], &[2u8; 32]);
        assert_eq!(bytes[64], 28);
    }

    #[tokio::test]
    async fn sign_requires_initialized_cluster() {
        let coordinator =
            HttpThresholdCoordinator::new(settings("http://127.0.0.1:1".into()), "c").unwrap();
        assert!(!coordinator.is_initialized());
        assert!(matches!(
            coordinator.sign(b"msg").await,
            Err(AgentError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn initializes_and_signs_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cluster/init"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/sign"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "r": format!("0x{}", "aa".repeat(32)),
                "s": format!("0x{}", "bb".repeat(32)),
                "v": 27,
            })))
            .mount(&server)
            .await;

        let coordinator = HttpThresholdCoordinator::new(settings(server.uri()), "cluster-1").unwrap();
        coordinator.initialize_cluster().await.unwrap();
        assert!(coordinator.is_initialized());

        let sig = coordinator.sign(&[0xde, 0xad]).await.unwrap();
        assert_eq!(sig.r, B256::repeat_byte(0xaa));
        assert_eq!(sig.s, B256::repeat_byte(0xbb));
        assert_eq!(sig.v, 27);
    }
}
