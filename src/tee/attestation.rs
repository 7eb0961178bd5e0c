// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Attestation acquisition.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{keccak256, Address, Bytes, B256};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::TeeBackend;
use crate::clock::Clock;
use crate::error::{AgentError, AgentResult};

/// Quote requests fail fast; callers decide whether to retry.
const QUOTE_TIMEOUT: Duration = Duration::from_secs(5);

/// Bytes of the quote exposed as the measurement.
pub const MEASUREMENT_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TeeProvider {
    Dstack,
    Phala,
    Simulated,
}

/// Proof that the code producing a value runs inside a TEE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeeAttestation {
    /// Raw quote (hex).
    #[schema(value_type = String)]
    pub quote: Bytes,
    /// Fixed-size prefix of the quote (hex).
    #[schema(value_type = String)]
    pub measurement: Bytes,
    /// Data the quote is bound to (hex).
    #[schema(value_type = String)]
    pub report_data: Bytes,
    /// Unix milliseconds.
    pub timestamp: u64,
    pub provider: TeeProvider,
    /// `false` only for simulated attestations.
    pub verified: bool,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    quote: String,
}

/// Produces attestations from the resolved backend.
pub struct AttestationProvider {
    backend: TeeBackend,
    default_report_data: B256,
    clock: Arc<dyn Clock>,
    http: Client,
}

impl AttestationProvider {
    /// `node_address` seeds the default report data.
    pub fn new(
        backend: TeeBackend,
        node_address: Address,
        clock: Arc<dyn Clock>,
    ) -> AgentResult<Self> {
        let http = Client::builder()
            .timeout(QUOTE_TIMEOUT)
            .build()
            .map_err(|e| AgentError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            backend,
            default_report_data: keccak256(node_address),
            clock,
            http,
        })
    }

    pub fn provider(&self) -> TeeProvider {
        self.backend.provider()
    }

    /// Attest `report_data`, or the node identity hash when `None`.
    pub async fn get_attestation(&self, report_data: Option<&[u8]>) -> AgentResult<TeeAttestation> {
        let report_data = Bytes::copy_from_slice(
            report_data.unwrap_or(self.default_report_data.as_slice()),
        );
        let timestamp = self.clock.now_ms();

        match &self.backend {
            TeeBackend::Dstack { endpoint } => {
                let url = format!("{}/GetQuote", endpoint.trim_end_matches('/'));
                let body = json!({ "report_data": alloy::hex::encode(&report_data) });
                let quote = self.fetch_quote(&url, &body).await?;
                hardware_attestation(quote, report_data, timestamp, TeeProvider::Dstack)
            }
            TeeBackend::Phala { endpoint } => {
                let url = format!("{}/prpc/Tappd.TdxQuote?json", endpoint.trim_end_matches('/'));
                let body = json!({
                    "report_data": alloy::hex::encode(&report_data),
                    "hash_algorithm": "raw",
                });
                let quote = self.fetch_quote(&url, &body).await?;
                hardware_attestation(quote, report_data, timestamp, TeeProvider::Phala)
            }
            TeeBackend::Simulated => Ok(simulated_attestation(report_data, timestamp)),
        }
    }

    async fn fetch_quote(&self, url: &str, body: &serde_json::Value) -> AgentResult<Vec<u8>> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AgentError::upstream(format!("quote request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "TEE backend rejected quote request");
            return Err(AgentError::upstream(format!(
                "quote request returned {status}"
            )));
        }

        let parsed: QuoteResponse = response
            .json()
            .await
            .map_err(|e| AgentError::upstream(format!("invalid quote response: {e}")))?;

        let quote = alloy::hex::decode(parsed.quote.trim())
            .map_err(|_| AgentError::upstream("quote is not valid hex"))?;

        debug!(quote_len = quote.len(), "Received TEE quote");
        Ok(quote)
    }
}

fn hardware_attestation(
    quote: Vec<u8>,
    report_data: Bytes,
    timestamp: u64,
    provider: TeeProvider,
) -> AgentResult<TeeAttestation> {
    if quote.len() < MEASUREMENT_LEN {
        return Err(AgentError::upstream(format!(
            "quote too short: {} bytes",
            quote.len()
        )));
    }

    Ok(TeeAttestation {
        measurement: Bytes::copy_from_slice(&quote[..MEASUREMENT_LEN]),
        quote: Bytes::from(quote),
        report_data,
        timestamp,
        provider,
        verified: true,
    })
}

fn simulated_attestation(report_data: Bytes, timestamp: u64) -> TeeAttestation {
    let preimage = format!(
        "simulated:{}{timestamp}",
        alloy::hex::encode(&report_data)
    );
    let quote = keccak256(preimage.as_bytes());

    TeeAttestation {
        quote: Bytes::copy_from_slice(quote.as_slice()),
        measurement: Bytes::copy_from_slice(&quote[..MEASUREMENT_LEN]),
        report_data,
        timestamp,
        provider: TeeProvider::Simulated,
        verified: false,
    }
}
