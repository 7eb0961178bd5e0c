// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS fetching, caching and id_token verification.
//!
//! Providers that deliver the profile inside a signed `id_token` (Apple)
//! publish their signing keys as a JWKS. Keys are cached for five minutes;
//! an unknown `kid` forces one refetch before the token is rejected.

use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AgentError, AgentResult};

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

pub struct JwksManager {
    jwks_url: String,
    cache_ttl: Duration,
    cache: RwLock<Option<CacheEntry>>,
    client: reqwest::Client,
}

impl JwksManager {
    pub fn new(jwks_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: RwLock::new(None),
            client,
        }
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    async fn cached(&self) -> Option<JwkSet> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
            .map(|entry| entry.jwks.clone())
    }

    async fn refresh(&self) -> AgentResult<JwkSet> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AgentError::upstream(format!("JWKS fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AgentError::upstream(format!(
                "JWKS endpoint returned {}",
                response.status()
            )));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AgentError::upstream(format!("invalid JWKS: {e}")))?;

        debug!(url = %self.jwks_url, keys = jwks.keys.len(), "JWKS refreshed");
        *self.cache.write().await = Some(CacheEntry {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
        });
        Ok(jwks)
    }

    async fn decoding_key(&self, kid: Option<&str>) -> AgentResult<(DecodingKey, Algorithm)> {
        if let Some(jwks) = self.cached().await {
            if let Some(found) = select_key(&jwks, kid) {
                return jwk_to_decoding_key(found);
            }
        }

        let jwks = self.refresh().await?;
        let jwk = select_key(&jwks, kid)
            .ok_or_else(|| AgentError::upstream("no JWKS key matches the id_token"))?;
        jwk_to_decoding_key(jwk)
    }

    /// Verify signature, `iss`, `aud` and `exp`, then return the claims.
    pub async fn verify<C: DeserializeOwned>(
        &self,
        token: &str,
        issuer: &str,
        audience: &str,
    ) -> AgentResult<C> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| AgentError::upstream(format!("malformed id_token: {e}")))?;
        let (key, algorithm) = self.decoding_key(header.kid.as_deref()).await?;

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);

        jsonwebtoken::decode::<C>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AgentError::upstream(format!("id_token rejected: {e}")))
    }
}

fn select_key<'a>(jwks: &'a JwkSet, kid: Option<&str>) -> Option<&'a Jwk> {
    match kid {
        Some(kid) => jwks.find(kid),
        None => jwks.keys.first(),
    }
}

fn jwk_to_decoding_key(jwk: &Jwk) -> AgentResult<(DecodingKey, Algorithm)> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| AgentError::upstream(format!("bad RSA JWK: {e}")))?;
            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                _ => Algorithm::RS256,
            };
            Ok((key, alg))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| AgentError::upstream(format!("bad EC JWK: {e}")))?;
            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            };
            Ok((key, alg))
        }
        _ => Err(AgentError::upstream("unsupported JWKS key type")),
    }
}
