// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP clients for the storage gateway and the name-resolution service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::warn;

use super::{NameResolver, SessionStorage};
use crate::credentials::VerifiableCredential;
use crate::error::{AgentError, AgentResult};
use crate::session::Session;

const STORAGE_TIMEOUT: Duration = Duration::from_secs(10);

fn build_client() -> AgentResult<Client> {
    Client::builder()
        .timeout(STORAGE_TIMEOUT)
        .build()
        .map_err(|e| AgentError::Internal(format!("failed to build HTTP client: {e}")))
}

/// Storage gateway client.
///
/// | Operation | Request |
/// |-----------|---------|
/// | store session | `PUT /sessions/{id}` |
/// | retrieve session | `GET /sessions/{id}` (404 → `None`) |
/// | delete session | `DELETE /sessions/{id}` (404 → ok) |
/// | store credential | `PUT /credentials/{id}` |
/// | health | `GET /health` |
#[derive(Debug, Clone)]
pub struct HttpStorageClient {
    endpoint: String,
    http: Client,
}

impl HttpStorageClient {
    pub fn new(endpoint: impl Into<String>) -> AgentResult<Self> {
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            http: build_client()?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }
}

/// Percent-encode one path segment. Dot segments would be collapsed by the
/// URL parser, so they are refused outright.
fn segment(raw: &str) -> AgentResult<String> {
    if raw.is_empty() || raw == "." || raw == ".." {
        return Err(AgentError::validation(format!("invalid path segment {raw:?}")));
    }
    Ok(url::form_urlencoded::byte_serialize(raw.as_bytes()).collect())
}

#[async_trait]
impl SessionStorage for HttpStorageClient {
    async fn store_session(&self, session: &Session) -> AgentResult<()> {
        let path = format!("/sessions/{}", segment(&session.session_id)?);
        let response = self
            .http
            .put(self.url(&path))
            .json(session)
            .send()
            .await
            .map_err(|e| AgentError::upstream(format!("PUT {path} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AgentError::upstream(format!(
                "PUT {path} returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn retrieve_session(&self, session_id: &str) -> AgentResult<Option<Session>> {
        let path = format!("/sessions/{}", segment(session_id)?);
        let response = self
            .http
            .get(self.url(&path))
            .send()
            .await
            .map_err(|e| AgentError::upstream(format!("GET {path} failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AgentError::upstream(format!(
                "GET {path} returned {}",
                response.status()
            )));
        }

        response
            .json::<Session>()
            .await
            .map(Some)
            .map_err(|e| AgentError::upstream(format!("GET {path} invalid session: {e}")))
    }

    async fn delete_session(&self, session_id: &str) -> AgentResult<()> {
        let path = format!("/sessions/{}", segment(session_id)?);
        let response = self
            .http
            .delete(self.url(&path))
            .send()
            .await
            .map_err(|e| AgentError::upstream(format!("DELETE {path} failed: {e}")))?;

        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(AgentError::upstream(format!(
                "DELETE {path} returned {}",
                response.status()
            )))
        }
    }

    async fn store_credential(&self, credential: &VerifiableCredential) -> AgentResult<()> {
        let path = format!("/credentials/{}", segment(&credential.id)?);
        let response = self
            .http
            .put(self.url(&path))
            .json(credential)
            .send()
            .await
            .map_err(|e| AgentError::upstream(format!("PUT {path} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AgentError::upstream(format!(
                "PUT {path} returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        match self.http.get(self.url("/health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(error = %e, "Storage gateway health check failed");
                false
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct AvailabilityResponse {
    available: bool,
}

/// Name-resolution client: `GET /names/{name}/available` → `{"available": bool}`.
#[derive(Debug, Clone)]
pub struct HttpNameResolver {
    endpoint: String,
    http: Client,
}

impl HttpNameResolver {
    pub fn new(endpoint: impl Into<String>) -> AgentResult<Self> {
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            http: build_client()?,
        })
    }
}

#[async_trait]
impl NameResolver for HttpNameResolver {
    async fn is_available(&self, name: &str) -> AgentResult<bool> {
        let response = self
            .http
            .get(format!("{}/names/{}/available", self.endpoint, segment(name)?))
            .send()
            .await
            .map_err(|e| AgentError::upstream(format!("name lookup failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AgentError::upstream(format!(
                "name lookup returned {}",
                response.status()
            )));
        }

        response
            .json::<AvailabilityResponse>()
            .await
            .map(|body| body.available)
            .map_err(|e| AgentError::upstream(format!("invalid name lookup response: {e}")))
    }
}
