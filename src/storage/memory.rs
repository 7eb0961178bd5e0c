// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory storage backend.
//!
//! Used when no storage gateway is configured on a development chain, and by
//! tests. Records are lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::SessionStorage;
use crate::credentials::VerifiableCredential;
use crate::error::AgentResult;
use crate::session::Session;

#[derive(Default)]
pub struct InMemoryStorage {
    sessions: RwLock<HashMap<String, Session>>,
    credentials: RwLock<HashMap<String, VerifiableCredential>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn credential(&self, credential_id: &str) -> Option<VerifiableCredential> {
        self.credentials.read().await.get(credential_id).cloned()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStorage for InMemoryStorage {
    async fn store_session(&self, session: &Session) -> AgentResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn retrieve_session(&self, session_id: &str) -> AgentResult<Option<Session>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn delete_session(&self, session_id: &str) -> AgentResult<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn store_credential(&self, credential: &VerifiableCredential) -> AgentResult<()> {
        self.credentials
            .write()
            .await
            .insert(credential.id.clone(), credential.clone());
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
