// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # External Storage
//!
//! Public session projections and issued credentials are persisted to a
//! decentralized storage gateway so that other processes can read session
//! status. Nothing written through these traits ever contains key material:
//! the session trait takes [`Session`], which has no key field.
//!
//! ## Implementations
//!
//! - [`HttpStorageClient`] / [`HttpNameResolver`]: gateway clients.
//! - [`InMemoryStorage`]: development and tests.

pub mod http;
pub mod memory;

pub use http::{HttpNameResolver, HttpStorageClient};
pub use memory::InMemoryStorage;

use async_trait::async_trait;

use crate::credentials::VerifiableCredential;
use crate::error::AgentResult;
use crate::session::Session;

#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn store_session(&self, session: &Session) -> AgentResult<()>;

    async fn retrieve_session(&self, session_id: &str) -> AgentResult<Option<Session>>;

    /// Idempotent: deleting an unknown id succeeds.
    async fn delete_session(&self, session_id: &str) -> AgentResult<()>;

    async fn store_credential(&self, credential: &VerifiableCredential) -> AgentResult<()>;

    async fn is_healthy(&self) -> bool;
}

/// Name-resolution service, used only as an infrastructure health signal.
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn is_available(&self, name: &str) -> AgentResult<bool>;
}
