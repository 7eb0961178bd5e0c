// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # OAuth / PKCE Flow
//!
//! ```text
//! NONE ──init──▶ INIT (pending) ──callback──▶ CALLBACK_RECEIVED ──▶ SESSION_CREATED
//!                     │                              │
//!                     └── sweep / late callback ─▶ EXPIRED
//! unknown state ─────────────────────────────────▶ REJECTED
//! ```
//!
//! ## Modules
//!
//! - [`providers`]: descriptor table and typed profile schemas
//! - [`pkce`]: verifier / S256 challenge
//! - [`redirect`]: redirect URI policy
//! - [`jwks`]: signing keys for id_token providers (Apple)
//! - [`flow`]: pending-authorization state machine

pub mod flow;
pub mod jwks;
pub mod pkce;
pub mod providers;
pub mod redirect;

pub use flow::{AuthInit, CallbackResult, OAuthFlow, PendingAuth, ProviderCredentials, PENDING_TTL};
pub use providers::{ProfileMapper, ProfileSource, ProviderDescriptor, ProviderProfile};
pub use redirect::validate_redirect_uri;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AgentError;

/// Every way an identity can be established. Only the first five have an
/// OAuth descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Google,
    Github,
    Twitter,
    Discord,
    Apple,
    Farcaster,
    Wallet,
}

impl AuthProvider {
    pub const OAUTH: [AuthProvider; 5] = [
        AuthProvider::Google,
        AuthProvider::Github,
        AuthProvider::Twitter,
        AuthProvider::Discord,
        AuthProvider::Apple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Google => "google",
            AuthProvider::Github => "github",
            AuthProvider::Twitter => "twitter",
            AuthProvider::Discord => "discord",
            AuthProvider::Apple => "apple",
            AuthProvider::Farcaster => "farcaster",
            AuthProvider::Wallet => "wallet",
        }
    }

    /// Prefix for `{PREFIX}_CLIENT_ID` / `{PREFIX}_CLIENT_SECRET`.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            AuthProvider::Google => "GOOGLE",
            AuthProvider::Github => "GITHUB",
            AuthProvider::Twitter => "TWITTER",
            AuthProvider::Discord => "DISCORD",
            AuthProvider::Apple => "APPLE",
            AuthProvider::Farcaster => "FARCASTER",
            AuthProvider::Wallet => "WALLET",
        }
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthProvider {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(AuthProvider::Google),
            "github" => Ok(AuthProvider::Github),
            "twitter" | "x" => Ok(AuthProvider::Twitter),
            "discord" => Ok(AuthProvider::Discord),
            "apple" => Ok(AuthProvider::Apple),
            "farcaster" => Ok(AuthProvider::Farcaster),
            "wallet" => Ok(AuthProvider::Wallet),
            other => Err(AgentError::UnsupportedProvider(other.to_string())),
        }
    }
}
