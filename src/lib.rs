// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OAuth3 Auth Agent - Attested Session & Threshold Signing Gateway
//!
//! Runs inside a TEE (dstack / Phala CVM). Users sign in through an OAuth
//! provider, a wallet signature or Farcaster; each sign-in opens a session
//! whose signing key is generated in-enclave and bound to an attestation.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Wallet and Farcaster sign-in
//! - `credentials` - Verifiable identity credentials
//! - `oauth` - Provider descriptors, PKCE and the authorization flow
//! - `session` - Session engine, bounded stores and the expiry sweeper
//! - `storage` - External session storage and name resolution
//! - `tee` - Attestation backends
//! - `threshold` - Threshold signing coordinator

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod crypto;
pub mod error;
pub mod models;
pub mod oauth;
pub mod session;
pub mod state;
pub mod storage;
pub mod tee;
pub mod threshold;
