// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # TEE Attestation
//!
//! Every session creation, refresh and signature carries a fresh attestation
//! whose report data binds the quote to the operation.
//!
//! ## Backends
//!
//! | Mode | Source | `verified` |
//! |------|--------|------------|
//! | `dstack` | dstack guest agent `GetQuote` | `true` |
//! | `phala` | Phala tappd `Tappd.TdxQuote` | `true` |
//! | `simulated` | `keccak256("simulated:" ‖ reportData ‖ timestamp)` | `false` |
//!
//! `auto` picks dstack, then phala, from whichever endpoint is configured and
//! falls back to simulated when neither is. Simulated attestations are only
//! acceptable on development chains.

pub mod attestation;

pub use attestation::{AttestationProvider, TeeAttestation, TeeProvider};

use std::str::FromStr;

/// Requested attestation mode (`TEE_MODE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeeMode {
    Auto,
    Dstack,
    Phala,
    Simulated,
}

impl FromStr for TeeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(TeeMode::Auto),
            "dstack" => Ok(TeeMode::Dstack),
            "phala" => Ok(TeeMode::Phala),
            "simulated" | "none" => Ok(TeeMode::Simulated),
            other => Err(format!("unknown TEE mode '{other}'")),
        }
    }
}

/// Resolved quote source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeeBackend {
    Dstack { endpoint: String },
    Phala { endpoint: String },
    Simulated,
}

impl TeeBackend {
    pub fn provider(&self) -> TeeProvider {
        match self {
            TeeBackend::Dstack { .. } => TeeProvider::Dstack,
            TeeBackend::Phala { .. } => TeeProvider::Phala,
            TeeBackend::Simulated => TeeProvider::Simulated,
        }
    }
}

/// Attestation settings as configured.
#[derive(Debug, Clone)]
pub struct TeeSettings {
    pub mode: TeeMode,
    pub dstack_endpoint: Option<String>,
    pub phala_endpoint: Option<String>,
}

impl TeeSettings {
    /// Pick the backend. Explicit modes require their endpoint.
    pub fn resolve(&self) -> Result<TeeBackend, String> {
        match self.mode {
            TeeMode::Dstack => self
                .dstack_endpoint
                .clone()
                .map(|endpoint| TeeBackend::Dstack { endpoint })
                .ok_or_else(|| "TEE_MODE=dstack requires DSTACK_ENDPOINT".to_string()),
            TeeMode::Phala => self
                .phala_endpoint
                .clone()
                .map(|endpoint| TeeBackend::Phala { endpoint })
                .ok_or_else(|| "TEE_MODE=phala requires PHALA_ENDPOINT".to_string()),
            TeeMode::Simulated => Ok(TeeBackend::Simulated),
            TeeMode::Auto => Ok(if let Some(endpoint) = self.dstack_endpoint.clone() {
                TeeBackend::Dstack { endpoint }
            } else if let Some(endpoint) = self.phala_endpoint.clone() {
                TeeBackend::Phala { endpoint }
            } else {
                TeeBackend::Simulated
            }),
        }
    }
}
