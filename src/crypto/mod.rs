// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key custody and signing primitives.
//!
//! - [`SessionKey`]: ephemeral secp256k1 key held by exactly one internal
//!   session. Never serialized; `Debug` is redacted.
//! - [`NodeIdentity`]: the node's long-lived issuer key, loaded from
//!   configuration.
//! - [`recover_personal_sign`]: EIP-191 signature recovery used by wallet and
//!   Farcaster sign-in.

pub mod keys;
pub mod signature;

pub use keys::{parse_private_key, NodeIdentity, SessionKey};
pub use signature::{decode_message, recover_personal_sign, verify_personal_sign};

use alloy::primitives::{keccak256, B256};

/// `keccak256` over length-prefixed parts, e.g. `hash_parts(&[b"session", id, pk])`.
///
/// Each part is preceded by its length as a big-endian `u32`, so no choice
/// of part contents can make two different tuples encode to the same bytes.
pub fn hash_parts(parts: &[&[u8]]) -> B256 {
    let mut buf = Vec::with_capacity(parts.iter().map(|p| p.len() + 4).sum());
    for part in parts {
        buf.extend_from_slice(&(part.len() as u32).to_be_bytes());
        buf.extend_from_slice(part);
    }
    keccak256(&buf)
}

/// Fill a buffer from the OS CSPRNG.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], crate::error::AgentError> {
    use ring::rand::{SecureRandom, SystemRandom};

    let mut out = [0u8; N];
    SystemRandom::new()
        .fill(&mut out)
        .map_err(|_| crate::error::AgentError::Internal("system RNG unavailable".to_string()))?;
    Ok(out)
}
