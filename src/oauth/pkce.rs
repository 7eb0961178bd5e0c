// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! PKCE (RFC 7636) verifier and `S256` challenge.

use base64ct::{Base64UrlUnpadded, Encoding};
use sha2::{Digest, Sha256};

use crate::crypto::random_bytes;
use crate::error::AgentResult;

/// 43-character verifier from 32 random bytes.
pub fn generate_verifier() -> AgentResult<String> {
    let bytes = random_bytes::<32>()?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// `BASE64URL(SHA256(verifier))`.
pub fn s256_challenge(verifier: &str) -> String {
    Base64UrlUnpadded::encode_string(&Sha256::digest(verifier.as_bytes()))
}
