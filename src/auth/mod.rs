// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Alternate Authentication
//!
//! Sign-in without an OAuth provider. Both handlers verify a real EIP-191
//! signature before minting a session through the session engine.
//!
//! | Handler | Proves control of | Identity |
//! |---------|-------------------|----------|
//! | [`auth_wallet`] | `address` | `hash_parts("wallet", address)` |
//! | [`auth_farcaster`] | `custodyAddress`, which must hold `fid` | `hash_parts("farcaster", fid)` |

pub mod farcaster;
pub mod wallet;

pub use farcaster::{
    auth_farcaster, farcaster_challenge, CustodyRegistry, FarcasterAuthRequest,
    HubCustodyRegistry,
};
pub use wallet::{auth_wallet, WalletAuthRequest};

use std::str::FromStr;

use alloy::primitives::Address;

use crate::error::{AgentError, AgentResult};

/// Parse a 0x-prefixed 20-byte address.
pub(crate) fn parse_address(field: &str, raw: &str) -> AgentResult<Address> {
    let trimmed = raw.trim();
    if !trimmed.starts_with("0x") {
        return Err(AgentError::validation(format!("{field} must be 0x-prefixed")));
    }
    Address::from_str(trimmed)
        .map_err(|_| AgentError::validation(format!("{field} is not a valid address")))
}
