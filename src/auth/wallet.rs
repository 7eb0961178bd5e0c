// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Raw wallet sign-in (EIP-191).

use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::parse_address;
use crate::crypto::{decode_message, verify_personal_sign};
use crate::error::{AgentError, AgentResult};
use crate::oauth::AuthProvider;
use crate::session::{Session, SessionEngine, SessionRequest};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletAuthRequest {
    #[schema(example = "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12")]
    pub address: String,
    /// 65-byte signature (hex).
    pub signature: String,
    /// Signed text, or `0x`-prefixed bytes.
    pub message: String,
    pub app_id: String,
}

pub async fn auth_wallet(engine: &SessionEngine, request: &WalletAuthRequest) -> AgentResult<Session> {
    let address = parse_address("address", &request.address)?;
    if request.message.is_empty() {
        return Err(AgentError::validation("message is required"));
    }
    if request.app_id.trim().is_empty() {
        return Err(AgentError::validation("appId is required"));
    }

    let message = decode_message(&request.message);
    if let Err(e) = verify_personal_sign(address, &message, &request.signature) {
        warn!(address = %address, "Wallet signature rejected");
        return Err(e);
    }

    let session = engine
        .create_session(SessionRequest {
            provider: AuthProvider::Wallet,
            provider_id: alloy::hex::encode_prefixed(address),
            handle: None,
            app_id: request.app_id.clone(),
            session_id: None,
            smart_account: Some(address),
        })
        .await?;

    info!(address = %address, session_id = %session.session_id, "Wallet sign-in");
    Ok(session)
}
