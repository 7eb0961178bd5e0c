// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Loaded once at startup by [`AuthAgentConfig::from_env`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `NODE_ID` | Node label, used as credential issuer name | `auth-agent-local` |
//! | `CLUSTER_ID` | Threshold cluster id | `oauth3-local` |
//! | `NODE_PRIVATE_KEY` | secp256k1 key, hex or PEM | Required off dev chains |
//! | `CHAIN_ID` | EVM chain id | `31337` |
//! | `IDENTITY_REGISTRY_ADDRESS` | Identity registry contract | Optional |
//! | `MPC_THRESHOLD` / `MPC_PARTIES` / `MPC_COORDINATOR_URL` | Threshold signing | Optional, all or none |
//! | `TEE_MODE` | `auto`, `dstack`, `phala`, `simulated` | `auto` |
//! | `DSTACK_ENDPOINT` / `PHALA_ENDPOINT` | Quote backends | Optional |
//! | `STORAGE_ENDPOINT` | Storage gateway | Required off dev chains |
//! | `NAME_RESOLVER_ENDPOINT` | Name-resolution service | Optional |
//! | `FARCASTER_HUB_ENDPOINT` | Farcaster Hub for fid custody checks | Required off dev chains |
//! | `{PROVIDER}_CLIENT_ID` / `{PROVIDER}_CLIENT_SECRET` | OAuth client | Checked on first use |
//! | `ALLOWED_ORIGINS` | Comma-separated CORS origins, `*` in dev only | dev: `*` |
//! | `HOST` / `PORT` | Bind address | `0.0.0.0` / `8080` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files for HTTPS | Optional, both or none |
//! | `LOG_FORMAT` | `json` or `pretty` | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! Development chains are `31337` (anvil/hardhat) and `1337` (ganache).
//! Only there may the node key be generated, the TEE be simulated, storage
//! be in-memory, Farcaster fids go unchecked, and CORS be a wildcard.

use std::collections::HashMap;
use std::str::FromStr;

use alloy::primitives::Address;
use tracing::warn;

use crate::crypto::NodeIdentity;
use crate::oauth::{AuthProvider, ProviderCredentials};
use crate::tee::{TeeBackend, TeeMode, TeeSettings};
use crate::threshold::MpcSettings;

pub const DEV_CHAIN_IDS: [u64; 2] = [31337, 1337];

const DEFAULT_NODE_ID: &str = "auth-agent-local";
const DEFAULT_CLUSTER_ID: &str = "oauth3-local";
const DEFAULT_CHAIN_ID: u64 = 31337;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("NODE_PRIVATE_KEY is required on chain {0}")]
    MissingNodeKey(u64),

    #[error("{var} is required on chain {chain_id}")]
    MissingRequired { var: &'static str, chain_id: u64 },

    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("MPC_THRESHOLD, MPC_PARTIES and MPC_COORDINATOR_URL must be set together")]
    PartialMpc,

    #[error("simulated attestation is not allowed on chain {0}")]
    SimulatedTee(u64),

    #[error("wildcard CORS origin is not allowed on chain {0}")]
    WildcardCors(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert_path: String,
    pub key_path: String,
}

#[derive(Debug, Clone)]
pub struct AuthAgentConfig {
    pub node_id: String,
    pub cluster_id: String,
    pub node_identity: NodeIdentity,
    /// The node key was generated at startup (development only).
    pub node_key_generated: bool,
    pub chain_id: u64,
    pub identity_registry: Option<Address>,
    pub mpc: Option<MpcSettings>,
    pub tee: TeeSettings,
    pub tee_backend: TeeBackend,
    pub storage_endpoint: Option<String>,
    pub name_resolver_endpoint: Option<String>,
    pub farcaster_hub_endpoint: Option<String>,
    pub provider_credentials: HashMap<AuthProvider, ProviderCredentials>,
    pub allowed_origins: CorsOrigins,
    pub host: String,
    pub port: u16,
    pub tls: Option<TlsPaths>,
}

impl AuthAgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let chain_id = match get("CHAIN_ID") {
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                var: "CHAIN_ID",
                reason: e.to_string(),
            })?,
            None => DEFAULT_CHAIN_ID,
        };
        let dev = is_dev_chain(chain_id);

        let (node_identity, node_key_generated) = match get("NODE_PRIVATE_KEY") {
            Some(raw) => (
                NodeIdentity::from_config_value(&raw).map_err(|reason| ConfigError::Invalid {
                    var: "NODE_PRIVATE_KEY",
                    reason,
                })?,
                false,
            ),
            None if dev => {
                warn!(chain_id, "NODE_PRIVATE_KEY not set; generating an ephemeral node key");
                (NodeIdentity::generate(), true)
            }
            None => return Err(ConfigError::MissingNodeKey(chain_id)),
        };

        let identity_registry = get("IDENTITY_REGISTRY_ADDRESS")
            .map(|raw| {
                Address::from_str(&raw).map_err(|e| ConfigError::Invalid {
                    var: "IDENTITY_REGISTRY_ADDRESS",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let mpc = parse_mpc(
            get("MPC_THRESHOLD"),
            get("MPC_PARTIES"),
            get("MPC_COORDINATOR_URL"),
        )?;

        let tee = TeeSettings {
            mode: match get("TEE_MODE") {
                Some(raw) => TeeMode::from_str(&raw)
                    .map_err(|reason| ConfigError::Invalid { var: "TEE_MODE", reason })?,
                None => TeeMode::Auto,
            },
            dstack_endpoint: get("DSTACK_ENDPOINT"),
            phala_endpoint: get("PHALA_ENDPOINT"),
        };
        let tee_backend = tee
            .resolve()
            .map_err(|reason| ConfigError::Invalid { var: "TEE_MODE", reason })?;
        if tee_backend == TeeBackend::Simulated && !dev {
            return Err(ConfigError::SimulatedTee(chain_id));
        }

        let storage_endpoint = get("STORAGE_ENDPOINT");
        if storage_endpoint.is_none() && !dev {
            return Err(ConfigError::MissingRequired {
                var: "STORAGE_ENDPOINT",
                chain_id,
            });
        }

        let farcaster_hub_endpoint = get("FARCASTER_HUB_ENDPOINT");
        if farcaster_hub_endpoint.is_none() && !dev {
            return Err(ConfigError::MissingRequired {
                var: "FARCASTER_HUB_ENDPOINT",
                chain_id,
            });
        }

        let provider_credentials = AuthProvider::OAUTH
            .into_iter()
            .filter_map(|provider| {
                let prefix = provider.env_prefix();
                let id = get(&format!("{prefix}_CLIENT_ID"))?;
                let secret = get(&format!("{prefix}_CLIENT_SECRET"))?;
                Some((provider, ProviderCredentials::new(id, secret)))
            })
            .collect();

        let allowed_origins = match get("ALLOWED_ORIGINS") {
            None if dev => CorsOrigins::Any,
            None => CorsOrigins::List(Vec::new()),
            Some(raw) => {
                let origins: Vec<String> = raw
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect();
                if origins.iter().any(|o| o == "*") {
                    if !dev {
                        return Err(ConfigError::WildcardCors(chain_id));
                    }
                    CorsOrigins::Any
                } else {
                    CorsOrigins::List(origins)
                }
            }
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let tls = match (get("TLS_CERT_PATH"), get("TLS_KEY_PATH")) {
            (Some(cert_path), Some(key_path)) => Some(TlsPaths { cert_path, key_path }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    var: "TLS_CERT_PATH",
                    reason: "TLS_CERT_PATH and TLS_KEY_PATH must be set together".to_string(),
                })
            }
        };

        Ok(Self {
            node_id: get("NODE_ID").unwrap_or_else(|| DEFAULT_NODE_ID.to_string()),
            cluster_id: get("CLUSTER_ID").unwrap_or_else(|| DEFAULT_CLUSTER_ID.to_string()),
            node_identity,
            node_key_generated,
            chain_id,
            identity_registry,
            mpc,
            tee,
            tee_backend,
            storage_endpoint,
            name_resolver_endpoint: get("NAME_RESOLVER_ENDPOINT"),
            farcaster_hub_endpoint,
            provider_credentials,
            allowed_origins,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            tls,
        })
    }

    pub fn is_dev(&self) -> bool {
        is_dev_chain(self.chain_id)
    }
}

pub fn is_dev_chain(chain_id: u64) -> bool {
    DEV_CHAIN_IDS.contains(&chain_id)
}

fn parse_mpc(
    threshold: Option<String>,
    parties: Option<String>,
    coordinator_url: Option<String>,
) -> Result<Option<MpcSettings>, ConfigError> {
    let (threshold, parties, coordinator_url) = match (threshold, parties, coordinator_url) {
        (None, None, None) => return Ok(None),
        (Some(t), Some(p), Some(u)) => (t, p, u),
        _ => return Err(ConfigError::PartialMpc),
    };

    let parse = |var: &'static str, raw: &str| {
        raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        })
    };
    let threshold = parse("MPC_THRESHOLD", &threshold)?;
    let parties = parse("MPC_PARTIES", &parties)?;

    if threshold == 0 || threshold > parties {
        return Err(ConfigError::Invalid {
            var: "MPC_THRESHOLD",
            reason: format!("threshold {threshold} must be between 1 and {parties}"),
        });
    }

    Ok(Some(MpcSettings {
        threshold,
        parties,
        coordinator_url,
    }))
}
