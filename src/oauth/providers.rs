// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OAuth provider descriptor table and profile normalization.
//!
//! A descriptor carries everything provider-specific, including the
//! function that maps the provider's userinfo body to [`ProviderProfile`].
//! Supporting another provider means adding one descriptor.
//!
//! | Provider | PKCE | Client auth | Profile source |
//! |----------|------|-------------|----------------|
//! | Google | S256 | form | userinfo endpoint |
//! | GitHub | - | form | `/user` (needs `User-Agent`) |
//! | Twitter | S256 | HTTP basic | `/2/users/me` |
//! | Discord | - | form | `/users/@me` |
//! | Apple | - | form | signed `id_token` |

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AuthProvider;
use crate::error::{AgentError, AgentResult};

pub const APPLE_ISSUER: &str = "https://appleid.apple.com";

/// Maps a userinfo response body to the normalized profile.
pub type ProfileMapper = fn(&[u8]) -> AgentResult<ProviderProfile>;

/// Where the normalized profile comes from.
#[derive(Debug, Clone)]
pub enum ProfileSource {
    /// Bearer-authenticated GET, parsed by `map`.
    UserInfo { url: String, map: ProfileMapper },
    /// `id_token` from the token response, verified against a JWKS.
    IdToken { jwks_url: String, issuer: String },
}

#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub provider: AuthProvider,
    pub authorize_url: String,
    pub token_url: String,
    pub scope: &'static str,
    pub pkce: bool,
    /// Send client credentials as HTTP basic auth instead of form fields.
    pub basic_auth: bool,
    pub extra_params: &'static [(&'static str, &'static str)],
    pub profile: ProfileSource,
}

impl ProviderDescriptor {
    /// Built-in descriptor, `None` for providers that do not use OAuth.
    pub fn builtin(provider: AuthProvider) -> Option<Self> {
        let descriptor = match provider {
            AuthProvider::Google => Self {
                provider,
                authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".into(),
                token_url: "https://oauth2.googleapis.com/token".into(),
                scope: "openid email profile",
                pkce: true,
                basic_auth: false,
                extra_params: &[("access_type", "online")],
                profile: ProfileSource::UserInfo {
                    url: "https://www.googleapis.com/oauth2/v3/userinfo".into(),
                    map: google_profile,
                },
            },
            AuthProvider::Github => Self {
                provider,
                authorize_url: "https://github.com/login/oauth/authorize".into(),
                token_url: "https://github.com/login/oauth/access_token".into(),
                scope: "read:user user:email",
                pkce: false,
                basic_auth: false,
                extra_params: &[],
                profile: ProfileSource::UserInfo {
                    url: "https://api.github.com/user".into(),
                    map: github_profile,
                },
            },
            AuthProvider::Twitter => Self {
                provider,
                authorize_url: "https://twitter.com/i/oauth2/authorize".into(),
                token_url: "https://api.twitter.com/2/oauth2/token".into(),
                scope: "tweet.read users.read",
                pkce: true,
                basic_auth: true,
                extra_params: &[],
                profile: ProfileSource::UserInfo {
                    url: "https://api.twitter.com/2/users/me?user.fields=profile_image_url".into(),
                    map: twitter_profile,
                },
            },
            AuthProvider::Discord => Self {
                provider,
                authorize_url: "https://discord.com/oauth2/authorize".into(),
                token_url: "https://discord.com/api/oauth2/token".into(),
                scope: "identify email",
                pkce: false,
                basic_auth: false,
                extra_params: &[("prompt", "consent")],
                profile: ProfileSource::UserInfo {
                    url: "https://discord.com/api/users/@me".into(),
                    map: discord_profile,
                },
            },
            AuthProvider::Apple => Self {
                provider,
                authorize_url: "https://appleid.apple.com/auth/authorize".into(),
                token_url: "https://appleid.apple.com/auth/token".into(),
                scope: "name email",
                pkce: false,
                basic_auth: false,
                extra_params: &[("response_mode", "form_post")],
                profile: ProfileSource::IdToken {
                    jwks_url: "https://appleid.apple.com/auth/keys".into(),
                    issuer: APPLE_ISSUER.into(),
                },
            },
            AuthProvider::Farcaster | AuthProvider::Wallet => return None,
        };
        Some(descriptor)
    }
}

/// Provider-independent profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProviderProfile {
    pub id: String,
    pub handle: Option<String>,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// Token endpoint response. Anything without an access token is a failure,
/// including GitHub's `200 {"error": ...}`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
}

#[derive(Deserialize)]
struct GoogleProfile {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Deserialize)]
struct GithubProfile {
    id: u64,
    login: String,
    name: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Deserialize)]
struct TwitterEnvelope {
    data: TwitterUser,
}

#[derive(Deserialize)]
struct TwitterUser {
    id: String,
    username: String,
    name: Option<String>,
    profile_image_url: Option<String>,
}

#[derive(Deserialize)]
struct DiscordProfile {
    id: String,
    username: String,
    global_name: Option<String>,
    avatar: Option<String>,
}

/// Verified Apple `id_token` claims.
#[derive(Debug, Deserialize)]
pub struct AppleClaims {
    pub sub: String,
    pub email: Option<String>,
}

impl From<AppleClaims> for ProviderProfile {
    fn from(claims: AppleClaims) -> Self {
        ProviderProfile {
            id: claims.sub,
            handle: claims.email,
            name: None,
            avatar: None,
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(provider: AuthProvider, body: &[u8]) -> AgentResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| AgentError::upstream(format!("malformed {provider} profile: {e}")))
}

fn google_profile(body: &[u8]) -> AgentResult<ProviderProfile> {
    let p: GoogleProfile = parse(AuthProvider::Google, body)?;
    Ok(ProviderProfile {
        id: p.sub,
        handle: p.email,
        name: p.name,
        avatar: p.picture,
    })
}

fn github_profile(body: &[u8]) -> AgentResult<ProviderProfile> {
    let p: GithubProfile = parse(AuthProvider::Github, body)?;
    Ok(ProviderProfile {
        id: p.id.to_string(),
        handle: Some(p.login),
        name: p.name,
        avatar: p.avatar_url,
    })
}

fn twitter_profile(body: &[u8]) -> AgentResult<ProviderProfile> {
    let p: TwitterEnvelope = parse(AuthProvider::Twitter, body)?;
    Ok(ProviderProfile {
        id: p.data.id,
        handle: Some(p.data.username),
        name: p.data.name,
        avatar: p.data.profile_image_url,
    })
}

fn discord_profile(body: &[u8]) -> AgentResult<ProviderProfile> {
    let p: DiscordProfile = parse(AuthProvider::Discord, body)?;
    let avatar = p
        .avatar
        .map(|hash| format!("https://cdn.discordapp.com/avatars/{}/{hash}.png", p.id));
    Ok(ProviderProfile {
        id: p.id,
        handle: Some(p.username),
        name: p.global_name,
        avatar,
    })
}

/// Run the descriptor's mapper and reject profiles without a subject id.
pub fn normalize_profile(
    provider: AuthProvider,
    map: ProfileMapper,
    body: &[u8],
) -> AgentResult<ProviderProfile> {
    let profile = map(body)?;
    if profile.id.is_empty() {
        return Err(AgentError::upstream(format!("{provider} profile has no id")));
    }
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    /// Normalize through the built-in descriptor's own mapper.
    fn normalize(provider: AuthProvider, raw: &[u8]) -> AgentResult<ProviderProfile> {
        match ProviderDescriptor::builtin(provider).unwrap().profile {
            ProfileSource::UserInfo { map, .. } => normalize_profile(provider, map, raw),
            ProfileSource::IdToken { .. } => panic!("{provider} has no userinfo mapper"),
        }
    }

    #[test]
    fn every_oauth_provider_has_a_descriptor() {
        for provider in AuthProvider::OAUTH {
            let descriptor = ProviderDescriptor::builtin(provider).unwrap();
            assert!(descriptor.authorize_url.starts_with("https://"));
            assert!(descriptor.token_url.starts_with("https://"));
        }
        assert!(ProviderDescriptor::builtin(AuthProvider::Wallet).is_none());
        assert!(ProviderDescriptor::builtin(AuthProvider::Farcaster).is_none());
    }

    #[test]
    fn normalizes_github_numeric_id() {
        let profile = normalize(
            AuthProvider::Github,
            &body(json!({ "id": 583231, "login": "octocat", "name": null, "avatar_url": "https://a/x.png" })),
        )
        .unwrap();
        assert_eq!(profile.id, "583231");
        assert_eq!(profile.handle.as_deref(), Some("octocat"));
        assert_eq!(profile.name, None);
    }

    #[test]
    fn normalizes_twitter_envelope() {
        let profile = normalize(
            AuthProvider::Twitter,
            &body(json!({ "data": { "id": "2244994945", "username": "TwitterDev", "name": "Twitter Dev" } })),
        )
        .unwrap();
        assert_eq!(profile.id, "2244994945");
        assert_eq!(profile.handle.as_deref(), Some("TwitterDev"));
    }

    #[test]
    fn discord_avatar_hash_becomes_cdn_url() {
        let profile = normalize(
            AuthProvider::Discord,
            &body(json!({ "id": "80351110224678912", "username": "nelly", "avatar": "8342729096ea3675442027381ff50dfe" })),
        )
        .unwrap();
        assert_eq!(
            profile.avatar.as_deref(),
            Some("https://cdn.discordapp.com/avatars/80351110224678912/8342729096ea3675442027381ff50dfe.png")
        );
    }

    #[test]
    fn malformed_profile_is_upstream_error() {
        let result = normalize(AuthProvider::Google, &body(json!({ "email": "a@b.c" })));
        assert!(matches!(result, Err(AgentError::Upstream(_))));

        let result = normalize(AuthProvider::Google, &body(json!({ "sub": "" })));
        assert!(matches!(result, Err(AgentError::Upstream(_))));
    }

    #[test]
    fn descriptor_mapper_drives_normalization() {
        fn uid_profile(body: &[u8]) -> AgentResult<ProviderProfile> {
            let value: serde_json::Value = serde_json::from_slice(body)
                .map_err(|e| AgentError::upstream(e.to_string()))?;
            Ok(ProviderProfile {
                id: value["uid"].as_str().unwrap_or_default().to_string(),
                handle: None,
                name: None,
                avatar: None,
            })
        }

        let profile = normalize_profile(
            AuthProvider::Google,
            uid_profile,
            &body(json!({ "uid": "u-77" })),
        )
        .unwrap();
        assert_eq!(profile.id, "u-77");

        assert!(matches!(
            normalize_profile(AuthProvider::Google, uid_profile, &body(json!({}))),
            Err(AgentError::Upstream(_))
        ));
    }

    #[test]
    fn github_error_body_is_not_a_token() {
        let result: Result<TokenResponse, _> =
            serde_json::from_value(json!({ "error": "bad_verification_code" }));
        assert!(result.is_err());
    }
}
