// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Redirect URI policy.
//!
//! | Rule | Applies |
//! |------|---------|
//! | `https` scheme | always |
//! | `http://localhost`, `http://127.0.0.1` | development only |
//! | no fragment | always |
//! | no `//host` protocol-relative form | always |
//! | no userinfo (`user@host`) | always |
//! | no CR / LF / backslash | always |
//!
//! Raw-string checks run before parsing because the URL parser normalizes
//! some of these away.

use url::{Host, Url};

use crate::error::{AgentError, AgentResult};

pub fn validate_redirect_uri(raw: &str, dev_mode: bool) -> AgentResult<Url> {
    if raw.is_empty() {
        return Err(AgentError::validation("redirectUri is required"));
    }
    if raw.contains(['\r', '\n']) {
        return Err(AgentError::validation("redirectUri must not contain CR or LF"));
    }
    if raw.contains('\\') {
        return Err(AgentError::validation("redirectUri must not contain a backslash"));
    }
    if raw.starts_with("//") {
        return Err(AgentError::validation("redirectUri must not be protocol-relative"));
    }
    if raw.contains('#') {
        return Err(AgentError::validation("redirectUri must not contain a fragment"));
    }

    let url = Url::parse(raw)
        .map_err(|e| AgentError::validation(format!("redirectUri is not a valid URI: {e}")))?;

    if !url.username().is_empty() || url.password().is_some() {
        return Err(AgentError::validation("redirectUri must not contain credentials"));
    }

    let host = url
        .host()
        .ok_or_else(|| AgentError::validation("redirectUri must have a host"))?;

    match url.scheme() {
        "https" => Ok(url),
        "http" if dev_mode && is_loopback(&host) => Ok(url),
        "http" => Err(AgentError::validation(
            "redirectUri must use https (http is allowed only for localhost in development)",
        )),
        other => Err(AgentError::validation(format!(
            "redirectUri scheme '{other}' is not allowed"
        ))),
    }
}

fn is_loopback(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => *domain == "localhost",
        Host::Ipv4(ip) => ip.octets() == [127, 0, 0, 1],
        Host::Ipv6(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_https() {
        let url = validate_redirect_uri("https://app.example/callback?x=1", false).unwrap();
        assert_eq!(url.host_str(), Some("app.example"));
    }

    #[test]
    fn loopback_http_only_in_development() {
        assert!(validate_redirect_uri("http://localhost:3000/cb", true).is_ok());
        assert!(validate_redirect_uri("http://127.0.0.1:3000/cb", true).is_ok());
        assert!(validate_redirect_uri("http://localhost:3000/cb", false).is_err());
        assert!(validate_redirect_uri("http://evil.com/cb", true).is_err());
        assert!(validate_redirect_uri("http://evil.com/cb", false).is_err());
    }

    #[test]
    fn rejects_injection_shapes() {
        let cases = [
            "https://app.example/cb#frag",
            "//evil.com/cb",
            "https://user@evil.com/cb",
            "https://user:pw@app.example/cb",
            "https://app.example/cb\r\nSet-Cookie: x",
            "https://app.example/cb\nx",
            "https:\\\\evil.com",
            "javascript:alert(1)",
            "ftp://app.example/cb",
            "not a uri",
            "",
        ];
        for case in cases {
            assert!(
                matches!(validate_redirect_uri(case, true), Err(AgentError::Validation(_))),
                "accepted {case:?}"
            );
        }
    }
}
