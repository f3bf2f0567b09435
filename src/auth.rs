//! Session context
//!
//! The only place a [`Session`] is built. Everything else receives one
//! explicitly (request extension or the refresher's service session) and can
//! only read it.

use axum::http::{header, HeaderMap};

/// Session cookie name, set by the SPA after login
pub const SESSION_COOKIE: &str = "ct_session";

#[derive(Debug, Clone)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    /// Session used by background work, authenticated with `API_TOKEN` if set.
    pub fn service(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Session carried by an incoming request, if it presents a token.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let token = extract_bearer_token(headers).or_else(|| extract_session_token(headers))?;
        Some(Self { token: Some(token) })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

    for cookie in cookie_header.split(';') {
        let cookie = cookie.trim();
        if let Some(value) = cookie.strip_prefix(&format!("{}=", SESSION_COOKIE)) {
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    None
}
