//! Session data model and cookie handling

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::cookie::Jar;
use serde::{Deserialize, Serialize};

use crate::error::{NlmError, Result};

/// Primary cookie domain.
pub const GOOGLE_DOMAIN: &str = ".google.com";
/// Artifact bytes are served from this CDN-like domain; auth cookies must
/// be duplicated onto it or downloads redirect to the login page.
pub const USERCONTENT_DOMAIN: &str = ".googleusercontent.com";

/// A single cookie record as exported by browser automation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Auth cookies, either as a simple name→value map or as ordered records
/// preserving domain/path (the browser-automation export format).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Cookies {
    Records(Vec<CookieRecord>),
    Simple(BTreeMap<String, String>),
}

impl Cookies {
    /// True when no cookies are present at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Cookies::Records(records) => records.is_empty(),
            Cookies::Simple(map) => map.is_empty(),
        }
    }

    /// Flatten to (name, value, domain, path) tuples. Simple maps default
    /// to the primary Google domain.
    pub fn entries(&self) -> Vec<(String, String, String, String)> {
        match self {
            Cookies::Records(records) => records
                .iter()
                .filter(|c| !c.name.is_empty())
                .map(|c| {
                    (
                        c.name.clone(),
                        c.value.clone(),
                        c.domain.clone().unwrap_or_else(|| GOOGLE_DOMAIN.to_string()),
                        c.path.clone().unwrap_or_else(|| "/".to_string()),
                    )
                })
                .collect(),
            Cookies::Simple(map) => map
                .iter()
                .map(|(name, value)| {
                    (
                        name.clone(),
                        value.clone(),
                        GOOGLE_DOMAIN.to_string(),
                        "/".to_string(),
                    )
                })
                .collect(),
        }
    }
}

/// An authenticated session against the counterpart.
///
/// Cookies are mandatory; the CSRF token and session id are optional and
/// re-derived from a page fetch when absent or stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub cookies: Cookies,
    #[serde(default)]
    pub csrf_token: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub extracted_at: DateTime<Utc>,
}

impl Session {
    /// Create a session from cookies alone; tokens are derived later.
    pub fn from_cookies(cookies: Cookies) -> Self {
        Self {
            cookies,
            csrf_token: None,
            session_id: None,
            extracted_at: Utc::now(),
        }
    }

    /// Return a new session with fresh tokens and the same cookies.
    ///
    /// Recovery returns a value instead of mutating in place so the auth
    /// state machine stays testable in isolation.
    pub fn with_tokens(&self, csrf_token: Option<String>, session_id: Option<String>) -> Self {
        Self {
            cookies: self.cookies.clone(),
            csrf_token,
            session_id,
            extracted_at: Utc::now(),
        }
    }

    /// Return a new session with the tokens cleared so they re-derive.
    pub fn without_tokens(&self) -> Self {
        self.with_tokens(None, None)
    }

    /// Build a cookie jar for reqwest, duplicating `.google.com` cookies
    /// onto `.googleusercontent.com` so redirects to the artifact CDN stay
    /// authenticated.
    pub fn cookie_jar(&self) -> Result<Arc<Jar>> {
        if self.cookies.is_empty() {
            return Err(NlmError::Authentication(
                "Session has no cookies; run `nlm login` first".to_string(),
            )
            .into());
        }

        let jar = Jar::default();
        for (name, value, domain, path) in self.cookies.entries() {
            add_cookie(&jar, &name, &value, &domain, &path)?;
            if domain == GOOGLE_DOMAIN {
                add_cookie(&jar, &name, &value, USERCONTENT_DOMAIN, &path)?;
            }
        }
        Ok(Arc::new(jar))
    }
}

fn add_cookie(jar: &Jar, name: &str, value: &str, domain: &str, path: &str) -> Result<()> {
    let host = domain.trim_start_matches('.');
    let url = url::Url::parse(&format!("https://{}/", host))
        .map_err(|e| NlmError::Authentication(format!("Invalid cookie domain {}: {}", domain, e)))?;
    let cookie = format!("{}={}; Domain={}; Path={}", name, value, host, path);
    jar.add_cookie_str(&cookie, &url);
    Ok(())
}
