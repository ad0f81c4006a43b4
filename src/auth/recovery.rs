//! Token refresh by page scraping
//!
//! The CSRF token (`SNlM0e`) and session id (`FdrFJe`) live in the
//! application page's inline script data. A refresh fetches the root page
//! with only the cookies, detects a redirect to the login host (cookies
//! dead), and otherwise scrapes fresh tokens out of the HTML.

use regex::Regex;

use crate::auth::session::Session;

/// Redirects landing on this host mean the cookies themselves are dead and
/// no token refresh can help.
pub const LOGIN_HOST: &str = "accounts.google.com";

/// Headers that make the page fetch look like a browser navigation; the
/// counterpart serves a stub page to anything else.
pub const PAGE_FETCH_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36",
    ),
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-User", "?1"),
];

/// Why a token refresh failed. Internal to the recovery ladder: a
/// [`RefreshFailure::CookiesExpired`] advances it to the disk-reload layer,
/// everything else is a refresh-layer failure.
#[derive(Debug)]
pub enum RefreshFailure {
    /// The page fetch redirected to the login host.
    CookiesExpired,
    /// The page loaded but the token patterns were absent.
    TokenMissing(String),
    /// The page fetch itself failed.
    Fetch(String),
}

impl std::fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshFailure::CookiesExpired => write!(f, "cookies expired (redirected to login)"),
            RefreshFailure::TokenMissing(details) => write!(f, "token not found: {}", details),
            RefreshFailure::Fetch(details) => write!(f, "page fetch failed: {}", details),
        }
    }
}

/// Extract the CSRF token (`"SNlM0e":"…"`) from page HTML.
pub fn scrape_csrf_token(html: &str) -> Option<String> {
    let re = Regex::new(r#""SNlM0e":"([^"]+)""#).expect("static regex compiles");
    re.captures(html).map(|c| c[1].to_string())
}

/// Extract the session id (`"FdrFJe":"…"`) from page HTML.
pub fn scrape_session_id(html: &str) -> Option<String> {
    let re = Regex::new(r#""FdrFJe":"([^"]+)""#).expect("static regex compiles");
    re.captures(html).map(|c| c[1].to_string())
}

/// Fetch the application root page and derive a refreshed session.
///
/// Returns a *new* [`Session`] value carrying the same cookies and freshly
/// scraped tokens; the caller decides what to swap and persist.
pub async fn refresh_session(
    http: &reqwest::Client,
    base_url: &str,
    session: &Session,
) -> std::result::Result<Session, RefreshFailure> {
    let mut request = http.get(format!("{}/", base_url.trim_end_matches('/')));
    for (name, value) in PAGE_FETCH_HEADERS {
        request = request.header(*name, *value);
    }

    let response = request
        .send()
        .await
        .map_err(|e| RefreshFailure::Fetch(e.to_string()))?;

    if response.url().as_str().contains(LOGIN_HOST) {
        return Err(RefreshFailure::CookiesExpired);
    }

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(RefreshFailure::Fetch(format!("HTTP {}", status)));
    }

    let html = response
        .text()
        .await
        .map_err(|e| RefreshFailure::Fetch(e.to_string()))?;

    let csrf_token = scrape_csrf_token(&html).ok_or_else(|| {
        RefreshFailure::TokenMissing(
            "CSRF token pattern not present; the page structure may have changed".to_string(),
        )
    })?;
    let session_id = scrape_session_id(&html);

    tracing::debug!("Refreshed auth tokens from page scrape");
    Ok(session.with_tokens(Some(csrf_token), session_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"<script>window.WIZ_global_data = {"SNlM0e":"AGXr:17663723","FdrFJe":"1975517010764758431","other":"x"};</script>"#;

    #[test]
    fn test_scrape_csrf_token() {
        assert_eq!(
            scrape_csrf_token(SAMPLE_HTML).as_deref(),
            Some("AGXr:17663723")
        );
        assert!(scrape_csrf_token("<html>no tokens here</html>").is_none());
    }

    #[test]
    fn test_scrape_session_id() {
        assert_eq!(
            scrape_session_id(SAMPLE_HTML).as_deref(),
            Some("1975517010764758431")
        );
        assert!(scrape_session_id("<html></html>").is_none());
    }
}
