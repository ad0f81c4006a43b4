//! Shared helpers for integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::time::Duration;

use nlm::auth::{Cookies, Session};
use nlm::rpc::RetryPolicy;

/// Session with a single cookie and no tokens.
pub fn test_session() -> Session {
    let mut cookies = BTreeMap::new();
    cookies.insert("SID".to_string(), "test-cookie".to_string());
    Session::from_cookies(Cookies::Simple(cookies))
}

/// Retry policy with zero delays so tests run instantly.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::ZERO, Duration::ZERO)
}

/// Build a batchexecute response body for one RPC result payload.
///
/// `payload` is the result value as it appears *inside* the double
/// encoding, i.e. a JSON document serialized to a string.
pub fn rpc_body(rpc_id: &str, payload: &str) -> String {
    let chunk = serde_json::to_string(&serde_json::json!([[
        "wrb.fr",
        rpc_id,
        payload,
        null,
        null,
        null,
        "generic"
    ]]))
    .unwrap();
    format!(")]}}'\n\n{}\n{}\n", chunk.len(), chunk)
}

/// Batchexecute body carrying the error-16 (auth expired) signature.
pub fn rpc_error_16_body(rpc_id: &str) -> String {
    let chunk = serde_json::to_string(&serde_json::json!([[
        "wrb.fr",
        rpc_id,
        null,
        null,
        null,
        [16],
        "generic"
    ]]))
    .unwrap();
    format!(")]}}'\n\n{}\n{}\n", chunk.len(), chunk)
}

/// Page HTML carrying scrapeable CSRF and session tokens.
pub fn page_html(csrf: &str, sid: &str) -> String {
    format!(
        "<!DOCTYPE html><html><script>window.WIZ_global_data = \
         {{\"SNlM0e\":\"{}\",\"FdrFJe\":\"{}\"}};</script></html>",
        csrf, sid
    )
}
