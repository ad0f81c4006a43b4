//! Batchexecute request envelope construction
//!
//! The wire format wraps the call parameters twice: params are serialized
//! as compact JSON, embedded as a *string* inside the outer
//! `[[[rpc_id, params_json, null, "generic"]]]` array, which is then
//! JSON-encoded again and percent-encoded into a form body. The double
//! encoding is load-bearing; the counterpart rejects single-encoded
//! bodies.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

/// Application origin.
pub const BASE_URL: &str = "https://notebooklm.google.com";
/// Batched RPC endpoint.
pub const BATCHEXECUTE_PATH: &str = "/_/LabsTailwindUi/data/batchexecute";
/// Resumable-upload endpoint (separate host path).
pub const UPLOAD_PATH: &str = "/upload/_/";

/// Frontend build label sent as the `bl` query parameter. The counterpart
/// occasionally requires a recent value; override via `NLM_BL`.
pub const DEFAULT_BUILD_LABEL: &str = "boq_labs-tailwind-frontend_20260108.06_p0";

/// Environment variable overriding [`DEFAULT_BUILD_LABEL`].
pub const BUILD_LABEL_ENV: &str = "NLM_BL";

// Percent-encode everything except unreserved characters, including `/`.
// Equivalent to Python's urllib.parse.quote(s, safe='').
const FORM_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Build the form body for a batchexecute POST.
///
/// Produces `f.req=<encoded>&at=<csrf>&` with a trailing `&` to match the
/// frontend's own requests. The `at` parameter is omitted when no CSRF
/// token is known (read-only RPCs tolerate this).
pub fn build_request_body(rpc_id: &str, params: &Value, csrf_token: Option<&str>) -> String {
    // Compact separators; the counterpart is whitespace-sensitive in at
    // least one code path.
    let params_json = serde_json::to_string(params).unwrap_or_else(|_| "null".to_string());

    let f_req = Value::Array(vec![Value::Array(vec![Value::Array(vec![
        Value::String(rpc_id.to_string()),
        Value::String(params_json),
        Value::Null,
        Value::String("generic".to_string()),
    ])])]);
    let f_req_json = serde_json::to_string(&f_req).unwrap_or_default();

    let mut body = format!(
        "f.req={}",
        utf8_percent_encode(&f_req_json, FORM_ENCODE)
    );

    if let Some(token) = csrf_token {
        body.push_str("&at=");
        body.push_str(&utf8_percent_encode(token, FORM_ENCODE).to_string());
    }

    body.push('&');
    body
}

/// Current build label, honoring the `NLM_BL` override.
pub fn build_label() -> String {
    std::env::var(BUILD_LABEL_ENV).unwrap_or_else(|_| DEFAULT_BUILD_LABEL.to_string())
}

/// Build the batchexecute URL with query parameters.
///
/// `base_url` is the application origin (overridable for tests),
/// `source_path` tags which frontend view issued the call.
pub fn build_url(
    base_url: &str,
    rpc_id: &str,
    source_path: &str,
    session_id: Option<&str>,
) -> String {
    let mut url = url::Url::parse(base_url)
        .unwrap_or_else(|_| url::Url::parse(BASE_URL).expect("static URL parses"));
    url.set_path(BATCHEXECUTE_PATH);

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("rpcids", rpc_id);
        query.append_pair("source-path", source_path);
        query.append_pair("bl", &build_label());
        query.append_pair("hl", "en");
        query.append_pair("rt", "c");
        if let Some(sid) = session_id {
            query.append_pair("f.sid", sid);
        }
    }

    url.to_string()
}
