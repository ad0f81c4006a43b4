//! Batchexecute response parsing
//!
//! Responses are prefixed with the `)]}'` anti-XSSI guard, followed by a
//! sequence of lines alternating between byte counts and JSON arrays. Some
//! responses omit the byte counts entirely, so the parser tolerates both
//! interleavings and silently skips malformed lines.

use serde_json::Value;

use crate::error::{NlmError, Result};

/// Anti-XSSI prefix stripped before parsing.
pub const XSSI_PREFIX: &str = ")]}'";

/// Sentinel tag identifying an RPC result chunk.
const RESULT_TAG: &str = "wrb.fr";

/// Parse a raw batchexecute response body into decoded JSON chunks.
pub fn parse_response(response_text: &str) -> Vec<Value> {
    let text = response_text
        .strip_prefix(XSSI_PREFIX)
        .unwrap_or(response_text);

    let lines: Vec<&str> = text.trim().split('\n').collect();
    let mut results = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() {
            i += 1;
            continue;
        }

        if line.parse::<u64>().is_ok() {
            // Byte-count line; the next line carries the JSON payload.
            i += 1;
            if i < lines.len() {
                if let Ok(value) = serde_json::from_str::<Value>(lines[i]) {
                    results.push(value);
                }
            }
            i += 1;
        } else {
            // Bare JSON line without a preceding count.
            if let Ok(value) = serde_json::from_str::<Value>(line) {
                results.push(value);
            }
            i += 1;
        }
    }

    results
}

/// Extract the result payload for a specific RPC id from parsed chunks.
///
/// Scans for `["wrb.fr", rpc_id, payload, ...]`. The payload is itself a
/// JSON string that is re-parsed; if re-parsing fails the raw string is
/// returned. The 16-element error signature
/// `["wrb.fr", rpc_id, null, null, null, [16], "generic"]` denotes an
/// expired session and raises an authentication error instead of data.
pub fn extract_result(chunks: &[Value], rpc_id: &str) -> Result<Option<Value>> {
    for chunk in chunks {
        let Some(items) = chunk.as_array() else {
            continue;
        };
        for item in items {
            let Some(entry) = item.as_array() else {
                continue;
            };
            if entry.len() < 3 {
                continue;
            }
            if entry[0].as_str() != Some(RESULT_TAG) || entry[1].as_str() != Some(rpc_id) {
                continue;
            }

            if is_auth_error_signature(entry) {
                return Err(NlmError::Authentication(
                    "RPC Error 16: Authentication expired".to_string(),
                )
                .into());
            }

            let payload = &entry[2];
            if let Some(raw) = payload.as_str() {
                return Ok(Some(
                    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())),
                ));
            }
            return Ok(Some(payload.clone()));
        }
    }
    Ok(None)
}

/// Error signature: position 6 holds "generic" and position 5 is a list
/// containing the integer 16.
fn is_auth_error_signature(entry: &[Value]) -> bool {
    if entry.len() <= 6 || entry[6].as_str() != Some("generic") {
        return false;
    }
    entry[5]
        .as_array()
        .map(|codes| codes.iter().any(|c| c.as_i64() == Some(16)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wrap(inner: &str) -> String {
        format!(")]}}'\n{}\n{}\n", inner.len(), inner)
    }

    #[test]
    fn test_parse_strips_xssi_prefix() {
        let body = wrap(r#"[["wrb.fr","wXbhsf","[]",null,null,null,"generic"]]"#);
        let chunks = parse_response(&body);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0][0][0], "wrb.fr");
    }

    #[test]
    fn test_parse_counts_interleaved_chunks() {
        let a = r#"[["wrb.fr","aaa","[1]",null,null,null,"generic"]]"#;
        let b = r#"[["di",12],["af.httprm",12,"123",7]]"#;
        let body = format!(")]}}'\n{}\n{}\n{}\n{}\n", a.len(), a, b.len(), b);
        let chunks = parse_response(&body);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_parse_tolerates_bare_json_lines() {
        let body = format!(
            ")]}}'\n{}\n{}\n",
            r#"[["wrb.fr","aaa","[1]"]]"#,
            r#"[["di",12]]"#
        );
        let chunks = parse_response(&body);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let body = ")]}'\n17\nnot valid json {{\n[[\"di\",3]]\n";
        let chunks = parse_response(body);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_extract_result_reparses_payload_string() {
        let chunks = vec![json!([[
            "wrb.fr",
            "wXbhsf",
            "[[\"nb-1\",\"My Notebook\"]]",
            null
        ]])];
        let result = extract_result(&chunks, "wXbhsf").unwrap().unwrap();
        assert_eq!(result[0][0], "nb-1");
    }

    #[test]
    fn test_extract_result_returns_raw_string_when_not_json() {
        let chunks = vec![json!([["wrb.fr", "aaa", "not json at all"]])];
        let result = extract_result(&chunks, "aaa").unwrap().unwrap();
        assert_eq!(result, Value::String("not json at all".to_string()));
    }

    #[test]
    fn test_extract_result_filters_by_rpc_id() {
        let chunks = vec![
            json!([["wrb.fr", "other", "[1]"]]),
            json!([["wrb.fr", "mine", "[2]"]]),
        ];
        let result = extract_result(&chunks, "mine").unwrap().unwrap();
        assert_eq!(result, json!([2]));
    }

    #[test]
    fn test_extract_result_none_when_absent() {
        let chunks = vec![json!([["di", 12]])];
        assert!(extract_result(&chunks, "wXbhsf").unwrap().is_none());
    }

    #[test]
    fn test_extract_result_raises_on_error_16_signature() {
        let chunks = vec![json!([[
            "wrb.fr",
            "wXbhsf",
            null,
            null,
            null,
            [16],
            "generic"
        ]])];
        let err = extract_result(&chunks, "wXbhsf").unwrap_err();
        let nlm = err.downcast_ref::<NlmError>().unwrap();
        assert!(matches!(nlm, NlmError::Authentication(_)));
    }

    #[test]
    fn test_error_16_requires_generic_tag() {
        // Without the "generic" marker at position 6 this is not the auth
        // signature, just an odd payload.
        let chunks = vec![json!([["wrb.fr", "aaa", null, null, null, [16], "other"]])];
        let result = extract_result(&chunks, "aaa").unwrap();
        assert_eq!(result, Some(Value::Null));
    }
}
