//! Positional navigation helpers
//!
//! Every hop through the counterpart's nested arrays goes through these
//! helpers so a shape mismatch produces a typed parse error naming the
//! offset that failed instead of a generic index panic.

use serde_json::Value;

use crate::error::NlmError;

/// Build an [`NlmError::ArtifactParse`] as an `anyhow::Error`.
pub fn parse_error(artifact_type: &str, details: impl Into<String>) -> anyhow::Error {
    NlmError::ArtifactParse {
        artifact_type: artifact_type.to_string(),
        details: details.into(),
    }
    .into()
}

/// Coerce to an array, naming the location on mismatch.
pub fn as_array<'a>(
    value: &'a Value,
    artifact_type: &str,
    at: &str,
) -> crate::error::Result<&'a Vec<Value>> {
    value.as_array().ok_or_else(|| {
        parse_error(
            artifact_type,
            format!("expected array at {}, got {}", at, type_name(value)),
        )
    })
}

/// Index into an array, naming the location on out-of-range.
pub fn elem<'a>(
    value: &'a Value,
    index: usize,
    artifact_type: &str,
    at: &str,
) -> crate::error::Result<&'a Value> {
    let items = as_array(value, artifact_type, at)?;
    items.get(index).ok_or_else(|| {
        parse_error(
            artifact_type,
            format!(
                "expected at least {} elements at {}, got {}",
                index + 1,
                at,
                items.len()
            ),
        )
    })
}

/// Coerce to a string, naming the location on mismatch.
pub fn as_str<'a>(
    value: &'a Value,
    artifact_type: &str,
    at: &str,
) -> crate::error::Result<&'a str> {
    value.as_str().ok_or_else(|| {
        parse_error(
            artifact_type,
            format!("expected string at {}, got {}", at, type_name(value)),
        )
    })
}

/// Collect every non-empty string leaf, depth-first.
pub fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) if !s.is_empty() => out.push(s),
        Value::Array(items) => {
            for item in items {
                collect_strings(item, out);
            }
        }
        _ => {}
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_elem_reports_offset_on_failure() {
        let value = json!([1, 2]);
        let err = elem(&value, 5, "audio", "metadata[6]").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("audio"));
        assert!(msg.contains("metadata[6]"));
        assert!(msg.contains("at least 6"));
    }

    #[test]
    fn test_as_array_reports_actual_type() {
        let err = as_array(&json!("oops"), "video", "artifact[8]").unwrap_err();
        assert!(err.to_string().contains("got string"));
    }

    #[test]
    fn test_collect_strings_depth_first() {
        let value = json!([["a", [3, "b"]], "", null, "c"]);
        let mut out = Vec::new();
        collect_strings(&value, &mut out);
        assert_eq!(out, vec!["a", "b", "c"]);
    }
}
