//! Mind map payload parsing
//!
//! Mind maps live in the notes system, not the regular artifact list: they
//! are retrieved via a dedicated list RPC, the map JSON is double-encoded
//! (a JSON string inside the JSON response), and deleted entries linger as
//! tombstones `[id, null, 2]` that must be skipped. Full deletion requires
//! a second RPC carrying a timestamp recovered from the list response.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::artifacts::parse_timestamp;
use crate::artifacts::views::parse_error;
use crate::error::Result;

const TYPE_NAME: &str = "mind_map";

/// One mind map entry from the list RPC.
#[derive(Debug, Clone)]
pub struct MindMap {
    pub id: String,
    pub title: String,
    /// The decoded mind-map document (double-encoded on the wire).
    pub document: Option<Value>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Parse the list-RPC result into mind map entries, skipping tombstones.
pub fn parse_mind_map_list(result: &Value) -> Vec<MindMap> {
    let Some(entries) = result
        .as_array()
        .and_then(|r| r.first())
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    let mut maps = Vec::new();
    for entry in entries {
        let Some(items) = entry.as_array().filter(|e| e.len() >= 2) else {
            continue;
        };
        // Tombstone format: [uuid, null, 2]
        let details = &items[1];
        if details.is_null() {
            continue;
        }
        let Some(id) = items[0].as_str() else {
            continue;
        };
        let Some(detail_items) = details.as_array().filter(|d| d.len() >= 5) else {
            continue;
        };

        // Details: [id, json, metadata, null, title]
        let document = detail_items
            .get(1)
            .and_then(Value::as_str)
            .and_then(|raw| serde_json::from_str(raw).ok());
        let title = detail_items
            .get(4)
            .and_then(Value::as_str)
            .unwrap_or("Mind Map")
            .to_string();
        let created_at = detail_items
            .get(2)
            .and_then(Value::as_array)
            .and_then(|m| m.get(2))
            .and_then(parse_timestamp);

        maps.push(MindMap {
            id: id.to_string(),
            title,
            document,
            created_at,
        });
    }
    maps
}

/// Recover the deletion timestamp for a mind map from the list response.
///
/// The second deletion step needs `entry[1][2][2]` (a `[seconds, micros]`
/// pair); omitting that step leaves a ghost entry in the list.
pub fn delete_timestamp_for(result: &Value, mind_map_id: &str) -> Option<Value> {
    let entries = result
        .as_array()
        .and_then(|r| r.first())
        .and_then(Value::as_array)?;

    for entry in entries {
        let Some(items) = entry.as_array() else {
            continue;
        };
        if items.first().and_then(Value::as_str) != Some(mind_map_id) {
            continue;
        }
        return items
            .get(1)
            .and_then(Value::as_array)
            .and_then(|d| d.get(2))
            .and_then(Value::as_array)
            .and_then(|m| m.get(2))
            .cloned();
    }
    None
}

/// Extract and re-decode the document JSON of one mind map for download.
pub fn decoded_document(map: &MindMap) -> Result<Value> {
    map.document.clone().ok_or_else(|| {
        parse_error(
            TYPE_NAME,
            format!("mind map {} carries no decodable document", map.id),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn list_result() -> Value {
        json!([[
            [
                "mm-1",
                [
                    "mm-1",
                    "{\"root\":{\"label\":\"Topic\"}}",
                    [null, null, [1766372302, 123456]],
                    null,
                    "My Map"
                ]
            ],
            ["mm-dead", null, 2]
        ]])
    }

    #[test]
    fn test_parse_list_decodes_double_encoded_json() {
        let maps = parse_mind_map_list(&list_result());
        assert_eq!(maps.len(), 1);
        assert_eq!(maps[0].id, "mm-1");
        assert_eq!(maps[0].title, "My Map");
        assert_eq!(
            maps[0].document.as_ref().unwrap()["root"]["label"],
            "Topic"
        );
        assert_eq!(maps[0].created_at.unwrap().timestamp(), 1766372302);
    }

    #[test]
    fn test_tombstones_are_skipped() {
        let maps = parse_mind_map_list(&list_result());
        assert!(!maps.iter().any(|m| m.id == "mm-dead"));
    }

    #[test]
    fn test_delete_timestamp_recovery() {
        let ts = delete_timestamp_for(&list_result(), "mm-1").unwrap();
        assert_eq!(ts, json!([1766372302, 123456]));
        assert!(delete_timestamp_for(&list_result(), "missing").is_none());
    }

    #[test]
    fn test_empty_or_malformed_list() {
        assert!(parse_mind_map_list(&json!([])).is_empty());
        assert!(parse_mind_map_list(&json!(null)).is_empty());
        assert!(parse_mind_map_list(&json!([[["short"]]])).is_empty());
    }
}
