//! Download-URL extraction for binary artifacts
//!
//! Each artifact type stores its media URL at a different fixed path
//! through the nested payload. These offsets are reverse-engineered
//! constants; every navigation step asserts its shape so drift in the
//! counterpart's schema surfaces as a parse error, not silent corruption.

use serde_json::Value;

use crate::artifacts::views::{as_array, elem, parse_error};
use crate::error::{NlmError, Result};

/// Audio overview URL: `artifact[6][5]`, preferring the `audio/mp4` entry,
/// falling back to the first URL in the media list.
pub fn audio_download_url(artifact: &Value) -> Result<String> {
    let metadata = elem(artifact, 6, "audio", "artifact")?;
    let media_list = as_array(elem(metadata, 5, "audio", "artifact[6]")?, "audio", "artifact[6][5]")?;
    if media_list.is_empty() {
        return Err(parse_error("audio", "no media URLs in artifact[6][5]"));
    }

    pick_by_mime(media_list, "audio/mp4")
        .or_else(|| first_url(media_list))
        .ok_or_else(|| no_url_error("audio"))
}

/// Video overview URL: scan `artifact[8]` for the nested media list whose
/// first entry starts with an http URL, then prefer `video/mp4` (priority
/// flag 4), falling back to the first URL.
pub fn video_download_url(artifact: &Value) -> Result<String> {
    let metadata = as_array(elem(artifact, 8, "video", "artifact")?, "video", "artifact[8]")?;

    let media_list = metadata
        .iter()
        .filter_map(Value::as_array)
        .find(|candidate| {
            candidate
                .first()
                .and_then(Value::as_array)
                .and_then(|inner| inner.first())
                .and_then(Value::as_str)
                .map(|s| s.starts_with("http"))
                .unwrap_or(false)
        })
        .ok_or_else(|| parse_error("video", "no media list found in artifact[8]"))?;

    let mut url = None;
    for item in media_list {
        let Some(entry) = item.as_array() else {
            continue;
        };
        if entry.get(2).and_then(Value::as_str) == Some("video/mp4") {
            url = entry.first().and_then(Value::as_str).map(str::to_string);
            // Priority-flagged encodings win outright.
            if entry.get(1).and_then(Value::as_i64) == Some(4) {
                break;
            }
        }
    }

    url.or_else(|| first_url(media_list))
        .ok_or_else(|| no_url_error("video"))
}

/// Infographic image URL: `artifact[5][0][0][0]`.
pub fn infographic_download_url(artifact: &Value) -> Result<String> {
    let metadata = elem(artifact, 5, "infographic", "artifact")?;
    let media_list = elem(metadata, 0, "infographic", "artifact[5]")?;
    let first = elem(media_list, 0, "infographic", "artifact[5][0]")?;
    first
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| no_url_error("infographic"))
}

/// Slide deck PDF URL: `artifact[12][0][1]`.
pub fn slide_deck_download_url(artifact: &Value) -> Result<String> {
    let metadata = elem(artifact, 12, "slide_deck", "artifact")?;
    let media_list = elem(metadata, 0, "slide_deck", "artifact[12]")?;
    let url = elem(media_list, 1, "slide_deck", "artifact[12][0]")?;
    url.as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| no_url_error("slide_deck"))
}

fn pick_by_mime(media_list: &[Value], mime: &str) -> Option<String> {
    media_list.iter().find_map(|item| {
        let entry = item.as_array()?;
        if entry.get(2).and_then(Value::as_str) == Some(mime) {
            entry.first().and_then(Value::as_str).map(str::to_string)
        } else {
            None
        }
    })
}

fn first_url(media_list: &[Value]) -> Option<String> {
    media_list
        .first()
        .and_then(Value::as_array)
        .and_then(|entry| entry.first())
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn no_url_error(artifact_type: &str) -> anyhow::Error {
    NlmError::ArtifactDownload {
        artifact_type: artifact_type.to_string(),
        details: "No download URL found".to_string(),
    }
    .into()
}
