//! Source management operations
//!
//! Sources are added by URL, pasted text, Drive document, or file upload;
//! they then move through preparing/processing before becoming ready. The
//! add payloads are positional: the URL slot differs between YouTube
//! (position 7) and plain web pages (position 2).

use std::path::Path;
use std::time::Duration;

use serde_json::{json, Value};

use crate::error::{NlmError, Result};
use crate::rpc::ids;
use crate::rpc::transport::{NotebookClient, SOURCE_ADD_TIMEOUT};
use crate::upload::UploadedSource;

// Source processing status codes
pub const SOURCE_STATUS_PROCESSING: i64 = 1;
pub const SOURCE_STATUS_READY: i64 = 2;
pub const SOURCE_STATUS_ERROR: i64 = 3;
pub const SOURCE_STATUS_PREPARING: i64 = 5;

// Source type codes (metadata position 4)
pub const SOURCE_TYPE_GOOGLE_DOCS: i64 = 1;
pub const SOURCE_TYPE_GOOGLE_OTHER: i64 = 2;

/// Default poll cadence for wait-for-ready.
const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// One source belonging to a notebook.
#[derive(Debug, Clone)]
pub struct Source {
    pub id: Option<String>,
    pub title: String,
    pub source_type: Option<i64>,
    pub url: Option<String>,
    pub drive_doc_id: Option<String>,
    pub can_sync: bool,
    pub status: i64,
}

impl Source {
    pub fn status_name(&self) -> &'static str {
        match self.status {
            SOURCE_STATUS_PROCESSING => "processing",
            SOURCE_STATUS_READY => "ready",
            SOURCE_STATUS_ERROR => "error",
            SOURCE_STATUS_PREPARING => "preparing",
            _ => "unknown",
        }
    }
}

/// Shared tail of every add-source payload.
fn add_source_params(source_data: Value, notebook_id: &str) -> Value {
    json!([
        [source_data],
        notebook_id,
        [2],
        [1, null, null, null, null, null, null, null, null, null, [1]]
    ])
}

/// Added-source records come back as `[[id], title, ...]`.
fn parse_added_source(result: &Value, fallback_title: &str) -> Option<UploadedSource> {
    let source_data = result
        .as_array()
        .and_then(|r| r.first())
        .and_then(Value::as_array)
        .and_then(|list| list.first())
        .and_then(Value::as_array)?;

    let id = source_data
        .first()
        .and_then(Value::as_array)
        .and_then(|ids| ids.first())
        .and_then(Value::as_str)?
        .to_string();
    let title = source_data
        .get(1)
        .and_then(Value::as_str)
        .unwrap_or(fallback_title)
        .to_string();

    Some(UploadedSource { id, title })
}

impl NotebookClient {
    /// List a notebook's sources with type and processing status.
    pub async fn notebook_sources(&self, notebook_id: &str) -> Result<Vec<Source>> {
        let result = self.get_notebook(notebook_id).await?;

        // The notebook record is wrapped in an outer array; sources sit at
        // index 1.
        let notebook_data = match result.as_array().and_then(|r| r.first()) {
            Some(first) if first.is_array() => first.clone(),
            _ => result,
        };
        let sources_data = notebook_data
            .as_array()
            .and_then(|n| n.get(1))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut sources = Vec::new();
        for src in &sources_data {
            let Some(items) = src.as_array().filter(|s| s.len() >= 3) else {
                continue;
            };

            // Source structure: [[id], title, [metadata...], [_, status]]
            let id = items
                .first()
                .and_then(Value::as_array)
                .and_then(|ids| ids.first())
                .and_then(Value::as_str)
                .map(str::to_string);
            let title = items
                .get(1)
                .and_then(Value::as_str)
                .unwrap_or("Untitled")
                .to_string();
            let metadata = items.get(2).and_then(Value::as_array);

            let source_type = metadata.and_then(|m| m.get(4)).and_then(Value::as_i64);
            let drive_doc_id = metadata
                .and_then(|m| m.first())
                .and_then(Value::as_array)
                .and_then(|d| d.first())
                .and_then(Value::as_str)
                .map(str::to_string);
            let url = metadata
                .and_then(|m| m.get(7))
                .and_then(Value::as_array)
                .and_then(|u| u.first())
                .and_then(Value::as_str)
                .map(str::to_string);

            // Docs and Slides/Sheets live in Drive and can be re-synced.
            let can_sync = drive_doc_id.is_some()
                && matches!(
                    source_type,
                    Some(SOURCE_TYPE_GOOGLE_DOCS) | Some(SOURCE_TYPE_GOOGLE_OTHER)
                );

            // Processing status at src[3][1]
            let status = items
                .get(3)
                .and_then(Value::as_array)
                .and_then(|s| s.get(1))
                .and_then(Value::as_i64)
                .unwrap_or(SOURCE_STATUS_READY);

            sources.push(Source {
                id,
                title,
                source_type,
                url,
                drive_doc_id,
                can_sync,
                status,
            });
        }

        Ok(sources)
    }

    /// Add a URL (website or YouTube) as a source.
    pub async fn add_url_source(&self, notebook_id: &str, url: &str) -> Result<UploadedSource> {
        let lowered = url.to_lowercase();
        let is_youtube = lowered.contains("youtube.com") || lowered.contains("youtu.be");

        let source_data = if is_youtube {
            json!([null, null, null, null, null, null, null, [url], null, null, 1])
        } else {
            json!([null, null, [url], null, null, null, null, null, null, null, 1])
        };

        let result = self
            .call_rpc_with_timeout(
                ids::RPC_ADD_SOURCE,
                add_source_params(source_data, notebook_id),
                &format!("/notebook/{}", notebook_id),
                SOURCE_ADD_TIMEOUT,
            )
            .await?;

        parse_added_source(&result, url)
            .ok_or_else(|| NlmError::Service(format!("Adding URL source failed: {}", url)).into())
    }

    /// Add pasted text as a source.
    pub async fn add_text_source(
        &self,
        notebook_id: &str,
        text: &str,
        title: &str,
    ) -> Result<UploadedSource> {
        let source_data = json!([null, [title, text], null, 2, null, null, null, null, null, null, 1]);

        let result = self
            .call_rpc_with_timeout(
                ids::RPC_ADD_SOURCE,
                add_source_params(source_data, notebook_id),
                &format!("/notebook/{}", notebook_id),
                SOURCE_ADD_TIMEOUT,
            )
            .await?;

        parse_added_source(&result, title)
            .ok_or_else(|| NlmError::Service(format!("Adding text source '{}' failed", title)).into())
    }

    /// Add a Google Drive document as a source.
    pub async fn add_drive_source(
        &self,
        notebook_id: &str,
        document_id: &str,
        title: &str,
        mime_type: &str,
    ) -> Result<UploadedSource> {
        let source_data = json!([
            [document_id, mime_type, 1, title],
            null, null, null, null, null, null, null, null, null, 1
        ]);

        let result = self
            .call_rpc_with_timeout(
                ids::RPC_ADD_SOURCE,
                add_source_params(source_data, notebook_id),
                &format!("/notebook/{}", notebook_id),
                SOURCE_ADD_TIMEOUT,
            )
            .await?;

        parse_added_source(&result, title)
            .ok_or_else(|| {
                NlmError::Service(format!("Adding Drive source '{}' failed", title)).into()
            })
    }

    /// Delete a source permanently. Irreversible.
    pub async fn delete_source(&self, source_id: &str) -> Result<bool> {
        // Extra nesting around the id relative to notebook deletion.
        let result = self
            .call_rpc(ids::RPC_DELETE_SOURCE, json!([[[source_id]], [2]]), "/")
            .await?;
        Ok(!result.is_null())
    }

    /// Whether a Drive source is still in sync with the document.
    pub async fn check_source_freshness(&self, source_id: &str) -> Result<Option<bool>> {
        let result = self
            .call_rpc(
                ids::RPC_CHECK_FRESHNESS,
                json!([null, [source_id], [2]]),
                "/",
            )
            .await?;

        Ok(result
            .as_array()
            .and_then(|r| r.first())
            .and_then(Value::as_array)
            .and_then(|inner| inner.get(1))
            .and_then(Value::as_bool))
    }

    /// Re-sync a Drive source with the latest document content.
    pub async fn sync_drive_source(&self, source_id: &str) -> Result<Option<UploadedSource>> {
        let result = self
            .call_rpc(ids::RPC_SYNC_DRIVE, json!([null, [source_id], [2]]), "/")
            .await?;

        // Result: [[[id], title, metadata], ...]
        let Some(items) = result
            .as_array()
            .and_then(|r| r.first())
            .and_then(Value::as_array)
        else {
            return Ok(None);
        };
        let id = items
            .first()
            .and_then(Value::as_array)
            .and_then(|i| i.first())
            .and_then(Value::as_str);
        let title = items.get(1).and_then(Value::as_str).unwrap_or("Unknown");

        Ok(id.map(|id| UploadedSource {
            id: id.to_string(),
            title: title.to_string(),
        }))
    }

    /// AI-generated summary and keywords for a source.
    pub async fn get_source_guide(&self, source_id: &str) -> Result<(String, Vec<String>)> {
        let result = self
            .call_rpc(ids::RPC_GET_SOURCE_GUIDE, json!([[[[source_id]]]]), "/")
            .await?;

        let inner = result
            .as_array()
            .and_then(|r| r.first())
            .and_then(Value::as_array)
            .and_then(|r| r.first())
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let summary = inner
            .get(1)
            .and_then(Value::as_array)
            .and_then(|s| s.first())
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let keywords = inner
            .get(2)
            .and_then(Value::as_array)
            .and_then(|k| k.first())
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok((summary, keywords))
    }

    /// Raw text content of a source as indexed by the counterpart.
    pub async fn get_source_fulltext(&self, source_id: &str) -> Result<String> {
        let result = self
            .call_rpc(ids::RPC_GET_SOURCE, json!([[source_id], [2], [2]]), "/")
            .await?;

        // Content blocks sit at result[3][0]; each block is
        // [start, end, content...] with text strings nested arbitrarily.
        let blocks = result
            .as_array()
            .and_then(|r| r.get(3))
            .and_then(Value::as_array)
            .and_then(|w| w.first())
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut parts: Vec<&str> = Vec::new();
        for block in &blocks {
            crate::artifacts::views::collect_strings(block, &mut parts);
        }
        Ok(parts.join("\n\n"))
    }

    /// Block until a source finishes processing.
    ///
    /// Polls at a fixed interval and raises on an error status or when the
    /// timeout elapses. This is the only built-in polling loop the core
    /// provides.
    pub async fn wait_for_source_ready(
        &self,
        notebook_id: &str,
        source_id: &str,
        timeout: Duration,
    ) -> Result<Source> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let sources = self.notebook_sources(notebook_id).await?;
            if let Some(source) = sources
                .into_iter()
                .find(|s| s.id.as_deref() == Some(source_id))
            {
                match source.status {
                    SOURCE_STATUS_READY => return Ok(source),
                    SOURCE_STATUS_ERROR => {
                        return Err(NlmError::Service(format!(
                            "Source {} failed to process",
                            source_id
                        ))
                        .into())
                    }
                    _ => {}
                }
            }

            if tokio::time::Instant::now() + POLL_INTERVAL > deadline {
                return Err(NlmError::Service(format!(
                    "Source {} not ready after {}s",
                    source_id,
                    timeout.as_secs()
                ))
                .into());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Upload a local file and optionally wait for processing.
    pub async fn add_file(
        &self,
        notebook_id: &str,
        path: &Path,
        wait: Option<Duration>,
    ) -> Result<UploadedSource> {
        let uploaded = self.add_file_source(notebook_id, path).await?;
        if let Some(timeout) = wait {
            let ready = self
                .wait_for_source_ready(notebook_id, &uploaded.id, timeout)
                .await?;
            return Ok(UploadedSource {
                id: ready.id.unwrap_or(uploaded.id),
                title: ready.title,
            });
        }
        Ok(uploaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_added_source() {
        let result = json!([[[[["src-1"], "Example Page", []]]]]);
        let source = parse_added_source(&result, "fallback").unwrap();
        assert_eq!(source.id, "src-1");
        assert_eq!(source.title, "Example Page");
    }

    #[test]
    fn test_parse_added_source_uses_fallback_title() {
        let result = json!([[[[["src-2"]]]]]);
        let source = parse_added_source(&result, "fallback").unwrap();
        assert_eq!(source.title, "fallback");
    }

    #[test]
    fn test_parse_added_source_malformed_is_none() {
        assert!(parse_added_source(&json!(null), "t").is_none());
        assert!(parse_added_source(&json!([[]]), "t").is_none());
    }

    #[test]
    fn test_status_names() {
        let mut source = Source {
            id: None,
            title: String::new(),
            source_type: None,
            url: None,
            drive_doc_id: None,
            can_sync: false,
            status: SOURCE_STATUS_PREPARING,
        };
        assert_eq!(source.status_name(), "preparing");
        source.status = SOURCE_STATUS_READY;
        assert_eq!(source.status_name(), "ready");
        source.status = 42;
        assert_eq!(source.status_name(), "unknown");
    }
}
