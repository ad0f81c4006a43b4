//! Research operations (source discovery)
//!
//! Fast research queries the web or Drive for candidate sources; deep
//! research runs a longer web-only agent. Both are asynchronous: start,
//! poll for results, then import a selection into the notebook. Result
//! payloads are parsed defensively (entries are located by their URL
//! rather than trusted offsets).

use serde_json::{json, Value};

use crate::error::Result;
use crate::rpc::ids;
use crate::rpc::transport::NotebookClient;

// Research source kinds
pub const RESEARCH_SOURCE_WEB: i64 = 1;
pub const RESEARCH_SOURCE_DRIVE: i64 = 2;

/// Research depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchMode {
    Fast,
    Deep,
}

/// One discovered source candidate.
#[derive(Debug, Clone)]
pub struct ResearchResult {
    pub title: String,
    pub url: String,
}

/// Scan any nesting level for entries that carry an http URL.
fn collect_results(value: &Value, out: &mut Vec<ResearchResult>) {
    let Some(items) = value.as_array() else {
        return;
    };

    let url = items
        .iter()
        .filter_map(Value::as_str)
        .find(|s| s.starts_with("http://") || s.starts_with("https://"));

    if let Some(url) = url {
        let title = items
            .iter()
            .filter_map(Value::as_str)
            .find(|s| !s.starts_with("http://") && !s.starts_with("https://"))
            .unwrap_or(url);
        out.push(ResearchResult {
            title: title.to_string(),
            url: url.to_string(),
        });
        return;
    }

    for item in items {
        collect_results(item, out);
    }
}

impl NotebookClient {
    /// Start a research task. Returns the task id when one is reported.
    pub async fn start_research(
        &self,
        notebook_id: &str,
        query: &str,
        mode: ResearchMode,
        source_kind: i64,
    ) -> Result<Option<String>> {
        let (rpc_id, params) = match mode {
            ResearchMode::Fast => (
                ids::RPC_START_FAST_RESEARCH,
                json!([notebook_id, query, [source_kind]]),
            ),
            // Deep research is web-only.
            ResearchMode::Deep => (
                ids::RPC_START_DEEP_RESEARCH,
                json!([notebook_id, query, [RESEARCH_SOURCE_WEB]]),
            ),
        };

        let result = self
            .call_rpc(rpc_id, params, &format!("/notebook/{}", notebook_id))
            .await?;

        let mut strings = Vec::new();
        crate::artifacts::views::collect_strings(&result, &mut strings);
        Ok(strings.first().map(|s| s.to_string()))
    }

    /// Poll for research results discovered so far.
    pub async fn poll_research(&self, notebook_id: &str) -> Result<Vec<ResearchResult>> {
        let result = self
            .call_rpc(
                ids::RPC_POLL_RESEARCH,
                json!([notebook_id]),
                &format!("/notebook/{}", notebook_id),
            )
            .await?;

        let mut results = Vec::new();
        collect_results(&result, &mut results);
        Ok(results)
    }

    /// Import a selection of discovered sources into the notebook.
    pub async fn import_research_sources(
        &self,
        notebook_id: &str,
        urls: &[String],
    ) -> Result<bool> {
        let entries: Vec<Value> = urls.iter().map(|u| json!([u])).collect();
        let result = self
            .call_rpc(
                ids::RPC_IMPORT_RESEARCH,
                json!([notebook_id, entries, [2]]),
                &format!("/notebook/{}", notebook_id),
            )
            .await?;
        Ok(!result.is_null())
    }
}
