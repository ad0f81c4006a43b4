//! Notebook operations

use regex::Regex;
use serde_json::{json, Value};

use crate::error::{NlmError, Result};
use crate::rpc::envelope::BASE_URL;
use crate::rpc::ids;
use crate::rpc::transport::NotebookClient;

/// A notebook as listed by the counterpart.
#[derive(Debug, Clone)]
pub struct Notebook {
    pub id: String,
    pub title: String,
    pub source_count: usize,
    pub url: String,
}

/// Notebook records carry no field names; the id is the UUID-shaped string
/// and the title the first other string.
fn looks_like_uuid(s: &str) -> bool {
    let re = Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    )
    .expect("static regex compiles");
    re.is_match(s)
}

fn parse_notebook_entry(entry: &Value) -> Option<Notebook> {
    let items = entry.as_array()?;

    let mut strings = Vec::new();
    crate::artifacts::views::collect_strings(entry, &mut strings);
    let id = strings.iter().find(|s| looks_like_uuid(s))?.to_string();
    let title = strings
        .iter()
        .find(|s| !looks_like_uuid(s))
        .map(|s| s.to_string())
        .unwrap_or_else(|| "Untitled".to_string());

    let source_count = items
        .get(1)
        .and_then(Value::as_array)
        .map(|sources| sources.len())
        .unwrap_or(0);

    Some(Notebook {
        url: format!("{}/notebook/{}", BASE_URL, id),
        id,
        title,
        source_count,
    })
}

impl NotebookClient {
    /// List all notebooks visible to the account.
    pub async fn list_notebooks(&self) -> Result<Vec<Notebook>> {
        let result = self
            .call_rpc(ids::RPC_LIST_NOTEBOOKS, json!([null, 1]), "/")
            .await?;

        let entries = result
            .as_array()
            .and_then(|r| r.first())
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(entries.iter().filter_map(parse_notebook_entry).collect())
    }

    /// Fetch the raw notebook record (sources live at index 1).
    pub async fn get_notebook(&self, notebook_id: &str) -> Result<Value> {
        self.call_rpc(
            ids::RPC_GET_NOTEBOOK,
            json!([notebook_id]),
            &format!("/notebook/{}", notebook_id),
        )
        .await
    }

    /// Create a notebook and return it.
    pub async fn create_notebook(&self, title: &str) -> Result<Notebook> {
        let result = self
            .call_rpc(ids::RPC_CREATE_NOTEBOOK, json!([title, ""]), "/")
            .await?;

        parse_notebook_entry(&result)
            .or_else(|| {
                result
                    .as_array()
                    .and_then(|r| r.first())
                    .and_then(parse_notebook_entry)
            })
            .ok_or_else(|| {
                NlmError::Service(format!(
                    "Notebook creation returned no recognizable record for '{}'",
                    title
                ))
                .into()
            })
    }

    /// Rename a notebook. Returns true when the counterpart acknowledged.
    pub async fn rename_notebook(&self, notebook_id: &str, new_title: &str) -> Result<bool> {
        let result = self
            .call_rpc(
                ids::RPC_RENAME_NOTEBOOK,
                json!([notebook_id, new_title]),
                &format!("/notebook/{}", notebook_id),
            )
            .await?;
        Ok(!result.is_null())
    }

    /// Delete a notebook permanently. Irreversible.
    pub async fn delete_notebook(&self, notebook_id: &str) -> Result<bool> {
        let result = self
            .call_rpc(ids::RPC_DELETE_NOTEBOOK, json!([[notebook_id], [2]]), "/")
            .await?;
        Ok(!result.is_null())
    }

    /// Fetch the AI-generated notebook summary and suggested topics.
    pub async fn get_notebook_summary(&self, notebook_id: &str) -> Result<Option<String>> {
        let result = self
            .call_rpc(
                ids::RPC_GET_SUMMARY,
                json!([notebook_id]),
                &format!("/notebook/{}", notebook_id),
            )
            .await?;

        let mut strings = Vec::new();
        crate::artifacts::views::collect_strings(&result, &mut strings);
        // The summary is the first substantial prose string in the record.
        Ok(strings
            .iter()
            .find(|s| s.len() > 40 && !looks_like_uuid(s))
            .map(|s| s.to_string()))
    }
}
