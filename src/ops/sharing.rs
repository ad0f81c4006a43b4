//! Sharing and collaboration operations

use serde_json::{json, Value};

use crate::error::Result;
use crate::rpc::ids;
use crate::rpc::transport::NotebookClient;

// Access levels
pub const SHARE_ACCESS_RESTRICTED: i64 = 1;
pub const SHARE_ACCESS_PUBLIC: i64 = 2;

// Collaborator roles
pub const SHARE_ROLE_OWNER: i64 = 1;
pub const SHARE_ROLE_EDITOR: i64 = 2;
pub const SHARE_ROLE_VIEWER: i64 = 3;

/// Current sharing state of a notebook.
#[derive(Debug, Clone)]
pub struct ShareStatus {
    pub is_public: bool,
    pub share_url: Option<String>,
}

impl NotebookClient {
    /// Fetch the sharing state of a notebook.
    pub async fn get_share_status(&self, notebook_id: &str) -> Result<ShareStatus> {
        let result = self
            .call_rpc(
                ids::RPC_GET_SHARE_STATUS,
                json!([notebook_id]),
                &format!("/notebook/{}", notebook_id),
            )
            .await?;

        let mut strings = Vec::new();
        crate::artifacts::views::collect_strings(&result, &mut strings);
        let share_url = strings
            .iter()
            .find(|s| s.starts_with("https://"))
            .map(|s| s.to_string());

        let is_public = result
            .as_array()
            .and_then(|r| r.first())
            .and_then(Value::as_array)
            .and_then(|inner| inner.first())
            .and_then(Value::as_i64)
            .map(|code| code == SHARE_ACCESS_PUBLIC)
            .unwrap_or(false);

        Ok(ShareStatus {
            is_public,
            share_url,
        })
    }

    /// Toggle public link access for a notebook.
    pub async fn set_public_access(&self, notebook_id: &str, public: bool) -> Result<bool> {
        let access = if public {
            SHARE_ACCESS_PUBLIC
        } else {
            SHARE_ACCESS_RESTRICTED
        };
        let result = self
            .call_rpc(
                ids::RPC_SHARE_NOTEBOOK,
                json!([notebook_id, [access]]),
                &format!("/notebook/{}", notebook_id),
            )
            .await?;
        Ok(!result.is_null())
    }

    /// Invite a collaborator by email.
    pub async fn add_collaborator(
        &self,
        notebook_id: &str,
        email: &str,
        role: i64,
    ) -> Result<bool> {
        let result = self
            .call_rpc(
                ids::RPC_SHARE_NOTEBOOK,
                json!([notebook_id, null, [[email, role]]]),
                &format!("/notebook/{}", notebook_id),
            )
            .await?;
        Ok(!result.is_null())
    }
}
