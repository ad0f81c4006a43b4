//! Seam to the browser-automation login flow
//!
//! The interactive/headless browser login is a black box that yields
//! cookies plus optional tokens. The transport only needs the trait; the
//! production implementation shells out to a configured login helper, and
//! tests substitute a fake.

use async_trait::async_trait;

use crate::auth::session::Session;
use crate::error::{NlmError, Result};

/// Source of fresh sessions of last resort (recovery layer 3).
#[async_trait]
pub trait LoginFlow: Send + Sync {
    /// Acquire a fresh session without user interaction, or fail.
    async fn acquire_session(&self) -> Result<Session>;
}

/// Runs an external login helper that prints a session JSON document
/// (cookies plus optional csrf_token/session_id) on stdout.
///
/// This is how headless re-auth stays decoupled from any particular
/// browser-automation stack: the helper owns the browser profile and the
/// login-state check; this side only consumes the resulting credentials.
#[derive(Debug, Clone)]
pub struct ExternalLoginCommand {
    command: String,
}

impl ExternalLoginCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl LoginFlow for ExternalLoginCommand {
    async fn acquire_session(&self) -> Result<Session> {
        tracing::info!("Running headless login helper: {}", self.command);

        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .output()
            .await
            .map_err(|e| {
                NlmError::Authentication(format!("Failed to launch login helper: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NlmError::Authentication(format!(
                "Login helper exited with {}: {}",
                output.status,
                stderr.trim()
            ))
            .into());
        }

        let session: Session = serde_json::from_slice(&output.stdout).map_err(|e| {
            NlmError::Authentication(format!("Login helper produced invalid session JSON: {}", e))
        })?;

        if session.cookies.is_empty() {
            return Err(
                NlmError::Authentication("Login helper returned no cookies".to_string()).into(),
            );
        }

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_external_command_parses_session_json() {
        let flow = ExternalLoginCommand::new(
            r#"echo '{"cookies": {"SID": "abc"}, "csrf_token": "tok"}'"#,
        );
        let session = flow.acquire_session().await.unwrap();
        assert_eq!(session.csrf_token.as_deref(), Some("tok"));
        assert!(!session.cookies.is_empty());
    }

    #[tokio::test]
    async fn test_external_command_failure_is_auth_error() {
        let flow = ExternalLoginCommand::new("exit 3");
        let err = flow.acquire_session().await.unwrap_err();
        let nlm = err.downcast_ref::<NlmError>().unwrap();
        assert!(matches!(nlm, NlmError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_external_command_empty_cookies_rejected() {
        let flow = ExternalLoginCommand::new(r#"echo '{"cookies": {}}'"#);
        assert!(flow.acquire_session().await.is_err());
    }
}
