//! Error types for nlm
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for nlm operations
///
/// This enum encompasses all possible errors that can occur during
/// RPC transport, authentication recovery, uploads, downloads, and
/// artifact payload parsing.
#[derive(Error, Debug)]
pub enum NlmError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level errors (connection, timeout, malformed response)
    #[error("Transport error: {0}")]
    Transport(String),

    /// HTTP error status returned by the counterpart
    ///
    /// Carries the numeric status so the retry policy and the auth
    /// recovery ladder can classify it without re-parsing messages.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Response body (possibly truncated)
        body: String,
    },

    /// Authentication errors (expired cookies, error-16 signature, dead session)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Input validation errors (never retried, surfaced immediately)
    #[error("Validation error: {0}")]
    Validation(String),

    /// No completed artifact of the requested type/id exists yet
    #[error("No completed {artifact_type} artifact found{}", id.as_deref().map(|i| format!(" (id {i})")).unwrap_or_default())]
    ArtifactNotReady {
        /// Artifact type name ("audio", "quiz", ...)
        artifact_type: String,
        /// Requested artifact id, if one was given
        id: Option<String>,
    },

    /// An explicitly requested artifact id does not exist
    #[error("Artifact not found: {id} ({artifact_type})")]
    ArtifactNotFound {
        /// Requested artifact id
        id: String,
        /// Artifact type name
        artifact_type: String,
    },

    /// Payload navigation failed against the positional contract
    #[error("Failed to parse {artifact_type} payload: {details}")]
    ArtifactParse {
        /// Artifact type name
        artifact_type: String,
        /// Which offset failed and what was expected
        details: String,
    },

    /// Network or auth failure while transferring artifact bytes
    #[error("Failed to download {artifact_type}: {details}")]
    ArtifactDownload {
        /// Artifact type name
        artifact_type: String,
        /// Underlying cause
        details: String,
    },

    /// Resumable upload failure
    #[error("Upload failed for {filename}: {details}")]
    Upload {
        /// Name of the file being uploaded
        filename: String,
        /// Underlying cause
        details: String,
    },

    /// Catch-all at the orchestration boundary so callers never see raw
    /// lower-layer errors
    #[error("Service error: {0}")]
    Service(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl NlmError {
    /// Status codes that warrant a retry (transient server errors).
    pub const RETRYABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

    /// Whether this error is a transient server error worth retrying.
    ///
    /// 401/403 are deliberately excluded: those route into auth recovery,
    /// never into the backoff loop.
    pub fn is_retryable(&self) -> bool {
        match self {
            NlmError::HttpStatus { status, .. } => Self::RETRYABLE_STATUS_CODES.contains(status),
            _ => false,
        }
    }

    /// Whether this error signals a degraded session (HTTP 401/403 or the
    /// in-band error-16 signature).
    pub fn is_auth_failure(&self) -> bool {
        match self {
            NlmError::HttpStatus { status, .. } => *status == 401 || *status == 403,
            NlmError::Authentication(_) => true,
            _ => false,
        }
    }
}

/// Result type alias for nlm operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// Classify an `anyhow::Error` as retryable by downcasting to [`NlmError`].
pub fn is_retryable_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<NlmError>()
        .map(NlmError::is_retryable)
        .unwrap_or(false)
}

/// Classify an `anyhow::Error` as an auth failure by downcasting to [`NlmError`].
pub fn is_auth_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<NlmError>()
        .map(NlmError::is_auth_failure)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let error = NlmError::Transport("connection reset".to_string());
        assert_eq!(error.to_string(), "Transport error: connection reset");
    }

    #[test]
    fn test_http_status_display() {
        let error = NlmError::HttpStatus {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(error.to_string(), "HTTP 503: unavailable");
    }

    #[test]
    fn test_authentication_error_display() {
        let error = NlmError::Authentication("cookies expired".to_string());
        assert_eq!(error.to_string(), "Authentication error: cookies expired");
    }

    #[test]
    fn test_artifact_parse_display() {
        let error = NlmError::ArtifactParse {
            artifact_type: "data_table".to_string(),
            details: "expected list at raw[0][0]".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse data_table payload: expected list at raw[0][0]"
        );
    }

    #[test]
    fn test_artifact_not_ready_display() {
        let error = NlmError::ArtifactNotReady {
            artifact_type: "audio".to_string(),
            id: None,
        };
        assert_eq!(error.to_string(), "No completed audio artifact found");

        let error = NlmError::ArtifactNotReady {
            artifact_type: "audio".to_string(),
            id: Some("abc".to_string()),
        };
        assert_eq!(
            error.to_string(),
            "No completed audio artifact found (id abc)"
        );
    }

    #[test]
    fn test_upload_error_display() {
        let error = NlmError::Upload {
            filename: "notes.pdf".to_string(),
            details: "missing upload URL".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Upload failed for notes.pdf: missing upload URL"
        );
    }

    #[test]
    fn test_retryable_classification() {
        for status in [429u16, 500, 502, 503, 504] {
            let error = NlmError::HttpStatus {
                status,
                body: String::new(),
            };
            assert!(error.is_retryable(), "{} should be retryable", status);
        }
        for status in [400u16, 401, 403, 404] {
            let error = NlmError::HttpStatus {
                status,
                body: String::new(),
            };
            assert!(!error.is_retryable(), "{} should not be retryable", status);
        }
        assert!(!NlmError::Transport("timeout".into()).is_retryable());
    }

    #[test]
    fn test_auth_failure_classification() {
        for status in [401u16, 403] {
            let error = NlmError::HttpStatus {
                status,
                body: String::new(),
            };
            assert!(error.is_auth_failure());
        }
        assert!(NlmError::Authentication("expired".into()).is_auth_failure());
        assert!(!NlmError::HttpStatus {
            status: 500,
            body: String::new()
        }
        .is_auth_failure());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: NlmError = io_error.into();
        assert!(matches!(error, NlmError::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NlmError>();
    }
}
