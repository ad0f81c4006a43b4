//! Resumable file upload engine
//!
//! Uploading a local file as a source is a three-step protocol, each step
//! depending on the prior step's output:
//!
//! 1. register the source intent over RPC, yielding a `SOURCE_ID`
//! 2. open an upload session against the upload endpoint, yielding a
//!    per-upload URL in the `x-goog-upload-url` response header
//! 3. stream the file bytes to that URL in fixed-size chunks
//!
//! Validation happens before any network call, and each HTTP step is
//! individually wrapped in the retry policy. Memory use is O(chunk).

use std::path::Path;
use std::time::Duration;

use serde_json::{json, Value};
use tokio_util::io::ReaderStream;

use crate::error::{NlmError, Result};
use crate::rpc::envelope::UPLOAD_PATH;
use crate::rpc::ids;
use crate::rpc::transport::NotebookClient;

/// Upload stream chunk size (64 KiB).
pub const UPLOAD_CHUNK_SIZE: usize = 65536;

/// File extensions the counterpart accepts for upload.
pub const SUPPORTED_EXTENSIONS: [&str; 10] = [
    "pdf", "txt", "md", "docx", "csv", "mp3", "mp4", "jpg", "jpeg", "png",
];

const START_TIMEOUT: Duration = Duration::from_secs(60);
const STREAM_TIMEOUT: Duration = Duration::from_secs(300);

/// Outcome of a file upload.
#[derive(Debug, Clone)]
pub struct UploadedSource {
    pub id: String,
    pub title: String,
}

/// Validate a candidate upload before touching the network.
///
/// Returns the filename and size on success; empty files, directories,
/// and unsupported extensions are rejected immediately.
pub fn validate_upload_file(path: &Path) -> Result<(String, u64)> {
    if !path.exists() {
        return Err(NlmError::Validation(format!("File not found: {}", path.display())).into());
    }
    if !path.is_file() {
        return Err(
            NlmError::Validation(format!("Not a regular file: {}", path.display())).into(),
        );
    }

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let size = path.metadata()?.len();

    if size == 0 {
        return Err(NlmError::Validation(format!("File is empty: {}", path.display())).into());
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(NlmError::Validation(format!(
            "Unsupported file type: .{}\nSupported types: {}",
            extension,
            SUPPORTED_EXTENSIONS.join(", ")
        ))
        .into());
    }

    Ok((filename, size))
}

/// Depth-first search for the first string in a nested value.
fn first_string(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        Value::Array(items) => items.iter().find_map(first_string),
        _ => None,
    }
}

impl NotebookClient {
    /// Upload a local file as a new source via the resumable protocol.
    pub async fn add_file_source(&self, notebook_id: &str, path: &Path) -> Result<UploadedSource> {
        let (filename, file_size) = validate_upload_file(path)?;

        let source_id = self.register_file_source(notebook_id, &filename).await?;
        tracing::debug!("Registered upload source {}", source_id);

        let upload_url = self
            .start_upload_session(notebook_id, &filename, file_size, &source_id)
            .await?;
        tracing::debug!("Opened upload session");

        self.stream_file(&upload_url, path, &filename).await?;
        tracing::info!("Uploaded {} ({} bytes)", filename, file_size);

        Ok(UploadedSource {
            id: source_id,
            title: filename,
        })
    }

    /// Step 1: register the source intent and recover the SOURCE_ID.
    async fn register_file_source(&self, notebook_id: &str, filename: &str) -> Result<String> {
        let params = json!([
            [[filename]],
            notebook_id,
            [2],
            [1, null, null, null, null, null, null, null, null, null, [1]]
        ]);
        let source_path = format!("/notebook/{}", notebook_id);
        let result = self
            .call_rpc_with_timeout(
                ids::RPC_ADD_SOURCE_FILE,
                params,
                &source_path,
                Duration::from_secs(60),
            )
            .await?;

        first_string(&result)
            .map(str::to_string)
            .ok_or_else(|| {
                NlmError::Upload {
                    filename: filename.to_string(),
                    details: "Failed to get SOURCE_ID from registration response".to_string(),
                }
                .into()
            })
    }

    /// Step 2: open the resumable upload session; the per-upload URL comes
    /// back in the `x-goog-upload-url` header.
    async fn start_upload_session(
        &self,
        notebook_id: &str,
        filename: &str,
        file_size: u64,
        source_id: &str,
    ) -> Result<String> {
        let url = format!(
            "{}{}?authuser=0",
            self.upload_base_url().trim_end_matches('/'),
            UPLOAD_PATH
        );
        let body = json!({
            "PROJECT_ID": notebook_id,
            "SOURCE_NAME": filename,
            "SOURCE_ID": source_id,
        })
        .to_string();

        let http = self.upload_client(START_TIMEOUT)?;
        let response = self
            .retry_policy()
            .execute(|| start_request(&http, &url, &body, file_size))
            .await?;

        response
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                NlmError::Upload {
                    filename: filename.to_string(),
                    details: "Failed to get upload URL from response headers".to_string(),
                }
                .into()
            })
    }

    /// Step 3: stream the file bytes in 64 KiB chunks and finalize.
    async fn stream_file(&self, upload_url: &str, path: &Path, filename: &str) -> Result<()> {
        let http = self.upload_client(STREAM_TIMEOUT)?;
        self.retry_policy()
            .execute(|| stream_request(&http, upload_url, path, filename))
            .await?;
        Ok(())
    }
}

async fn start_request(
    http: &reqwest::Client,
    url: &str,
    body: &str,
    file_size: u64,
) -> Result<reqwest::Response> {
    let response = http
        .post(url)
        .header("Accept", "*/*")
        .header(
            reqwest::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded;charset=UTF-8",
        )
        .header(reqwest::header::ORIGIN, "https://notebooklm.google.com")
        .header(reqwest::header::REFERER, "https://notebooklm.google.com/")
        .header("x-goog-authuser", "0")
        .header("x-goog-upload-command", "start")
        .header("x-goog-upload-header-content-length", file_size.to_string())
        .header("x-goog-upload-protocol", "resumable")
        .body(body.to_string())
        .send()
        .await
        .map_err(|e| NlmError::Transport(format!("Upload session request failed: {}", e)))?;

    check_status(response).await
}

/// The file is re-opened per attempt so a retried stream starts from the
/// beginning (offset 0 is declared in the headers).
async fn stream_request(
    http: &reqwest::Client,
    upload_url: &str,
    path: &Path,
    filename: &str,
) -> Result<()> {
    let file = tokio::fs::File::open(path).await.map_err(|e| NlmError::Upload {
        filename: filename.to_string(),
        details: format!("Failed to open file: {}", e),
    })?;
    let stream = ReaderStream::with_capacity(file, UPLOAD_CHUNK_SIZE);

    let response = http
        .post(upload_url)
        .header("Accept", "*/*")
        .header(
            reqwest::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded;charset=utf-8",
        )
        .header(reqwest::header::ORIGIN, "https://notebooklm.google.com")
        .header(reqwest::header::REFERER, "https://notebooklm.google.com/")
        .header("x-goog-authuser", "0")
        .header("x-goog-upload-command", "upload, finalize")
        .header("x-goog-upload-offset", "0")
        .body(reqwest::Body::wrap_stream(stream))
        .send()
        .await
        .map_err(|e| NlmError::Transport(format!("Upload stream failed: {}", e)))?;

    check_status(response).await?;
    Ok(())
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(NlmError::HttpStatus {
            status: status.as_u16(),
            body,
        }
        .into());
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_validate_rejects_missing_file() {
        let err = validate_upload_file(Path::new("/nonexistent/file.pdf")).unwrap_err();
        let nlm = err.downcast_ref::<NlmError>().unwrap();
        assert!(matches!(nlm, NlmError::Validation(_)));
    }

    #[test]
    fn test_validate_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        std::fs::File::create(&path).unwrap();

        let err = validate_upload_file(&path).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_validate_rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.exe");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"data").unwrap();

        let err = validate_upload_file(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported file type"));
    }

    #[test]
    fn test_validate_accepts_supported_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Notes.PDF");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"%PDF-1.4").unwrap();

        let (filename, size) = validate_upload_file(&path).unwrap();
        assert_eq!(filename, "Notes.PDF");
        assert_eq!(size, 8);
    }

    #[test]
    fn test_first_string_depth_first() {
        let value = json!([[null, [1, 2]], [["source-id-123", "later"]]]);
        assert_eq!(first_string(&value), Some("source-id-123"));
        assert_eq!(first_string(&json!([null, [1, [2]]])), None);
    }
}
