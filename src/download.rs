//! Streaming artifact download engine
//!
//! Downloads to a sibling `.tmp` path and renames into place only on full
//! success, so a failed transfer never corrupts the destination. The body
//! streams in chunks with per-chunk timeouts (a stalled connection is
//! surfaced instead of hanging until the overall deadline), and an HTML
//! response is sniffed for the login page before any bytes are written.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::time::{timeout, Duration};

use crate::error::{NlmError, Result};

/// Per-chunk read timeout; shorter than any whole-operation budget so a
/// stall is detected quickly.
pub const CHUNK_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Progress callback invoked after every chunk with
/// `(bytes_downloaded, total_bytes_or_zero)`.
pub type ProgressCallback<'a> = &'a mut (dyn FnMut(u64, u64) + Send);

/// Download a URL to a local file with bounded memory.
///
/// Returns the final destination path. On any failure the temp file is
/// removed and the error is re-raised as a typed download error, except
/// for an authentication redirect which surfaces as an authentication
/// error so the caller can route it into recovery.
pub async fn download_url(
    http: &reqwest::Client,
    url: &str,
    output_path: &Path,
    mut progress: Option<ProgressCallback<'_>>,
) -> Result<PathBuf> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let temp_path = temp_path_for(output_path);

    match stream_to_file(http, url, &temp_path, &mut progress).await {
        Ok(()) => {
            tokio::fs::rename(&temp_path, output_path).await?;
            Ok(output_path.to_path_buf())
        }
        Err(err) => {
            let _ = tokio::fs::remove_file(&temp_path).await;
            if crate::error::is_auth_error(&err) {
                return Err(err);
            }
            Err(NlmError::ArtifactDownload {
                artifact_type: "file".to_string(),
                details: format!("Failed to download from {}: {}", truncate_url(url), err),
            }
            .into())
        }
    }
}

/// Sibling temp path: `report.md` -> `report.md.tmp`.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn truncate_url(url: &str) -> String {
    if url.len() > 50 {
        format!("{}...", &url[..50])
    } else {
        url.to_string()
    }
}

async fn stream_to_file(
    http: &reqwest::Client,
    url: &str,
    temp_path: &Path,
    progress: &mut Option<ProgressCallback<'_>>,
) -> Result<()> {
    let response = http
        .get(url)
        .header(reqwest::header::REFERER, "https://notebooklm.google.com/")
        .send()
        .await
        .map_err(|e| NlmError::Transport(format!("Download request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(NlmError::HttpStatus {
            status: status.as_u16(),
            body: String::new(),
        }
        .into());
    }

    let total_bytes = response.content_length().unwrap_or(0);
    let is_html = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("text/html"))
        .unwrap_or(false);

    let mut stream = Box::pin(response.bytes_stream());
    let mut file = tokio::fs::File::create(temp_path).await?;
    let mut downloaded: u64 = 0;

    if is_html {
        // An HTML body is suspicious for a binary artifact: peek the first
        // chunk for the login page before writing anything.
        if let Some(first) = next_chunk(&mut stream).await? {
            let preview = String::from_utf8_lossy(&first[..first.len().min(2048)]).to_lowercase();
            if preview.contains("<!doctype html>") || preview.contains("sign in") {
                return Err(NlmError::Authentication(
                    "Download redirected to login page. Run `nlm login` to refresh credentials."
                        .to_string(),
                )
                .into());
            }
            file.write_all(&first).await?;
            downloaded += first.len() as u64;
            if let Some(cb) = progress.as_mut() {
                cb(downloaded, total_bytes);
            }
        }
    }

    while let Some(chunk) = next_chunk(&mut stream).await? {
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        if let Some(cb) = progress.as_mut() {
            cb(downloaded, total_bytes);
        }
    }

    file.flush().await?;
    Ok(())
}

/// Read the next chunk with a per-chunk timeout so stalls surface.
async fn next_chunk<S>(stream: &mut S) -> Result<Option<bytes::Bytes>>
where
    S: futures::Stream<Item = std::result::Result<bytes::Bytes, reqwest::Error>> + Unpin,
{
    match timeout(CHUNK_READ_TIMEOUT, stream.next()).await {
        Ok(Some(Ok(chunk))) => Ok(Some(chunk)),
        Ok(Some(Err(e))) => {
            Err(NlmError::Transport(format!("Download stream error: {}", e)).into())
        }
        Ok(None) => Ok(None),
        Err(_) => Err(NlmError::Transport(format!(
            "Download stalled: no data for {}s",
            CHUNK_READ_TIMEOUT.as_secs()
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_appends_suffix() {
        assert_eq!(
            temp_path_for(Path::new("/tmp/out/report.md")),
            Path::new("/tmp/out/report.md.tmp")
        );
        assert_eq!(
            temp_path_for(Path::new("audio.m4a")),
            Path::new("audio.m4a.tmp")
        );
    }

    #[test]
    fn test_truncate_url() {
        let long = "x".repeat(80);
        assert_eq!(truncate_url(&long).len(), 53);
        assert_eq!(truncate_url("short"), "short");
    }
}
