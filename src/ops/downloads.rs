//! Artifact download service
//!
//! Validation and routing shared by every download surface: resolves the
//! requested artifact against the status poll, dispatches streaming types
//! (audio/video/infographic/slide deck) through the download engine and
//! text types (report/data table/mind map/quiz/flashcards) through their
//! parsers, and wraps any unexpected lower-layer failure in a service
//! error so callers never see raw internals.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::artifacts::interactive::{self, InteractiveFormat};
use crate::artifacts::mindmap;
use crate::artifacts::table;
use crate::artifacts::views::parse_error;
use crate::artifacts::{media, ArtifactType, STATUS_COMPLETED};
use crate::download::{self, ProgressCallback};
use crate::error::{NlmError, Result};
use crate::rpc::ids;
use crate::rpc::transport::NotebookClient;

/// Outcome of a download operation.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub artifact_type: ArtifactType,
    pub path: PathBuf,
}

fn type_code_for(artifact_type: ArtifactType) -> Option<i64> {
    match artifact_type {
        ArtifactType::Audio => Some(crate::artifacts::STUDIO_TYPE_AUDIO),
        ArtifactType::Video => Some(crate::artifacts::STUDIO_TYPE_VIDEO),
        ArtifactType::Report => Some(crate::artifacts::STUDIO_TYPE_REPORT),
        ArtifactType::Infographic => Some(crate::artifacts::STUDIO_TYPE_INFOGRAPHIC),
        ArtifactType::SlideDeck => Some(crate::artifacts::STUDIO_TYPE_SLIDE_DECK),
        ArtifactType::DataTable => Some(crate::artifacts::STUDIO_TYPE_DATA_TABLE),
        ArtifactType::Quiz | ArtifactType::Flashcards => {
            Some(crate::artifacts::STUDIO_TYPE_FLASHCARDS)
        }
        // Mind maps live in the notes system, not the artifact poll.
        ArtifactType::MindMap => None,
    }
}

/// Filter completed artifacts of one type from the raw poll entries.
fn completed_candidates(entries: &[Value], type_code: i64) -> Vec<&Value> {
    entries
        .iter()
        .filter(|entry| {
            entry
                .as_array()
                .filter(|items| items.len() > 4)
                .map(|items| {
                    items.get(2).and_then(Value::as_i64) == Some(type_code)
                        && items.get(4).and_then(Value::as_i64) == Some(STATUS_COMPLETED)
                })
                .unwrap_or(false)
        })
        .collect()
}

/// Pick the requested artifact (or the most recent) from the candidates.
fn select_target<'a>(
    candidates: Vec<&'a Value>,
    artifact_id: Option<&str>,
    artifact_type: ArtifactType,
) -> Result<&'a Value> {
    if candidates.is_empty() {
        return Err(NlmError::ArtifactNotReady {
            artifact_type: artifact_type.as_str().to_string(),
            id: None,
        }
        .into());
    }
    match artifact_id {
        Some(id) => candidates
            .into_iter()
            .find(|entry| {
                entry
                    .as_array()
                    .and_then(|items| items.first())
                    .and_then(Value::as_str)
                    == Some(id)
            })
            .ok_or_else(|| {
                NlmError::ArtifactNotReady {
                    artifact_type: artifact_type.as_str().to_string(),
                    id: Some(id.to_string()),
                }
                .into()
            }),
        None => Ok(candidates[0]),
    }
}

impl NotebookClient {
    /// Download an artifact of any supported type to a local file.
    pub async fn download_artifact(
        &self,
        notebook_id: &str,
        artifact_type: ArtifactType,
        output_path: &Path,
        artifact_id: Option<&str>,
        output_format: InteractiveFormat,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<DownloadResult> {
        let path = self
            .dispatch_download(
                notebook_id,
                artifact_type,
                output_path,
                artifact_id,
                output_format,
                progress,
            )
            .await
            .map_err(|e| service_boundary(e, artifact_type))?;

        Ok(DownloadResult {
            artifact_type,
            path,
        })
    }

    async fn dispatch_download(
        &self,
        notebook_id: &str,
        artifact_type: ArtifactType,
        output_path: &Path,
        artifact_id: Option<&str>,
        output_format: InteractiveFormat,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<PathBuf> {
        match artifact_type {
            ArtifactType::Audio
            | ArtifactType::Video
            | ArtifactType::Infographic
            | ArtifactType::SlideDeck => {
                self.download_media(notebook_id, artifact_type, output_path, artifact_id, progress)
                    .await
            }
            ArtifactType::Report => {
                self.download_report(notebook_id, output_path, artifact_id)
                    .await
            }
            ArtifactType::DataTable => {
                self.download_data_table(notebook_id, output_path, artifact_id)
                    .await
            }
            ArtifactType::MindMap => {
                self.download_mind_map(notebook_id, output_path, artifact_id)
                    .await
            }
            ArtifactType::Quiz | ArtifactType::Flashcards => {
                self.download_interactive(
                    notebook_id,
                    artifact_type,
                    output_path,
                    artifact_id,
                    output_format,
                )
                .await
            }
        }
    }

    /// Streamed binary types: resolve the CDN URL from the positional
    /// metadata, then hand off to the download engine.
    async fn download_media(
        &self,
        notebook_id: &str,
        artifact_type: ArtifactType,
        output_path: &Path,
        artifact_id: Option<&str>,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<PathBuf> {
        let entries = self.studio_artifacts_raw(notebook_id).await?;
        let type_code = type_code_for(artifact_type).expect("media types have a poll type code");
        let target = select_target(
            completed_candidates(&entries, type_code),
            artifact_id,
            artifact_type,
        )?;

        let url = match artifact_type {
            ArtifactType::Audio => media::audio_download_url(target)?,
            ArtifactType::Video => media::video_download_url(target)?,
            ArtifactType::Infographic => media::infographic_download_url(target)?,
            ArtifactType::SlideDeck => media::slide_deck_download_url(target)?,
            _ => unreachable!("non-media type in download_media"),
        };

        let http = self.streaming_client()?;
        download::download_url(&http, &url, output_path, progress).await
    }

    async fn download_report(
        &self,
        notebook_id: &str,
        output_path: &Path,
        artifact_id: Option<&str>,
    ) -> Result<PathBuf> {
        let entries = self.studio_artifacts_raw(notebook_id).await?;
        let target = select_target(
            completed_candidates(&entries, crate::artifacts::STUDIO_TYPE_REPORT),
            artifact_id,
            ArtifactType::Report,
        )?;

        // Report content at index 7, either [markdown, ...] or a bare string.
        let wrapper = target
            .as_array()
            .and_then(|items| items.get(7))
            .ok_or_else(|| parse_error("report", "missing content at artifact[7]"))?;
        let markdown = match wrapper {
            Value::String(s) => s.as_str(),
            Value::Array(items) => items
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| parse_error("report", "expected string at artifact[7][0]"))?,
            other => {
                return Err(parse_error(
                    "report",
                    format!("unexpected content shape at artifact[7]: {}", other),
                ))
            }
        };

        write_text(output_path, markdown).await?;
        Ok(output_path.to_path_buf())
    }

    async fn download_data_table(
        &self,
        notebook_id: &str,
        output_path: &Path,
        artifact_id: Option<&str>,
    ) -> Result<PathBuf> {
        let entries = self.studio_artifacts_raw(notebook_id).await?;
        let target = select_target(
            completed_candidates(&entries, crate::artifacts::STUDIO_TYPE_DATA_TABLE),
            artifact_id,
            ArtifactType::DataTable,
        )?;

        // Table payload at index 18.
        let raw = target
            .as_array()
            .and_then(|items| items.get(18))
            .ok_or_else(|| parse_error("data_table", "missing payload at artifact[18]"))?;
        let (headers, rows) = table::parse_data_table(raw)?;

        ensure_parent(output_path).await?;
        table::write_csv(output_path, &headers, &rows)?;
        Ok(output_path.to_path_buf())
    }

    async fn download_mind_map(
        &self,
        notebook_id: &str,
        output_path: &Path,
        artifact_id: Option<&str>,
    ) -> Result<PathBuf> {
        let maps = self.list_mind_maps(notebook_id).await?;
        if maps.is_empty() {
            return Err(NlmError::ArtifactNotReady {
                artifact_type: "mind_map".to_string(),
                id: None,
            }
            .into());
        }

        let target = match artifact_id {
            Some(id) => maps.iter().find(|m| m.id == id).ok_or(NlmError::ArtifactNotFound {
                id: id.to_string(),
                artifact_type: "mind_map".to_string(),
            })?,
            None => &maps[0],
        };

        let document = mindmap::decoded_document(target)?;
        write_text(output_path, &serde_json::to_string_pretty(&document)?).await?;
        Ok(output_path.to_path_buf())
    }

    async fn download_interactive(
        &self,
        notebook_id: &str,
        artifact_type: ArtifactType,
        output_path: &Path,
        artifact_id: Option<&str>,
        output_format: InteractiveFormat,
    ) -> Result<PathBuf> {
        let entries = self.studio_artifacts_raw(notebook_id).await?;
        let target = select_target(
            completed_candidates(&entries, crate::artifacts::STUDIO_TYPE_FLASHCARDS),
            artifact_id,
            artifact_type,
        )?;
        let items = target.as_array().expect("candidates are arrays");
        let target_id = items
            .first()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let title = items
            .get(1)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Untitled {}", artifact_type.as_str()));

        let html = self
            .fetch_interactive_html(notebook_id, &target_id)
            .await?
            .ok_or_else(|| NlmError::ArtifactDownload {
                artifact_type: artifact_type.as_str().to_string(),
                details: "Failed to fetch HTML content from API".to_string(),
            })?;

        let app_data = interactive::extract_app_data(&html)?;
        let rendered = interactive::render_interactive(
            &app_data,
            &title,
            output_format,
            &html,
            artifact_type == ArtifactType::Quiz,
        )?;

        write_text(output_path, &rendered).await?;
        tracing::info!(
            "Downloaded {} to {} ({} format)",
            artifact_type.as_str(),
            output_path.display(),
            output_format.as_str()
        );
        Ok(output_path.to_path_buf())
    }

    /// Fetch the HTML payload for a quiz/flashcard artifact
    /// (`result[0][9][0]`).
    async fn fetch_interactive_html(
        &self,
        notebook_id: &str,
        artifact_id: &str,
    ) -> Result<Option<String>> {
        let result = self
            .call_rpc(
                ids::RPC_GET_INTERACTIVE_HTML,
                serde_json::json!([artifact_id]),
                &format!("/notebook/{}", notebook_id),
            )
            .await?;

        Ok(result
            .as_array()
            .and_then(|r| r.first())
            .and_then(Value::as_array)
            .and_then(|data| data.get(9))
            .and_then(Value::as_array)
            .and_then(|container| container.first())
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

/// Pass typed errors through; wrap anything else so CLI/agent layers never
/// see raw lower-layer failures.
fn service_boundary(err: anyhow::Error, artifact_type: ArtifactType) -> anyhow::Error {
    if err.downcast_ref::<NlmError>().is_some() {
        return err;
    }
    NlmError::Service(format!(
        "Download failed for {}: {}",
        artifact_type.as_str(),
        err
    ))
    .into()
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

async fn write_text(path: &Path, content: &str) -> Result<()> {
    ensure_parent(path).await?;
    tokio::fs::write(path, content).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn completed(id: &str, type_code: i64) -> Value {
        json!([id, "title", type_code, null, STATUS_COMPLETED])
    }

    #[test]
    fn test_completed_candidates_filters_type_and_status() {
        let entries = vec![
            completed("a1", 1),
            json!(["a2", "t", 1, null, 1]), // in progress
            completed("a3", 3),             // other type
            json!("not an entry"),
        ];
        let audio = completed_candidates(&entries, 1);
        assert_eq!(audio.len(), 1);
        assert_eq!(audio[0][0], "a1");
    }

    #[test]
    fn test_select_target_by_id() {
        let entries = vec![completed("a1", 1), completed("a2", 1)];
        let candidates: Vec<&Value> = entries.iter().collect();
        let target = select_target(candidates, Some("a2"), ArtifactType::Audio).unwrap();
        assert_eq!(target[0], "a2");
    }

    #[test]
    fn test_select_target_missing_id_is_not_ready() {
        let entries = vec![completed("a1", 1)];
        let err = select_target(entries.iter().collect(), Some("zzz"), ArtifactType::Audio)
            .unwrap_err();
        let nlm = err.downcast_ref::<NlmError>().unwrap();
        assert!(matches!(nlm, NlmError::ArtifactNotReady { id: Some(_), .. }));
    }

    #[test]
    fn test_select_target_empty_is_not_ready() {
        let err = select_target(Vec::new(), None, ArtifactType::Video).unwrap_err();
        assert!(err.to_string().contains("video"));
    }

    #[test]
    fn test_service_boundary_wraps_foreign_errors() {
        let wrapped = service_boundary(anyhow::anyhow!("boom"), ArtifactType::Audio);
        let nlm = wrapped.downcast_ref::<NlmError>().unwrap();
        assert!(matches!(nlm, NlmError::Service(_)));

        let typed = service_boundary(
            NlmError::Validation("bad".into()).into(),
            ArtifactType::Audio,
        );
        assert!(matches!(
            typed.downcast_ref::<NlmError>().unwrap(),
            NlmError::Validation(_)
        ));
    }
}
