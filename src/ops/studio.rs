//! Studio artifact operations
//!
//! Artifact creation all goes through one RPC whose payload embeds the
//! per-type options at a type-specific position (audio at 6, report at 7,
//! flashcards/quiz at 9, infographic at 14, slide deck at 16, data table
//! at 18). Generation is asynchronous: creation returns an in-progress
//! artifact and callers poll the status RPC at their own cadence.

use serde_json::{json, Value};

use crate::artifacts::{self, Artifact, ArtifactStatus};
use crate::artifacts::mindmap::{self, MindMap};
use crate::error::{NlmError, Result};
use crate::rpc::ids;
use crate::rpc::transport::NotebookClient;

// Audio overview formats
pub const AUDIO_FORMAT_DEEP_DIVE: i64 = 1;
pub const AUDIO_FORMAT_BRIEF: i64 = 2;
pub const AUDIO_FORMAT_CRITIQUE: i64 = 3;
pub const AUDIO_FORMAT_DEBATE: i64 = 4;

// Audio overview lengths
pub const AUDIO_LENGTH_SHORT: i64 = 1;
pub const AUDIO_LENGTH_DEFAULT: i64 = 2;
pub const AUDIO_LENGTH_LONG: i64 = 3;

// Video overview formats and styles
pub const VIDEO_FORMAT_EXPLAINER: i64 = 1;
pub const VIDEO_FORMAT_BRIEF: i64 = 2;
pub const VIDEO_STYLE_AUTO_SELECT: i64 = 1;

// Infographic options
pub const INFOGRAPHIC_ORIENTATION_LANDSCAPE: i64 = 1;
pub const INFOGRAPHIC_ORIENTATION_PORTRAIT: i64 = 2;
pub const INFOGRAPHIC_ORIENTATION_SQUARE: i64 = 3;
pub const INFOGRAPHIC_DETAIL_CONCISE: i64 = 1;
pub const INFOGRAPHIC_DETAIL_STANDARD: i64 = 2;
pub const INFOGRAPHIC_DETAIL_DETAILED: i64 = 3;

// Slide deck options
pub const SLIDE_DECK_FORMAT_DETAILED: i64 = 1;
pub const SLIDE_DECK_FORMAT_PRESENTER: i64 = 2;
pub const SLIDE_DECK_LENGTH_DEFAULT: i64 = 3;

// Flashcard/quiz options
pub const FLASHCARD_DIFFICULTY_EASY: i64 = 1;
pub const FLASHCARD_DIFFICULTY_MEDIUM: i64 = 2;
pub const FLASHCARD_DIFFICULTY_HARD: i64 = 3;
pub const FLASHCARD_COUNT_DEFAULT: i64 = 2;

/// Status filter sent with every artifact poll.
const POLL_FILTER: &str = "NOT artifact.status = \"ARTIFACT_STATUS_SUGGESTED\"";

/// Options for audio overview creation.
#[derive(Debug, Clone)]
pub struct AudioOptions {
    pub format_code: i64,
    pub length_code: i64,
    pub language: String,
    pub focus_prompt: String,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            format_code: AUDIO_FORMAT_DEEP_DIVE,
            length_code: AUDIO_LENGTH_DEFAULT,
            language: "en".to_string(),
            focus_prompt: String::new(),
        }
    }
}

/// Options for video overview creation.
#[derive(Debug, Clone)]
pub struct VideoOptions {
    pub format_code: i64,
    pub visual_style_code: i64,
    pub language: String,
    pub focus_prompt: String,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            format_code: VIDEO_FORMAT_EXPLAINER,
            visual_style_code: VIDEO_STYLE_AUTO_SELECT,
            language: "en".to_string(),
            focus_prompt: String::new(),
        }
    }
}

/// Report formats the counterpart's frontend offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    BriefingDoc,
    StudyGuide,
    BlogPost,
    Custom,
}

impl ReportFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "briefing_doc" | "briefing-doc" => Some(ReportFormat::BriefingDoc),
            "study_guide" | "study-guide" => Some(ReportFormat::StudyGuide),
            "blog_post" | "blog-post" => Some(ReportFormat::BlogPost),
            "custom" => Some(ReportFormat::Custom),
            _ => None,
        }
    }

    fn config(&self, custom_prompt: &str) -> (&'static str, &'static str, String) {
        match self {
            ReportFormat::BriefingDoc => (
                "Briefing Doc",
                "Key insights and important quotes",
                "Create a comprehensive briefing document that includes an Executive Summary, \
                 detailed analysis of key themes, important quotes with context, and actionable \
                 insights."
                    .to_string(),
            ),
            ReportFormat::StudyGuide => (
                "Study Guide",
                "Short-answer quiz, essay questions, glossary",
                "Create a comprehensive study guide that includes key concepts, short-answer \
                 practice questions, essay prompts for deeper exploration, and a glossary of \
                 important terms."
                    .to_string(),
            ),
            ReportFormat::BlogPost => (
                "Blog Post",
                "Insightful takeaways in readable article format",
                "Write an engaging blog post that presents the key insights in an accessible, \
                 reader-friendly format. Include an attention-grabbing introduction, \
                 well-organized sections, and a compelling conclusion with takeaways."
                    .to_string(),
            ),
            ReportFormat::Custom => (
                "Custom Report",
                "Custom format",
                if custom_prompt.is_empty() {
                    "Create a report based on the provided sources.".to_string()
                } else {
                    custom_prompt.to_string()
                },
            ),
        }
    }
}

/// Acknowledgement of a studio creation request.
#[derive(Debug, Clone)]
pub struct StudioCreation {
    pub artifact_id: Option<String>,
    pub status: ArtifactStatus,
}

/// Sources in the `[[[id]], ...]` nesting used by creation payloads.
fn sources_nested(source_ids: &[String]) -> Value {
    Value::Array(
        source_ids
            .iter()
            .map(|sid| json!([[sid]]))
            .collect(),
    )
}

/// Sources in the flatter `[[id], ...]` nesting used inside option blocks.
fn sources_simple(source_ids: &[String]) -> Value {
    Value::Array(source_ids.iter().map(|sid| json!([sid])).collect())
}

fn parse_creation(result: &Value) -> Option<StudioCreation> {
    let artifact_data = result
        .as_array()
        .and_then(|r| r.first())
        .and_then(Value::as_array)?;
    Some(StudioCreation {
        artifact_id: artifact_data
            .first()
            .and_then(Value::as_str)
            .map(str::to_string),
        status: ArtifactStatus::from_code(artifact_data.get(4).and_then(Value::as_i64)),
    })
}

impl NotebookClient {
    /// Resolve explicit source ids, defaulting to every source in the
    /// notebook. Creation with zero sources is a validation error.
    async fn resolve_source_ids(
        &self,
        notebook_id: &str,
        source_ids: Option<Vec<String>>,
    ) -> Result<Vec<String>> {
        let ids = match source_ids {
            Some(ids) if !ids.is_empty() => ids,
            _ => self
                .notebook_sources(notebook_id)
                .await?
                .into_iter()
                .filter_map(|s| s.id)
                .collect(),
        };
        if ids.is_empty() {
            return Err(NlmError::Validation(format!(
                "No sources found in notebook {}. Add sources before creating studio content.",
                notebook_id
            ))
            .into());
        }
        Ok(ids)
    }

    async fn create_studio_artifact(
        &self,
        notebook_id: &str,
        content: Value,
    ) -> Result<StudioCreation> {
        let params = json!([[2], notebook_id, content]);
        let result = self
            .call_rpc(
                ids::RPC_CREATE_STUDIO,
                params,
                &format!("/notebook/{}", notebook_id),
            )
            .await?;
        parse_creation(&result).ok_or_else(|| {
            NlmError::Service("Studio creation returned no artifact record".to_string()).into()
        })
    }

    /// Create an audio overview (podcast). Options at position 6.
    pub async fn create_audio_overview(
        &self,
        notebook_id: &str,
        source_ids: Option<Vec<String>>,
        options: AudioOptions,
    ) -> Result<StudioCreation> {
        let ids = self.resolve_source_ids(notebook_id, source_ids).await?;
        let audio_options = json!([
            null,
            [
                options.focus_prompt,
                options.length_code,
                null,
                sources_simple(&ids),
                options.language,
                null,
                options.format_code
            ]
        ]);
        let content = json!([
            null, null,
            artifacts::STUDIO_TYPE_AUDIO,
            sources_nested(&ids),
            null, null,
            audio_options
        ]);
        self.create_studio_artifact(notebook_id, content).await
    }

    /// Create a video overview. Options at position 8.
    pub async fn create_video_overview(
        &self,
        notebook_id: &str,
        source_ids: Option<Vec<String>>,
        options: VideoOptions,
    ) -> Result<StudioCreation> {
        let ids = self.resolve_source_ids(notebook_id, source_ids).await?;
        let video_options = json!([
            null, null,
            [
                sources_simple(&ids),
                options.language,
                options.focus_prompt,
                null,
                options.format_code,
                options.visual_style_code
            ]
        ]);
        let content = json!([
            null, null,
            artifacts::STUDIO_TYPE_VIDEO,
            sources_nested(&ids),
            null, null, null, null,
            video_options
        ]);
        self.create_studio_artifact(notebook_id, content).await
    }

    /// Create a report. Options at position 7.
    pub async fn create_report(
        &self,
        notebook_id: &str,
        source_ids: Option<Vec<String>>,
        format: ReportFormat,
        custom_prompt: &str,
        language: &str,
    ) -> Result<StudioCreation> {
        let ids = self.resolve_source_ids(notebook_id, source_ids).await?;
        let (title, description, prompt) = format.config(custom_prompt);

        let report_options = json!([
            null,
            [
                title,
                description,
                null,
                sources_simple(&ids),
                language,
                prompt,
                null,
                true
            ]
        ]);
        let content = json!([
            null, null,
            artifacts::STUDIO_TYPE_REPORT,
            sources_nested(&ids),
            null, null, null,
            report_options
        ]);
        self.create_studio_artifact(notebook_id, content).await
    }

    /// Create flashcards. Options at position 9, variant code 1.
    pub async fn create_flashcards(
        &self,
        notebook_id: &str,
        source_ids: Option<Vec<String>>,
        difficulty_code: i64,
    ) -> Result<StudioCreation> {
        let ids = self.resolve_source_ids(notebook_id, source_ids).await?;
        let flashcard_options = json!([
            null,
            [1, null, null, null, null, null, [difficulty_code, FLASHCARD_COUNT_DEFAULT]]
        ]);
        let content = json!([
            null, null,
            artifacts::STUDIO_TYPE_FLASHCARDS,
            sources_nested(&ids),
            null, null, null, null, null,
            flashcard_options
        ]);
        self.create_studio_artifact(notebook_id, content).await
    }

    /// Create a quiz. Same type code as flashcards, variant code 2.
    pub async fn create_quiz(
        &self,
        notebook_id: &str,
        source_ids: Option<Vec<String>>,
        question_count: i64,
        difficulty_code: i64,
    ) -> Result<StudioCreation> {
        let ids = self.resolve_source_ids(notebook_id, source_ids).await?;
        let quiz_options = json!([
            null,
            [2, null, null, null, null, null, null, [question_count, difficulty_code]]
        ]);
        let content = json!([
            null, null,
            artifacts::STUDIO_TYPE_FLASHCARDS,
            sources_nested(&ids),
            null, null, null, null, null,
            quiz_options
        ]);
        self.create_studio_artifact(notebook_id, content).await
    }

    /// Create an infographic. Options at position 14.
    pub async fn create_infographic(
        &self,
        notebook_id: &str,
        source_ids: Option<Vec<String>>,
        orientation_code: i64,
        detail_level_code: i64,
        language: &str,
        focus_prompt: &str,
    ) -> Result<StudioCreation> {
        let ids = self.resolve_source_ids(notebook_id, source_ids).await?;
        let focus = if focus_prompt.is_empty() {
            Value::Null
        } else {
            Value::String(focus_prompt.to_string())
        };
        let infographic_options =
            json!([[focus, language, null, orientation_code, detail_level_code]]);
        let content = json!([
            null, null,
            artifacts::STUDIO_TYPE_INFOGRAPHIC,
            sources_nested(&ids),
            null, null, null, null, null, null, null, null, null, null,
            infographic_options
        ]);
        self.create_studio_artifact(notebook_id, content).await
    }

    /// Create a slide deck. Options at position 16.
    pub async fn create_slide_deck(
        &self,
        notebook_id: &str,
        source_ids: Option<Vec<String>>,
        format_code: i64,
        length_code: i64,
        language: &str,
        focus_prompt: &str,
    ) -> Result<StudioCreation> {
        let ids = self.resolve_source_ids(notebook_id, source_ids).await?;
        let focus = if focus_prompt.is_empty() {
            Value::Null
        } else {
            Value::String(focus_prompt.to_string())
        };
        let slide_deck_options = json!([[focus, language, format_code, length_code]]);
        let content = json!([
            null, null,
            artifacts::STUDIO_TYPE_SLIDE_DECK,
            sources_nested(&ids),
            null, null, null, null, null, null, null, null, null, null, null, null,
            slide_deck_options
        ]);
        self.create_studio_artifact(notebook_id, content).await
    }

    /// Create a data table. Options at position 18.
    pub async fn create_data_table(
        &self,
        notebook_id: &str,
        source_ids: Option<Vec<String>>,
        description: &str,
        language: &str,
    ) -> Result<StudioCreation> {
        let ids = self.resolve_source_ids(notebook_id, source_ids).await?;
        let datatable_options = json!([null, [description, language]]);
        let content = json!([
            null, null,
            artifacts::STUDIO_TYPE_DATA_TABLE,
            sources_nested(&ids),
            null, null, null, null, null, null, null, null, null, null, null, null, null, null,
            datatable_options
        ]);
        self.create_studio_artifact(notebook_id, content).await
    }

    /// Poll studio artifact status for a notebook.
    pub async fn poll_studio_status(&self, notebook_id: &str) -> Result<Vec<Artifact>> {
        let raw = self.studio_artifacts_raw(notebook_id).await?;
        Ok(raw.iter().filter_map(artifacts::parse_artifact_entry).collect())
    }

    /// Raw artifact entries from the status poll, for the download paths
    /// that navigate positional metadata directly.
    pub(crate) async fn studio_artifacts_raw(&self, notebook_id: &str) -> Result<Vec<Value>> {
        let params = json!([[2], notebook_id, POLL_FILTER]);
        let result = self
            .call_rpc(
                ids::RPC_POLL_STUDIO,
                params,
                &format!("/notebook/{}", notebook_id),
            )
            .await?;

        Ok(match result.as_array() {
            Some(items) if !items.is_empty() => match items[0].as_array() {
                Some(inner) => inner.clone(),
                None => items.clone(),
            },
            _ => Vec::new(),
        })
    }

    /// Delete a studio artifact. Irreversible. Mind maps need a different
    /// RPC, so a failed standard delete falls back when a notebook id is
    /// available.
    pub async fn delete_studio_artifact(
        &self,
        artifact_id: &str,
        notebook_id: Option<&str>,
    ) -> Result<bool> {
        let standard = self
            .call_rpc(ids::RPC_DELETE_STUDIO, json!([[2], artifact_id]), "/")
            .await;
        match standard {
            Ok(result) if !result.is_null() => return Ok(true),
            Ok(_) => {}
            Err(e) => tracing::debug!("Standard artifact delete failed: {}", e),
        }

        if let Some(nb) = notebook_id {
            return self.delete_mind_map(nb, artifact_id).await;
        }
        Ok(false)
    }

    /// Rename a studio artifact.
    pub async fn rename_studio_artifact(
        &self,
        artifact_id: &str,
        new_title: &str,
    ) -> Result<bool> {
        // Payload: [[id, title], [["title"]]] (field-mask style)
        let params = json!([[artifact_id, new_title], [["title"]]]);
        let result = self.call_rpc(ids::RPC_RENAME_ARTIFACT, params, "/").await?;
        Ok(!result.is_null())
    }

    /// Generate a mind map document from sources (step 1 of 2).
    pub async fn generate_mind_map(
        &self,
        notebook_id: &str,
        source_ids: Option<Vec<String>>,
    ) -> Result<(Option<String>, Option<String>)> {
        let ids_vec = self.resolve_source_ids(notebook_id, source_ids).await?;
        let params = json!([
            sources_nested(&ids_vec),
            null, null, null, null,
            ["interactive_mindmap", [["[CONTEXT]", ""]], ""],
            null,
            [2, null, [1]]
        ]);
        let result = self.call_rpc(ids::RPC_GENERATE_MIND_MAP, params, "/").await?;

        // Response: [[json_string, null, [generation_ids]]]
        let inner = result
            .as_array()
            .and_then(|r| r.first())
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let document_json = inner
            .first()
            .and_then(Value::as_str)
            .map(str::to_string);
        let generation_id = inner
            .get(2)
            .and_then(Value::as_array)
            .and_then(|g| g.first())
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok((document_json, generation_id))
    }

    /// Save a generated mind map into the notebook (step 2 of 2).
    pub async fn save_mind_map(
        &self,
        notebook_id: &str,
        mind_map_json: &str,
        source_ids: Option<Vec<String>>,
        title: &str,
    ) -> Result<Option<String>> {
        let ids_vec = self.resolve_source_ids(notebook_id, source_ids).await?;
        let metadata = json!([2, null, null, 5, sources_simple(&ids_vec)]);
        let params = json!([notebook_id, mind_map_json, metadata, null, title]);

        let result = self
            .call_rpc(
                ids::RPC_SAVE_MIND_MAP,
                params,
                &format!("/notebook/{}", notebook_id),
            )
            .await?;

        // Response: [[mind_map_id, json, metadata, null, title]]
        Ok(result
            .as_array()
            .and_then(|r| r.first())
            .and_then(Value::as_array)
            .and_then(|inner| inner.first())
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// List mind maps (tombstones excluded).
    pub async fn list_mind_maps(&self, notebook_id: &str) -> Result<Vec<MindMap>> {
        let result = self
            .call_rpc(
                ids::RPC_LIST_MIND_MAPS,
                json!([notebook_id]),
                &format!("/notebook/{}", notebook_id),
            )
            .await?;
        Ok(mindmap::parse_mind_map_list(&result))
    }

    /// Delete a mind map using the observed two-step RPC sequence.
    ///
    /// The second, timestamp-carrying call is required to fully remove the
    /// entry; without it the list keeps a ghost.
    pub async fn delete_mind_map(&self, notebook_id: &str, mind_map_id: &str) -> Result<bool> {
        let source_path = format!("/notebook/{}", notebook_id);

        let list_result = self
            .call_rpc(ids::RPC_LIST_MIND_MAPS, json!([notebook_id]), &source_path)
            .await?;
        let timestamp = mindmap::delete_timestamp_for(&list_result, mind_map_id);

        self.call_rpc(
            ids::RPC_DELETE_MIND_MAP,
            json!([notebook_id, null, [mind_map_id], [2]]),
            &source_path,
        )
        .await?;

        if let Some(ts) = timestamp {
            self.call_rpc(
                ids::RPC_LIST_MIND_MAPS,
                json!([notebook_id, null, ts, [2]]),
                &source_path,
            )
            .await?;
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_nestings() {
        let ids = vec!["a".to_string(), "b".to_string()];
        assert_eq!(sources_nested(&ids), json!([[["a"]], [["b"]]]));
        assert_eq!(sources_simple(&ids), json!([["a"], ["b"]]));
    }

    #[test]
    fn test_parse_creation() {
        let result = json!([["artifact-1", "Title", 1, null, 1]]);
        let creation = parse_creation(&result).unwrap();
        assert_eq!(creation.artifact_id.as_deref(), Some("artifact-1"));
        assert_eq!(creation.status, ArtifactStatus::InProgress);
        assert!(parse_creation(&json!(null)).is_none());
    }

    #[test]
    fn test_report_format_parse() {
        assert_eq!(
            ReportFormat::parse("briefing_doc"),
            Some(ReportFormat::BriefingDoc)
        );
        assert_eq!(ReportFormat::parse("custom"), Some(ReportFormat::Custom));
        assert_eq!(ReportFormat::parse("unknown"), None);
    }

    #[test]
    fn test_custom_report_uses_prompt() {
        let (_, _, prompt) = ReportFormat::Custom.config("my special prompt");
        assert_eq!(prompt, "my special prompt");
        let (_, _, fallback) = ReportFormat::Custom.config("");
        assert!(fallback.contains("Create a report"));
    }
}
