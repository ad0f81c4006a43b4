//! Artifact payload parsers
//!
//! The counterpart's responses have no field names, only array positions by
//! convention. These modules isolate that brittle positional contract into
//! small named view functions, each asserting the shape it expects and
//! raising a typed parse error on mismatch, so schema drift is detected
//! loudly instead of corrupting output.

pub mod interactive;
pub mod media;
pub mod mindmap;
pub mod table;
pub mod views;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

// Studio artifact type codes
pub const STUDIO_TYPE_AUDIO: i64 = 1;
pub const STUDIO_TYPE_VIDEO: i64 = 3;
/// Shared by flashcards and quizzes; the variant code inside the options
/// block tells them apart (1 = flashcards, 2 = quiz).
pub const STUDIO_TYPE_FLASHCARDS: i64 = 4;
pub const STUDIO_TYPE_REPORT: i64 = 6;
pub const STUDIO_TYPE_INFOGRAPHIC: i64 = 7;
pub const STUDIO_TYPE_SLIDE_DECK: i64 = 8;
pub const STUDIO_TYPE_DATA_TABLE: i64 = 9;

// Artifact status codes
pub const STATUS_IN_PROGRESS: i64 = 1;
pub const STATUS_COMPLETED: i64 = 3;
pub const STATUS_FAILED: i64 = 4;

/// Focus prompts live inside the audio options block at this artifact index.
const FOCUS_PROMPT_INDEX: usize = 6;

/// Lifecycle status of a generated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    InProgress,
    Completed,
    Failed,
    Unknown,
}

impl ArtifactStatus {
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(STATUS_IN_PROGRESS) => ArtifactStatus::InProgress,
            Some(STATUS_COMPLETED) => ArtifactStatus::Completed,
            Some(STATUS_FAILED) => ArtifactStatus::Failed,
            _ => ArtifactStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactStatus::InProgress => "in_progress",
            ArtifactStatus::Completed => "completed",
            ArtifactStatus::Failed => "failed",
            ArtifactStatus::Unknown => "unknown",
        }
    }
}

/// Artifact kinds addressable by download operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactType {
    Audio,
    Video,
    Report,
    MindMap,
    SlideDeck,
    Infographic,
    DataTable,
    Quiz,
    Flashcards,
}

impl ArtifactType {
    pub const ALL: [ArtifactType; 9] = [
        ArtifactType::Audio,
        ArtifactType::Video,
        ArtifactType::Report,
        ArtifactType::MindMap,
        ArtifactType::SlideDeck,
        ArtifactType::Infographic,
        ArtifactType::DataTable,
        ArtifactType::Quiz,
        ArtifactType::Flashcards,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::Audio => "audio",
            ArtifactType::Video => "video",
            ArtifactType::Report => "report",
            ArtifactType::MindMap => "mind_map",
            ArtifactType::SlideDeck => "slide_deck",
            ArtifactType::Infographic => "infographic",
            ArtifactType::DataTable => "data_table",
            ArtifactType::Quiz => "quiz",
            ArtifactType::Flashcards => "flashcards",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == name)
    }

    /// Types whose bytes stream from a CDN URL (progress-reporting path).
    pub fn is_streaming(&self) -> bool {
        matches!(
            self,
            ArtifactType::Audio
                | ArtifactType::Video
                | ArtifactType::SlideDeck
                | ArtifactType::Infographic
        )
    }

    /// Types whose payload is HTML with embedded JSON.
    pub fn is_interactive(&self) -> bool {
        matches!(self, ArtifactType::Quiz | ArtifactType::Flashcards)
    }

    /// Default file extension for downloads of this type.
    pub fn default_extension(&self) -> &'static str {
        match self {
            ArtifactType::Audio => "m4a",
            ArtifactType::Video => "mp4",
            ArtifactType::Report => "md",
            ArtifactType::MindMap => "json",
            ArtifactType::SlideDeck => "pdf",
            ArtifactType::Infographic => "png",
            ArtifactType::DataTable => "csv",
            ArtifactType::Quiz | ArtifactType::Flashcards => "json",
        }
    }
}

/// Summary of one studio artifact as reported by the status poll.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub id: String,
    pub title: String,
    pub type_code: i64,
    pub artifact_type: String,
    pub status: ArtifactStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub custom_instructions: Option<String>,
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
    pub infographic_url: Option<String>,
    pub slide_deck_url: Option<String>,
    pub report_content: Option<String>,
    pub flashcard_count: Option<usize>,
    pub duration_seconds: Option<i64>,
}

/// Parse `[seconds, nanos]` timestamps used throughout the responses.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let ts = value.as_array()?;
    let seconds = ts.first()?.as_i64()?;
    Utc.timestamp_opt(seconds, 0).single()
}

/// Parse one entry of the studio status poll into an [`Artifact`].
///
/// Returns `None` for entries too short to carry id/type/status; malformed
/// per-type metadata degrades to absent fields rather than an error (the
/// poll is a summary, not the download path).
pub fn parse_artifact_entry(entry: &Value) -> Option<Artifact> {
    let items = entry.as_array()?;
    if items.len() < 5 {
        return None;
    }

    let id = items[0].as_str()?.to_string();
    let title = items
        .get(1)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let type_code = items.get(2).and_then(Value::as_i64)?;
    let status = ArtifactStatus::from_code(items.get(4).and_then(Value::as_i64));

    let mut audio_url = None;
    let mut duration_seconds = None;
    if type_code == STUDIO_TYPE_AUDIO {
        if let Some(options) = items.get(6).and_then(Value::as_array) {
            audio_url = options.get(3).and_then(Value::as_str).map(str::to_string);
            duration_seconds = options
                .get(9)
                .and_then(Value::as_array)
                .and_then(|d| d.first())
                .and_then(Value::as_i64);
        }
    }

    let mut video_url = None;
    if type_code == STUDIO_TYPE_VIDEO {
        if let Some(options) = items.get(8).and_then(Value::as_array) {
            video_url = options.get(3).and_then(Value::as_str).map(str::to_string);
        }
    }

    // Infographic image URL sits behind [14][2][0][1][0].
    let mut infographic_url = None;
    if type_code == STUDIO_TYPE_INFOGRAPHIC {
        infographic_url = items
            .get(14)
            .and_then(Value::as_array)
            .and_then(|o| o.get(2))
            .and_then(Value::as_array)
            .and_then(|images| images.first())
            .and_then(Value::as_array)
            .and_then(|img| img.get(1))
            .and_then(Value::as_array)
            .and_then(|details| details.first())
            .and_then(Value::as_str)
            .filter(|u| u.starts_with("http"))
            .map(str::to_string);
    }

    let mut slide_deck_url = None;
    if type_code == STUDIO_TYPE_SLIDE_DECK {
        if let Some(options) = items.get(16).and_then(Value::as_array) {
            slide_deck_url = options
                .first()
                .and_then(Value::as_str)
                .filter(|u| u.starts_with("http"))
                .map(str::to_string)
                .or_else(|| options.get(3).and_then(Value::as_str).map(str::to_string));
        }
    }

    let mut report_content = None;
    if type_code == STUDIO_TYPE_REPORT {
        report_content = items
            .get(7)
            .and_then(Value::as_array)
            .and_then(|o| o.get(1))
            .and_then(Value::as_array)
            .and_then(|c| c.first())
            .and_then(Value::as_str)
            .map(str::to_string);
    }

    // Quiz and flashcards share a type code; the variant code inside the
    // options block distinguishes them (1 = flashcards, 2 = quiz).
    let mut is_quiz = false;
    let mut flashcard_count = None;
    if type_code == STUDIO_TYPE_FLASHCARDS {
        if let Some(inner) = items
            .get(9)
            .and_then(Value::as_array)
            .and_then(|o| o.get(1))
            .and_then(Value::as_array)
        {
            if inner.first().and_then(Value::as_i64) == Some(2) {
                is_quiz = true;
            }
            flashcard_count = Some(inner.len());
        }
    }

    // Timestamp position varies by type; probe the known candidates for a
    // plausible [seconds, nanos] pair.
    let mut created_at = None;
    for position in [10usize, 15, 17] {
        if let Some(candidate) = items.get(position) {
            let plausible = candidate
                .as_array()
                .and_then(|a| a.first())
                .and_then(Value::as_i64)
                .map(|s| s > 1_700_000_000)
                .unwrap_or(false);
            if plausible {
                created_at = parse_timestamp(candidate);
                break;
            }
        }
    }

    let custom_instructions = items
        .get(FOCUS_PROMPT_INDEX)
        .and_then(Value::as_array)
        .and_then(|o| o.get(1))
        .and_then(Value::as_array)
        .and_then(|inner| inner.first())
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let artifact_type = if is_quiz {
        "quiz".to_string()
    } else {
        match type_code {
            STUDIO_TYPE_AUDIO => "audio",
            STUDIO_TYPE_VIDEO => "video",
            STUDIO_TYPE_REPORT => "report",
            STUDIO_TYPE_FLASHCARDS => "flashcards",
            STUDIO_TYPE_INFOGRAPHIC => "infographic",
            STUDIO_TYPE_SLIDE_DECK => "slide_deck",
            STUDIO_TYPE_DATA_TABLE => "data_table",
            _ => "unknown",
        }
        .to_string()
    };

    Some(Artifact {
        id,
        title,
        type_code,
        artifact_type,
        status,
        created_at,
        custom_instructions,
        audio_url,
        video_url,
        infographic_url,
        slide_deck_url,
        report_content,
        flashcard_count,
        duration_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_artifact_type_parse_and_name() {
        for t in ArtifactType::ALL {
            assert_eq!(ArtifactType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ArtifactType::parse("bogus"), None);
    }

    #[test]
    fn test_streaming_and_interactive_split() {
        assert!(ArtifactType::Audio.is_streaming());
        assert!(ArtifactType::SlideDeck.is_streaming());
        assert!(!ArtifactType::Report.is_streaming());
        assert!(ArtifactType::Quiz.is_interactive());
        assert!(!ArtifactType::Audio.is_interactive());
    }

    #[test]
    fn test_parse_audio_entry() {
        let entry = json!([
            "art-1",
            "Deep Dive",
            STUDIO_TYPE_AUDIO,
            null,
            STATUS_COMPLETED,
            null,
            [null, null, null, "https://cdn.example/audio.m4a", null, null, null, null, null, [432, 0]]
        ]);
        let artifact = parse_artifact_entry(&entry).unwrap();
        assert_eq!(artifact.id, "art-1");
        assert_eq!(artifact.artifact_type, "audio");
        assert_eq!(artifact.status, ArtifactStatus::Completed);
        assert_eq!(
            artifact.audio_url.as_deref(),
            Some("https://cdn.example/audio.m4a")
        );
        assert_eq!(artifact.duration_seconds, Some(432));
    }

    #[test]
    fn test_parse_quiz_variant_of_shared_type_code() {
        let entry = json!([
            "art-2",
            "Quiz",
            STUDIO_TYPE_FLASHCARDS,
            null,
            STATUS_IN_PROGRESS,
            null,
            null,
            null,
            null,
            [null, [2, null, null]]
        ]);
        let artifact = parse_artifact_entry(&entry).unwrap();
        assert_eq!(artifact.artifact_type, "quiz");
        assert_eq!(artifact.status, ArtifactStatus::InProgress);
    }

    #[test]
    fn test_parse_entry_too_short_is_none() {
        assert!(parse_artifact_entry(&json!(["id", "title"])).is_none());
        assert!(parse_artifact_entry(&json!("not an array")).is_none());
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp(&json!([1766372302, 394000000])).unwrap();
        assert_eq!(ts.timestamp(), 1766372302);
        assert!(parse_timestamp(&json!("nope")).is_none());
    }
}
