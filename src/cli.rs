//! Command-line interface definition for nlm
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for authentication, notebooks, sources, studio
//! artifacts, downloads, research, and sharing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// nlm - NotebookLM command-line client
///
/// Manage notebooks, sources, and AI-generated study artifacts over the
/// application's internal RPC API.
#[derive(Parser, Debug, Clone)]
#[command(name = "nlm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "NLM_CONFIG")]
    pub config: Option<String>,

    /// Authentication profile to use
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for nlm
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Import credentials into a profile from a cookies file
    Login {
        /// Path to a cookies JSON file (browser-export records or a
        /// simple name/value map)
        #[arg(short, long)]
        file: PathBuf,

        /// Account email to record alongside the profile
        #[arg(long)]
        email: Option<String>,
    },

    /// Manage authentication profiles
    Profiles {
        #[command(subcommand)]
        command: ProfileCommand,
    },

    /// Manage notebooks
    Notebook {
        #[command(subcommand)]
        command: NotebookCommand,
    },

    /// Manage notebook sources
    Source {
        #[command(subcommand)]
        command: SourceCommand,
    },

    /// Create and manage studio artifacts
    Studio {
        #[command(subcommand)]
        command: StudioCommand,
    },

    /// Download a generated artifact
    Download {
        /// Notebook ID
        notebook: String,

        /// Artifact type (audio, video, report, mind_map, slide_deck,
        /// infographic, data_table, quiz, flashcards)
        artifact_type: String,

        /// Output file path (defaults to a name derived from the type)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Specific artifact ID (defaults to the most recent)
        #[arg(long)]
        id: Option<String>,

        /// Output format for quiz/flashcards (json, markdown, html)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Discover new sources via research
    Research {
        #[command(subcommand)]
        command: ResearchCommand,
    },

    /// Sharing and collaboration
    Share {
        #[command(subcommand)]
        command: ShareCommand,
    },
}

/// Profile management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCommand {
    /// List stored profiles
    List,
    /// Delete a profile permanently
    Delete {
        /// Profile name
        name: String,
    },
}

/// Notebook subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum NotebookCommand {
    /// List notebooks
    List,
    /// Create a notebook
    Create {
        /// Notebook title
        title: String,
    },
    /// Rename a notebook
    Rename {
        /// Notebook ID
        id: String,
        /// New title
        title: String,
    },
    /// Delete a notebook (irreversible)
    Delete {
        /// Notebook ID
        id: String,
    },
    /// Show the AI-generated notebook summary
    Summary {
        /// Notebook ID
        id: String,
    },
}

/// Source subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SourceCommand {
    /// List sources in a notebook
    List {
        /// Notebook ID
        notebook: String,
    },
    /// Add a URL (website or YouTube) as a source
    AddUrl {
        /// Notebook ID
        notebook: String,
        /// URL to add
        url: String,
        /// Wait until the source is processed
        #[arg(long)]
        wait: bool,
    },
    /// Add pasted text as a source
    AddText {
        /// Notebook ID
        notebook: String,
        /// Source title
        #[arg(long, default_value = "Pasted Text")]
        title: String,
        /// Text content (reads stdin when omitted)
        #[arg(long)]
        text: Option<String>,
    },
    /// Add a Google Drive document as a source
    AddDrive {
        /// Notebook ID
        notebook: String,
        /// Drive document ID
        document_id: String,
        /// Source title
        title: String,
        /// Drive MIME type
        #[arg(long, default_value = "application/vnd.google-apps.document")]
        mime_type: String,
    },
    /// Upload a local file as a source
    AddFile {
        /// Notebook ID
        notebook: String,
        /// Path to the file (pdf, txt, md, docx, csv, mp3, mp4, jpg, png)
        path: PathBuf,
        /// Wait until the source is processed
        #[arg(long)]
        wait: bool,
    },
    /// Delete a source (irreversible)
    Rm {
        /// Source ID
        id: String,
    },
    /// Re-sync a Drive source
    Sync {
        /// Source ID
        id: String,
    },
    /// Show the AI-generated source guide
    Guide {
        /// Source ID
        id: String,
    },
    /// Print the indexed full text of a source
    Text {
        /// Source ID
        id: String,
    },
}

/// Studio subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum StudioCommand {
    /// Create an audio overview (podcast)
    Audio {
        /// Notebook ID
        notebook: String,
        /// Focus prompt
        #[arg(long, default_value = "")]
        focus: String,
        /// Language code
        #[arg(long, default_value = "en")]
        language: String,
    },
    /// Create a video overview
    Video {
        /// Notebook ID
        notebook: String,
        /// Focus prompt
        #[arg(long, default_value = "")]
        focus: String,
        /// Language code
        #[arg(long, default_value = "en")]
        language: String,
    },
    /// Create a report
    Report {
        /// Notebook ID
        notebook: String,
        /// Format: briefing_doc, study_guide, blog_post, custom
        #[arg(long, default_value = "briefing_doc")]
        format: String,
        /// Prompt for custom reports
        #[arg(long, default_value = "")]
        prompt: String,
    },
    /// Create flashcards
    Flashcards {
        /// Notebook ID
        notebook: String,
        /// Difficulty (1-3)
        #[arg(long, default_value_t = 2)]
        difficulty: i64,
    },
    /// Create a quiz
    Quiz {
        /// Notebook ID
        notebook: String,
        /// Number of questions
        #[arg(long, default_value_t = 2)]
        questions: i64,
        /// Difficulty (1-3)
        #[arg(long, default_value_t = 2)]
        difficulty: i64,
    },
    /// Create an infographic
    Infographic {
        /// Notebook ID
        notebook: String,
    },
    /// Create a slide deck
    SlideDeck {
        /// Notebook ID
        notebook: String,
    },
    /// Create a data table
    DataTable {
        /// Notebook ID
        notebook: String,
        /// Description of the table to build
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Generate and save a mind map
    MindMap {
        /// Notebook ID
        notebook: String,
        /// Mind map title
        #[arg(long, default_value = "Mind Map")]
        title: String,
    },
    /// Show artifact status for a notebook
    Status {
        /// Notebook ID
        notebook: String,
    },
    /// Delete an artifact (irreversible)
    Rm {
        /// Artifact ID
        id: String,
        /// Notebook ID (required to delete mind maps)
        #[arg(long)]
        notebook: Option<String>,
    },
    /// Rename an artifact
    Rename {
        /// Artifact ID
        id: String,
        /// New title
        title: String,
    },
}

/// Research subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ResearchCommand {
    /// Start a research task
    Start {
        /// Notebook ID
        notebook: String,
        /// Research query
        query: String,
        /// Run deep (web-only) research instead of fast
        #[arg(long)]
        deep: bool,
    },
    /// Poll for discovered sources
    Poll {
        /// Notebook ID
        notebook: String,
    },
    /// Import discovered sources by URL
    Import {
        /// Notebook ID
        notebook: String,
        /// Source URLs to import
        urls: Vec<String>,
    },
}

/// Sharing subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ShareCommand {
    /// Show share status
    Status {
        /// Notebook ID
        notebook: String,
    },
    /// Enable or disable public link access
    Public {
        /// Notebook ID
        notebook: String,
        /// Disable instead of enable
        #[arg(long)]
        off: bool,
    },
    /// Invite a collaborator
    Invite {
        /// Notebook ID
        notebook: String,
        /// Collaborator email
        email: String,
        /// Role: editor or viewer
        #[arg(long, default_value = "viewer")]
        role: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
