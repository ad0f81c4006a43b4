//! Known RPC ids for the batchexecute endpoint
//!
//! These are opaque constants recovered from captured browser traffic.
//! They identify server-side methods; the counterpart may rotate them
//! between frontend releases.

// Notebook operations
pub const RPC_LIST_NOTEBOOKS: &str = "wXbhsf";
pub const RPC_GET_NOTEBOOK: &str = "rLM1Ne";
pub const RPC_CREATE_NOTEBOOK: &str = "CCqFvf";
pub const RPC_RENAME_NOTEBOOK: &str = "s0tc2d";
pub const RPC_DELETE_NOTEBOOK: &str = "WWINqb";
pub const RPC_GET_SUMMARY: &str = "VfAZjd";

// Source operations
/// Used for URL, text, and Drive sources
pub const RPC_ADD_SOURCE: &str = "izAoDd";
/// Register file for resumable upload
pub const RPC_ADD_SOURCE_FILE: &str = "o4cbdc";
/// Get source details (including full text)
pub const RPC_GET_SOURCE: &str = "hizoJc";
/// Check if a Drive source is stale
pub const RPC_CHECK_FRESHNESS: &str = "yR9Yof";
/// Sync a Drive source with latest content
pub const RPC_SYNC_DRIVE: &str = "FLmJqe";
/// Delete a source from a notebook
pub const RPC_DELETE_SOURCE: &str = "tGMBJ";
/// Get source guide (AI summary + keyword chips)
pub const RPC_GET_SOURCE_GUIDE: &str = "tr032e";

// Research operations (source discovery)
pub const RPC_START_FAST_RESEARCH: &str = "Ljjv0c";
pub const RPC_START_DEEP_RESEARCH: &str = "QA9ei";
pub const RPC_POLL_RESEARCH: &str = "e3bVqc";
pub const RPC_IMPORT_RESEARCH: &str = "LBwxtb";

// Studio content operations
/// Create any studio artifact (audio, video, report, ...)
pub const RPC_CREATE_STUDIO: &str = "R7cb6c";
/// Poll for studio artifact status
pub const RPC_POLL_STUDIO: &str = "gArtLc";
/// Delete a studio artifact
pub const RPC_DELETE_STUDIO: &str = "V5N4be";
/// Rename any studio artifact
pub const RPC_RENAME_ARTIFACT: &str = "rc3d8d";
/// Fetch quiz/flashcard HTML content
pub const RPC_GET_INTERACTIVE_HTML: &str = "v9rmvd";

// Mind map operations
pub const RPC_GENERATE_MIND_MAP: &str = "yyryJe";
pub const RPC_SAVE_MIND_MAP: &str = "CYK0Xb";
/// List mind maps; also used with a timestamp payload to finalize deletion
pub const RPC_LIST_MIND_MAPS: &str = "cFji9";
pub const RPC_DELETE_MIND_MAP: &str = "AH0mwd";

// Sharing operations
pub const RPC_SHARE_NOTEBOOK: &str = "QDyure";
pub const RPC_GET_SHARE_STATUS: &str = "JFMDGd";
