//! nlm - NotebookLM command-line client library
//!
//! This library implements a client for NotebookLM's internal batchexecute
//! RPC protocol: the double-encoded request envelope, the anti-XSSI-prefixed
//! chunked responses, cookie/CSRF-token authentication with a self-healing
//! recovery ladder, resumable file uploads, and streaming artifact
//! downloads with positional payload parsers.
//!
//! # Architecture
//!
//! - `rpc`: wire format, retry policy, and the transport with auth recovery
//! - `auth`: session model, on-disk profiles, token scraping, login seam
//! - `upload`: three-step resumable file upload engine
//! - `download`: temp-file streaming download engine
//! - `artifacts`: positional payload parsers (media URLs, data tables,
//!   quiz/flashcard HTML, mind maps)
//! - `ops`: thin domain operations (notebooks, sources, studio, research,
//!   sharing, downloads)
//! - `cli`/`commands`: command-line surface
//! - `config`: YAML configuration
//! - `error`: error types and result alias
//!
//! The API is deliberately a client for *one* counterpart: the wire quirks
//! (double encoding, positional offsets, error-16 signature) are hardcoded
//! contracts recovered from captured traffic, not a general RPC framework.

pub mod artifacts;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod download;
pub mod error;
pub mod ops;
pub mod rpc;
pub mod upload;

// Re-export commonly used types
pub use auth::{Cookies, Profile, ProfileStore, Session};
pub use config::Config;
pub use error::{NlmError, Result};
pub use rpc::{NotebookClient, RetryPolicy};
