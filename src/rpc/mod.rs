//! Batchexecute RPC protocol support
//!
//! This module implements the counterpart's proprietary batched-RPC wire
//! format: the double-JSON-encoded request envelope, the anti-XSSI-prefixed
//! chunked response format, transient-error retry, and the transport that
//! ties them together with automatic authentication recovery.

pub mod envelope;
pub mod ids;
pub mod response;
pub mod retry;
pub mod transport;

pub use retry::RetryPolicy;
pub use transport::NotebookClient;
