//! Error types for mend-jsonl operations.

use std::io;
use thiserror::Error;

/// The error type for mend-jsonl operations.
///
/// Only file-level I/O can fail here: per-line parse problems surface
/// as [`crate::Warning`]s, and the write path takes already-rendered
/// line text.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading or writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// A specialized Result type for mend-jsonl operations.
pub type Result<T> = std::result::Result<T, Error>;
