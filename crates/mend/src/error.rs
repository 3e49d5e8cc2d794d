//! Error types for mend operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for mend operations.
///
/// Only file-level failures are fatal; per-line parse problems and
/// dangling references are modeled as warnings on the load path, not
/// errors.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization or parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from the underlying line store.
    #[error("line store error: {0}")]
    Jsonl(#[from] mend_jsonl::Error),

    /// Repair plan could not be loaded or parsed.
    #[error("invalid repair plan: {0}")]
    Plan(String),

    /// Refused to persist a store with zero parsed records.
    ///
    /// A store that failed to parse entirely must never overwrite the
    /// file it was loaded from.
    #[error("refusing to persist {}: no records were parsed from it", path.display())]
    EmptyStore {
        /// The target path that would have been overwritten.
        path: PathBuf,
    },

    /// External tracker call failed (adapter boundary only).
    #[error("tracker call failed: {0}")]
    Tracker(String),
}

/// A specialized Result type for mend operations.
pub type Result<T> = std::result::Result<T, Error>;
