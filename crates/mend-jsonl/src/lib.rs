//! Order-preserving JSONL (JSON Lines) primitives.
//!
//! This library reads line-delimited JSON files without ever discarding
//! input: every line is either parsed into a typed value or retained
//! verbatim for exact passthrough, and writes are atomic
//! (temp-file-then-rename).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod lines;
pub mod warning;

pub use atomic::write_lines_atomic;
pub use error::{Error, Result};
pub use lines::{read_preserving, LineFile, LineSlot};
pub use warning::Warning;
