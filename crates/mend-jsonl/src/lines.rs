//! Preserving line-by-line reading of JSONL files.
//!
//! Unlike a resilient reader that skips malformed input, the preserving
//! reader keeps every line: parsed records carry their original raw text
//! alongside the typed value, and unparseable lines are retained
//! verbatim so a later write reproduces them byte-for-byte in their
//! original position.

use crate::error::Result;
use crate::warning::Warning;
use serde::de::DeserializeOwned;
use std::path::Path;

/// One line of a JSONL file, tagged by whether it parsed.
///
/// The ordered sequence of slots is the file: writing every slot's text
/// back in order reproduces the input (modulo any slots the caller
/// deliberately rewrote).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSlot<T> {
    /// A line that parsed into a typed value. The original text is kept
    /// so an untouched record can be re-emitted without re-serializing.
    Parsed {
        /// The parsed value.
        value: T,
        /// The original line text, exactly as read (without the newline).
        raw: String,
    },

    /// A line that did not parse (malformed JSON, blank line, or a
    /// record shape the caller's type rejects). Emitted verbatim on
    /// write.
    Raw(String),
}

impl<T> LineSlot<T> {
    /// Returns the parsed value, if this slot holds one.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Parsed { value, .. } => Some(value),
            Self::Raw(_) => None,
        }
    }

    /// Returns the original line text.
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::Parsed { raw, .. } | Self::Raw(raw) => raw,
        }
    }

    /// Returns `true` if this slot holds a parsed value.
    #[must_use]
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed { .. })
    }
}

/// The result of a preserving read: the file's lines plus the detail
/// needed to reproduce its exact bytes on write.
#[derive(Debug)]
pub struct LineFile<T> {
    /// One slot per line, in file order.
    pub slots: Vec<LineSlot<T>>,
    /// Parse warnings, in line order.
    pub warnings: Vec<Warning>,
    /// Whether the final line ended with a newline. An empty file
    /// counts as terminated.
    pub trailing_newline: bool,
}

/// Reads a JSONL file, preserving every line.
///
/// Each line is parsed independently into `T`. A line that fails to
/// parse becomes [`LineSlot::Raw`] and produces a
/// [`Warning::MalformedLine`]; blank lines are retained as raw without a
/// warning. One bad line never aborts the rest of the file.
///
/// Only `\n` terminates a line; a `\r` before it stays part of the line
/// text, so CRLF files keep their carriage returns through a
/// passthrough write. Whether the final line was newline-terminated is
/// recorded on the returned [`LineFile`].
///
/// # Errors
///
/// Returns [`crate::Error::Io`] if the file cannot be opened or read
/// (a missing file is an error, not an empty store).
pub async fn read_preserving<T, P>(path: P) -> Result<LineFile<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let content = tokio::fs::read_to_string(path.as_ref()).await?;

    let mut slots = Vec::new();
    let mut warnings = Vec::new();

    for (i, chunk) in content.split_inclusive('\n').enumerate() {
        let line_number = i + 1;
        let line = chunk.strip_suffix('\n').unwrap_or(chunk).to_string();

        if line.trim().is_empty() {
            slots.push(LineSlot::Raw(line));
            continue;
        }

        match serde_json::from_str::<T>(&line) {
            Ok(value) => slots.push(LineSlot::Parsed { value, raw: line }),
            Err(err) => {
                tracing::debug!(line_number, %err, "retaining unparseable line");
                warnings.push(Warning::MalformedLine {
                    line_number,
                    error: err.to_string(),
                });
                slots.push(LineSlot::Raw(line));
            }
        }
    }

    let trailing_newline = content.is_empty() || content.ends_with('\n');

    Ok(LineFile {
        slots,
        warnings,
        trailing_newline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct SimpleRecord {
        id: u32,
        name: String,
    }

    fn temp_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("failed to write temp file");
        file.flush().expect("failed to flush temp file");
        file
    }

    #[tokio::test]
    async fn all_valid_lines_parse() {
        let file = temp_file("{\"id\":1,\"name\":\"a\"}\n{\"id\":2,\"name\":\"b\"}\n");

        let read = read_preserving::<SimpleRecord, _>(file.path()).await.unwrap();

        assert_eq!(read.slots.len(), 2);
        assert!(read.warnings.is_empty());
        assert!(read.trailing_newline);
        assert!(read.slots.iter().all(LineSlot::is_parsed));
        assert_eq!(read.slots[0].value().unwrap().id, 1);
    }

    #[tokio::test]
    async fn malformed_line_is_retained_with_warning() {
        let file = temp_file("{\"id\":1,\"name\":\"a\"}\nnot json at all\n{\"id\":3,\"name\":\"c\"}\n");

        let read = read_preserving::<SimpleRecord, _>(file.path()).await.unwrap();

        assert_eq!(read.slots.len(), 3);
        assert_eq!(read.slots[1], LineSlot::Raw("not json at all".to_string()));
        assert_eq!(read.warnings.len(), 1);
        assert_eq!(read.warnings[0].line_number(), 2);
    }

    #[tokio::test]
    async fn blank_line_is_retained_without_warning() {
        let file = temp_file("{\"id\":1,\"name\":\"a\"}\n\n{\"id\":2,\"name\":\"b\"}\n");

        let read = read_preserving::<SimpleRecord, _>(file.path()).await.unwrap();

        assert_eq!(read.slots.len(), 3);
        assert_eq!(read.slots[1], LineSlot::Raw(String::new()));
        assert!(read.warnings.is_empty());
    }

    #[tokio::test]
    async fn raw_preserves_original_text() {
        let file = temp_file("{\"id\": 1, \"name\": \"spaced\"}\n");

        let read = read_preserving::<SimpleRecord, _>(file.path()).await.unwrap();

        // Raw text keeps the original formatting, not a re-serialization.
        assert_eq!(read.slots[0].raw(), "{\"id\": 1, \"name\": \"spaced\"}");
    }

    #[tokio::test]
    async fn missing_final_newline_is_recorded() {
        let file = temp_file("{\"id\":1,\"name\":\"a\"}\n{\"id\":2,\"name\":\"b\"}");

        let read = read_preserving::<SimpleRecord, _>(file.path()).await.unwrap();

        assert_eq!(read.slots.len(), 2);
        assert!(read.slots[1].is_parsed());
        assert!(!read.trailing_newline);
    }

    #[tokio::test]
    async fn crlf_lines_keep_their_carriage_returns() {
        let file = temp_file("{\"id\":1,\"name\":\"a\"}\r\n{\"id\":2,\"name\":\"b\"}\r\n");

        let read = read_preserving::<SimpleRecord, _>(file.path()).await.unwrap();

        // The \r is trailing whitespace to the parser but part of the
        // raw text for passthrough.
        assert!(read.slots[0].is_parsed());
        assert_eq!(read.slots[0].raw(), "{\"id\":1,\"name\":\"a\"}\r");
        assert!(read.warnings.is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let result = read_preserving::<SimpleRecord, _>("/nonexistent/path.jsonl").await;

        assert!(matches!(result, Err(crate::Error::Io(_))));
    }

    #[tokio::test]
    async fn empty_file_yields_no_slots() {
        let file = temp_file("");

        let read = read_preserving::<SimpleRecord, _>(file.path()).await.unwrap();

        assert!(read.slots.is_empty());
        assert!(read.warnings.is_empty());
        assert!(read.trailing_newline);
    }
}
