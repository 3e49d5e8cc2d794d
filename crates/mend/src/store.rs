//! The live, file-backed record store.
//!
//! A [`Store`] is the ordered sequence of lines of a JSONL file. Each
//! line is either a parsed [`IssueRecord`] or an opaque raw line kept
//! for exact passthrough. Edits mutate record content in place; lines
//! are never reordered or dropped, so persisting reproduces the file
//! with only the deliberately rewritten records changed.

use crate::domain::{IssueId, IssueRecord};
use crate::error::{Error, Result};
use mend_jsonl::{read_preserving, write_lines_atomic, LineSlot, Warning as JsonlWarning};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Non-fatal problems observed while loading a store.
///
/// These are accumulated and reported at the end of a session; none of
/// them aborts a load or blocks repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A non-blank line did not parse as a record. The line is retained
    /// verbatim and will round-trip unchanged.
    MalformedLine {
        /// 1-based line number.
        line_number: usize,
        /// Parse error description.
        error: String,
    },

    /// Two records share an id. Id-addressed edits resolve to the first
    /// occurrence; later occurrences are reported, not corrected.
    DuplicateId {
        /// 1-based line number of the later occurrence.
        line_number: usize,
        /// The duplicated id.
        id: IssueId,
    },
}

impl LoadWarning {
    /// Returns a human-readable description of the warning.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::MalformedLine { line_number, error } => {
                format!("line {line_number}: malformed record: {error}")
            }
            Self::DuplicateId { line_number, id } => {
                format!("line {line_number}: duplicate id {id}")
            }
        }
    }
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// One line of the store file.
#[derive(Debug, Clone)]
enum Line {
    /// A parsed record with its original text and an edit marker.
    Record(RecordSlot),
    /// An unparsed line, emitted verbatim on persist.
    Raw(String),
}

#[derive(Debug, Clone)]
struct RecordSlot {
    record: IssueRecord,
    raw: String,
    dirty: bool,
}

/// An addressable, order-preserving view of one JSONL store file.
///
/// Constructed fresh from the file at the start of a repair session,
/// mutated through [`Store::remove_edges_to`], and written back once at
/// the end. There is no delete operation; the line count is invariant
/// across a session.
#[derive(Debug)]
pub struct Store {
    lines: Vec<Line>,
    /// Line index of the first record carrying each id.
    index: HashMap<IssueId, usize>,
    record_count: usize,
    /// Whether the source file's final line was newline-terminated.
    trailing_newline: bool,
}

impl Store {
    /// Loads a store from a JSONL file.
    ///
    /// Every line is handled independently: a malformed line is kept as
    /// raw passthrough and counted as a [`LoadWarning::MalformedLine`].
    /// Duplicate ids are reported as warnings; the first occurrence
    /// wins for id lookups.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Jsonl`] (wrapping an IO error) if the file does
    /// not exist or cannot be read.
    pub async fn load(path: &Path) -> Result<(Self, Vec<LoadWarning>)> {
        let file = read_preserving::<IssueRecord, _>(path).await?;

        let mut warnings: Vec<LoadWarning> = file
            .warnings
            .into_iter()
            .map(|w| match w {
                JsonlWarning::MalformedLine { line_number, error } => {
                    LoadWarning::MalformedLine { line_number, error }
                }
            })
            .collect();

        let mut lines = Vec::with_capacity(file.slots.len());
        let mut index = HashMap::new();
        let mut record_count = 0;

        for (i, slot) in file.slots.into_iter().enumerate() {
            match slot {
                LineSlot::Parsed { value, raw } => {
                    record_count += 1;
                    if index.contains_key(&value.id) {
                        warnings.push(LoadWarning::DuplicateId {
                            line_number: i + 1,
                            id: value.id.clone(),
                        });
                    } else {
                        index.insert(value.id.clone(), lines.len());
                    }
                    lines.push(Line::Record(RecordSlot {
                        record: value,
                        raw,
                        dirty: false,
                    }));
                }
                LineSlot::Raw(raw) => lines.push(Line::Raw(raw)),
            }
        }

        tracing::debug!(
            records = record_count,
            lines = lines.len(),
            warnings = warnings.len(),
            "store loaded"
        );

        Ok((
            Self {
                lines,
                index,
                record_count,
                trailing_newline: file.trailing_newline,
            },
            warnings,
        ))
    }

    /// Number of successfully parsed records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Total number of lines, parsed or not.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Looks up a record by id (first occurrence).
    #[must_use]
    pub fn get(&self, id: &IssueId) -> Option<&IssueRecord> {
        let idx = *self.index.get(id)?;
        match &self.lines[idx] {
            Line::Record(slot) => Some(&slot.record),
            Line::Raw(_) => None,
        }
    }

    /// Returns `true` if a record with this id exists.
    #[must_use]
    pub fn contains(&self, id: &IssueId) -> bool {
        self.index.contains_key(id)
    }

    /// Iterates over parsed records in line order.
    pub fn records(&self) -> impl Iterator<Item = &IssueRecord> {
        self.lines.iter().filter_map(|line| match line {
            Line::Record(slot) => Some(&slot.record),
            Line::Raw(_) => None,
        })
    }

    /// Removes every dependency edge of `issue_id` whose target is
    /// `target_id`, returning the number removed.
    ///
    /// Idempotent: a second call with the same arguments removes
    /// nothing and returns 0. A missing `issue_id` is not an error;
    /// repair runs must be re-runnable against a store a prior run
    /// already fixed.
    pub fn remove_edges_to(&mut self, issue_id: &IssueId, target_id: &IssueId) -> usize {
        let Some(&idx) = self.index.get(issue_id) else {
            tracing::debug!(issue = %issue_id, "issue not in store, nothing to remove");
            return 0;
        };
        let Line::Record(slot) = &mut self.lines[idx] else {
            return 0;
        };

        let before = slot.record.dependencies.len();
        slot.record
            .dependencies
            .retain(|edge| edge.target_id != *target_id);
        let removed = before - slot.record.dependencies.len();

        if removed > 0 {
            slot.dirty = true;
            tracing::debug!(issue = %issue_id, target = %target_id, removed, "edges removed");
        }
        removed
    }

    /// Scans for edges whose target id is not present in the store.
    ///
    /// Purely informational: dangling edges are tolerated everywhere
    /// else. Returned as `(source, target)` pairs in store order.
    #[must_use]
    pub fn dangling_edges(&self) -> Vec<(IssueId, IssueId)> {
        self.records()
            .flat_map(|record| {
                record
                    .dependencies
                    .iter()
                    .filter(|edge| !self.index.contains_key(&edge.target_id))
                    .map(|edge| (record.id.clone(), edge.target_id.clone()))
            })
            .collect()
    }

    /// Writes the store back, atomically replacing `path`.
    ///
    /// Untouched lines (raw lines and records no repair rewrote) are
    /// emitted byte-for-byte; modified records are re-serialized in the
    /// canonical structured-edge form. Line order is the load order,
    /// and a source file that ended without a newline stays that way.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyStore`] if zero records were parsed at
    /// load time: a store that failed to parse entirely must never
    /// overwrite its file. IO and serialization failures propagate; on
    /// failure the target file is left unchanged.
    pub async fn persist(&self, path: &Path) -> Result<()> {
        if self.record_count == 0 {
            return Err(Error::EmptyStore {
                path: path.to_path_buf(),
            });
        }

        let mut rendered = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            match line {
                Line::Raw(raw) => rendered.push(raw.clone()),
                Line::Record(slot) => {
                    if slot.dirty {
                        rendered.push(serde_json::to_string(&slot.record)?);
                    } else {
                        rendered.push(slot.raw.clone());
                    }
                }
            }
        }

        write_lines_atomic(path, &rendered, self.trailing_newline).await?;
        tracing::debug!(path = %path.display(), lines = rendered.len(), "store persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_store(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("failed to write temp file");
        file.flush().expect("failed to flush temp file");
        file
    }

    #[tokio::test]
    async fn load_counts_records_and_raw_lines() {
        let file = temp_store("{\"id\":\"bd-1\"}\nnot json\n{\"id\":\"bd-2\"}\n");

        let (store, warnings) = Store::load(file.path()).await.unwrap();

        assert_eq!(store.record_count(), 2);
        assert_eq!(store.line_count(), 3);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            warnings[0],
            LoadWarning::MalformedLine { line_number: 2, .. }
        ));
    }

    #[tokio::test]
    async fn duplicate_id_is_reported_not_corrected() {
        let file = temp_store(
            "{\"id\":\"bd-1\",\"title\":\"first\"}\n{\"id\":\"bd-1\",\"title\":\"second\"}\n",
        );

        let (store, warnings) = Store::load(file.path()).await.unwrap();

        assert_eq!(store.record_count(), 2);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            LoadWarning::DuplicateId { line_number: 2, id } if id.as_str() == "bd-1"
        ));
        // First occurrence wins for lookups.
        assert_eq!(store.get(&IssueId::new("bd-1")).unwrap().title_or_empty(), "first");
    }

    #[tokio::test]
    async fn remove_edges_is_idempotent() {
        let file = temp_store(
            "{\"id\":\"bd-1\",\"dependencies\":[{\"depends_on_id\":\"bd-9\",\"dep_type\":\"parent-child\"},\"bd-9\",{\"depends_on_id\":\"bd-7\"}]}\n",
        );
        let (mut store, _) = Store::load(file.path()).await.unwrap();

        // Both encodings of the bd-9 edge are removed in one call.
        assert_eq!(
            store.remove_edges_to(&IssueId::new("bd-1"), &IssueId::new("bd-9")),
            2
        );
        assert_eq!(
            store.remove_edges_to(&IssueId::new("bd-1"), &IssueId::new("bd-9")),
            0
        );

        let record = store.get(&IssueId::new("bd-1")).unwrap();
        assert_eq!(record.dependencies.len(), 1);
        assert_eq!(record.dependencies[0].target_id, IssueId::new("bd-7"));
    }

    #[tokio::test]
    async fn remove_edges_on_missing_issue_returns_zero() {
        let file = temp_store("{\"id\":\"bd-1\"}\n");
        let (mut store, _) = Store::load(file.path()).await.unwrap();

        assert_eq!(
            store.remove_edges_to(&IssueId::new("bd-404"), &IssueId::new("bd-9")),
            0
        );
    }

    #[tokio::test]
    async fn dangling_edges_are_informational() {
        let file = temp_store(
            "{\"id\":\"bd-1\",\"dependencies\":[{\"depends_on_id\":\"bd-2\"},{\"depends_on_id\":\"bd-404\"}]}\n{\"id\":\"bd-2\"}\n",
        );
        let (store, _) = Store::load(file.path()).await.unwrap();

        let dangling = store.dangling_edges();
        assert_eq!(
            dangling,
            vec![(IssueId::new("bd-1"), IssueId::new("bd-404"))]
        );
    }

    #[tokio::test]
    async fn persist_refuses_store_with_no_records() {
        let file = temp_store("not json\nstill not json\n");
        let (store, warnings) = Store::load(file.path()).await.unwrap();
        assert_eq!(warnings.len(), 2);

        let result = store.persist(file.path()).await;
        assert!(matches!(result, Err(Error::EmptyStore { .. })));

        // Original file untouched.
        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(contents, "not json\nstill not json\n");
    }

    #[tokio::test]
    async fn persist_reemits_untouched_lines_verbatim() {
        let content = "{ \"id\": \"bd-1\",  \"weird\":  true }\ngarbage line\n{\"id\":\"bd-2\"}\n";
        let file = temp_store(content);
        let (store, _) = Store::load(file.path()).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.jsonl");
        store.persist(&out).await.unwrap();

        assert_eq!(std::fs::read_to_string(&out).unwrap(), content);
    }

    #[tokio::test]
    async fn persist_rewrites_only_modified_records() {
        let content = concat!(
            "{\"id\":\"bd-1\",  \"title\": \"keep my spacing\"}\n",
            "{\"id\":\"bd-2\",\"title\":\"T\",\"dependencies\":[\"bd-9\",{\"depends_on_id\":\"bd-3\",\"dep_type\":\"blocks\"}],\"status\":\"open\"}\n",
        );
        let file = temp_store(content);
        let (mut store, _) = Store::load(file.path()).await.unwrap();

        store.remove_edges_to(&IssueId::new("bd-2"), &IssueId::new("bd-9"));

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.jsonl");
        store.persist(&out).await.unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = written.lines().collect();

        // Untouched record keeps its exact bytes.
        assert_eq!(lines[0], "{\"id\":\"bd-1\",  \"title\": \"keep my spacing\"}");
        // Modified record is re-serialized in structured form, keeping
        // its unknown fields.
        assert!(lines[1].contains(r#"{"depends_on_id":"bd-3","dep_type":"blocks"}"#));
        assert!(!lines[1].contains("bd-9"));
        assert!(lines[1].contains(r#""status":"open""#));
    }
}
