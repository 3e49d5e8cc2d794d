//! Historical snapshot and phase membership.
//!
//! Phase membership must be computed against a snapshot captured before
//! repair, because a repair session removes the very edges membership
//! is derived from; run against the live, already-fixed store the query
//! would always come back empty. [`Snapshot`] is therefore a distinct,
//! read-only type: there is no way to turn a [`crate::store::Store`]
//! into one, and no mutation API.

use crate::domain::{IssueId, IssueRecord};
use crate::error::Result;
use std::collections::BTreeSet;
use std::path::Path;

/// An immutable, point-in-time export of the issue graph.
///
/// On disk this is a single JSON array of issue-detail objects, as
/// produced by an external bulk export.
#[derive(Debug, Clone)]
pub struct Snapshot {
    issues: Vec<IssueRecord>,
}

impl Snapshot {
    /// Loads a snapshot from a JSON array file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be read and
    /// [`crate::Error::Json`] if it is not a valid array of records.
    /// Unlike the line store there is no per-record tolerance here: a
    /// snapshot is an export, not a hand-edited file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let issues: Vec<IssueRecord> = serde_json::from_str(&content)?;
        tracing::debug!(issues = issues.len(), path = %path.display(), "snapshot loaded");
        Ok(Self { issues })
    }

    /// Builds a snapshot from already-parsed records.
    #[must_use]
    pub fn from_records(issues: Vec<IssueRecord>) -> Self {
        Self { issues }
    }

    /// Number of issues in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns `true` if the snapshot holds no issues.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// The issues, in export order.
    #[must_use]
    pub fn issues(&self) -> &[IssueRecord] {
        &self.issues
    }

    /// Issues directly linked to `root`, excluding the root itself.
    ///
    /// This is a single-hop query matched on target id alone: the
    /// source data does not reliably distinguish phase-membership edges
    /// from other edge types, so any edge pointing at the root counts.
    /// An issue whose parent is a member is not itself a member unless
    /// it also links to the root directly.
    #[must_use]
    pub fn members_of(&self, root: &IssueId) -> BTreeSet<IssueId> {
        self.issues
            .iter()
            .filter(|issue| issue.id != *root)
            .filter(|issue| issue.dependencies.iter().any(|edge| edge.target_id == *root))
            .map(|issue| issue.id.clone())
            .collect()
    }
}

/// Derives the tracker label for a phase name: lower-cased, spaces
/// replaced with `-`, colons stripped. `"Phase 2"` becomes `"phase-2"`.
#[must_use]
pub fn phase_label(name: &str) -> String {
    name.to_lowercase().replace(' ', "-").replace(':', "")
}
