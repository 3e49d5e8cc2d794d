//! Idempotent dependency repair.
//!
//! A repair session applies a caller-supplied list of corrections, each
//! naming an issue and the erroneous edge target to strip from it. The
//! whole pass is safely re-runnable: corrections already applied by a
//! prior run remove nothing and report zero.

use crate::domain::IssueId;
use crate::store::Store;
use serde::{Deserialize, Serialize};

/// One erroneous edge to remove: every edge of `issue_id` pointing at
/// `target_id`, in either legacy encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    /// The issue to fix.
    #[serde(rename = "issue")]
    pub issue_id: IssueId,

    /// The edge target to remove.
    #[serde(rename = "remove")]
    pub target_id: IssueId,
}

/// The result of applying one correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionOutcome {
    /// The correction that was applied.
    pub correction: Correction,
    /// Number of edges removed (0 when already fixed or issue absent).
    pub removed: usize,
}

/// Per-correction outcomes for a repair pass.
#[derive(Debug, Clone, Default)]
pub struct RepairSummary {
    /// One outcome per correction, in input order.
    pub outcomes: Vec<CorrectionOutcome>,
}

impl RepairSummary {
    /// Total number of edges removed across all corrections.
    #[must_use]
    pub fn edges_removed(&self) -> usize {
        self.outcomes.iter().map(|o| o.removed).sum()
    }

    /// Number of corrections that actually modified a record.
    #[must_use]
    pub fn records_modified(&self) -> usize {
        self.outcomes.iter().filter(|o| o.removed > 0).count()
    }
}

/// Applies a correction list to the store, returning per-correction
/// outcomes.
///
/// Corrections never fail: a missing issue or an already-removed edge
/// simply counts as zero removals.
pub fn apply_corrections(store: &mut Store, corrections: &[Correction]) -> RepairSummary {
    let mut summary = RepairSummary::default();

    for correction in corrections {
        let removed = store.remove_edges_to(&correction.issue_id, &correction.target_id);
        if removed > 0 {
            tracing::info!(
                issue = %correction.issue_id,
                target = %correction.target_id,
                removed,
                "removed erroneous edges"
            );
        }
        summary.outcomes.push(CorrectionOutcome {
            correction: correction.clone(),
            removed,
        });
    }

    tracing::info!(
        corrections = corrections.len(),
        edges_removed = summary.edges_removed(),
        records_modified = summary.records_modified(),
        "repair pass complete"
    );
    summary
}
