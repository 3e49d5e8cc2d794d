//! The repair plan file.
//!
//! A repair session is driven by a YAML plan naming the phase roots,
//! the erroneous edges to strip, the issues that should exist but do
//! not, and per-issue fixups:
//!
//! ```yaml
//! phases:
//!   "Phase 0": bd-36e
//!   "Phase 2": bd-6mv
//! corrections:
//!   - issue: bd-7wy
//!     remove: bd-6mv
//! missing:
//!   - title: "Task 0.4: Build Scripts & CI Prep"
//!     issue_type: task
//!     phase: "Phase 0"
//!     labels: [phase-0]
//!     search: "Task 0.4"
//! overrides:
//!   - issue: bd-kll
//!     labels: [phase-2]
//! ```

use crate::domain::IssueId;
use crate::error::{Error, Result};
use crate::repair::Correction;
use crate::sync::{IssueOverride, NewTrackerIssue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A parsed repair plan. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepairPlan {
    /// Phase name to root issue id.
    #[serde(default)]
    pub phases: BTreeMap<String, IssueId>,

    /// Erroneous edges to remove from the live store.
    #[serde(default)]
    pub corrections: Vec<Correction>,

    /// Issues to create in the tracker if absent.
    #[serde(default)]
    pub missing: Vec<NewTrackerIssue>,

    /// Per-issue tracker fixups.
    #[serde(default)]
    pub overrides: Vec<IssueOverride>,
}

impl RepairPlan {
    /// Loads a plan from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::Plan`] if it is not valid YAML for this shape.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        serde_yaml::from_str(&content).map_err(|e| Error::Plan(e.to_string()))
    }

    /// Returns `true` if the plan contains nothing to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
            && self.corrections.is_empty()
            && self.missing.is_empty()
            && self.overrides.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IssueType;

    #[test]
    fn full_plan_parses() {
        let yaml = r#"
phases:
  "Phase 2": bd-6mv
  "Phase 3": bd-2xf
corrections:
  - issue: bd-7wy
    remove: bd-6mv
  - issue: bd-vtl
    remove: bd-2xf
missing:
  - title: "Task 0.4: Build Scripts & CI Prep"
    issue_type: task
    phase: "Phase 0"
    labels: [phase-0]
    search: "Task 0.4"
overrides:
  - issue: bd-kll
    labels: [phase-2]
  - issue: bd-3uw
    title: "Task 2.3: FlowEngine skeleton"
"#;
        let plan: RepairPlan = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(plan.phases.len(), 2);
        assert_eq!(plan.phases["Phase 2"], IssueId::new("bd-6mv"));
        assert_eq!(plan.corrections.len(), 2);
        assert_eq!(plan.missing[0].issue_type, IssueType::Task);
        assert_eq!(plan.missing[0].search_fragment(), "Task 0.4");
        assert_eq!(plan.overrides.len(), 2);
        assert!(!plan.is_empty());
    }

    #[test]
    fn sections_are_optional() {
        let plan: RepairPlan = serde_yaml::from_str("corrections:\n  - issue: a\n    remove: b\n").unwrap();

        assert!(plan.phases.is_empty());
        assert_eq!(plan.corrections.len(), 1);
        assert!(plan.missing.is_empty());
    }

    #[test]
    fn empty_document_is_an_empty_plan() {
        let plan: RepairPlan = serde_yaml::from_str("{}").unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn missing_issue_type_defaults_to_task() {
        let plan: RepairPlan =
            serde_yaml::from_str("missing:\n  - title: \"Some task\"\n").unwrap();
        assert_eq!(plan.missing[0].issue_type, IssueType::Task);
    }
}
