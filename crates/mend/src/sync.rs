//! The external tracker boundary.
//!
//! The core never talks to the remote tracker itself; it exposes
//! [`TrackerClient`], the exact operations a transport (CLI subprocess,
//! HTTP, whatever) must provide, and batch drivers that turn resolver
//! output into calls against it.
//!
//! Batches are continue-on-error: one item's failure is logged with its
//! id and recorded in the [`SyncReport`], and the rest of the batch
//! proceeds. Every call is idempotent on the tracker side, so re-running
//! a whole batch after a partial failure is always safe.

use crate::domain::{IssueId, IssueRecord, IssueType};
use crate::error::Result;
use crate::snapshot::{phase_label, Snapshot};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A new issue to create in the external tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrackerIssue {
    /// Issue title.
    pub title: String,

    /// Issue type; defaults to `task`.
    #[serde(default = "default_issue_type")]
    pub issue_type: IssueType,

    /// Phase the issue belongs under, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,

    /// Labels to set on creation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    /// Title fragment for the duplicate-creation guard; defaults to the
    /// full title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

fn default_issue_type() -> IssueType {
    IssueType::Task
}

impl NewTrackerIssue {
    /// The fragment used to search for an existing issue before
    /// creating this one.
    #[must_use]
    pub fn search_fragment(&self) -> &str {
        self.search.as_deref().unwrap_or(&self.title)
    }
}

/// A per-issue fixup applied directly against the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueOverride {
    /// The issue to fix up.
    pub issue: IssueId,

    /// Replacement labels (full overwrite), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,

    /// Replacement title, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Operations the external tracker must provide.
///
/// Label semantics are full overwrite, not merge; the drivers here rely
/// on that.
#[async_trait]
pub trait TrackerClient: Send + Sync {
    /// Replace the labels on an issue.
    async fn set_labels(&self, id: &IssueId, labels: &[String]) -> Result<()>;

    /// Replace the title of an issue.
    async fn set_title(&self, id: &IssueId, title: &str) -> Result<()>;

    /// Create a new issue.
    async fn create(&self, issue: &NewTrackerIssue) -> Result<()>;

    /// Search existing issues by title fragment.
    async fn search(&self, title_fragment: &str) -> Result<Vec<IssueId>>;

    /// Fetch full detail for one issue.
    async fn fetch(&self, id: &IssueId) -> Result<IssueRecord>;
}

/// One failed item in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    /// What the batch was trying to touch (issue id or title).
    pub item: String,
    /// The error, as reported by the transport.
    pub error: String,
}

/// Outcome of a continue-on-error batch.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Calls that succeeded.
    pub applied: usize,
    /// Items skipped by a guard (e.g. issue already exists).
    pub skipped: usize,
    /// Items whose tracker call failed.
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// Returns `true` if no item failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_failure(&mut self, item: impl Into<String>, error: &crate::error::Error) {
        let item = item.into();
        tracing::warn!(%item, %error, "tracker call failed, continuing batch");
        self.failures.push(SyncFailure {
            item,
            error: error.to_string(),
        });
    }
}

/// Labels every member of every phase with the phase's derived label.
///
/// Membership comes from the snapshot, never the live store: by the
/// time labels are assigned the repair pass has already stripped the
/// phase edges from the live file.
pub async fn assign_phase_labels(
    client: &dyn TrackerClient,
    snapshot: &Snapshot,
    phases: &BTreeMap<String, IssueId>,
) -> SyncReport {
    let mut report = SyncReport::default();

    for (phase_name, root_id) in phases {
        let label = phase_label(phase_name);
        let members = snapshot.members_of(root_id);
        tracing::info!(
            phase = %phase_name,
            %label,
            members = members.len(),
            "assigning phase label"
        );

        for member in members {
            match client
                .set_labels(&member, std::slice::from_ref(&label))
                .await
            {
                Ok(()) => report.applied += 1,
                Err(e) => report.record_failure(member.to_string(), &e),
            }
        }
    }

    report
}

/// Creates issues that should exist but do not, guarded by a title
/// search so a re-run never duplicates them.
pub async fn ensure_created(
    client: &dyn TrackerClient,
    missing: &[NewTrackerIssue],
) -> SyncReport {
    let mut report = SyncReport::default();

    for spec in missing {
        match client.search(spec.search_fragment()).await {
            Ok(hits) if !hits.is_empty() => {
                tracing::info!(title = %spec.title, "already exists, skipping create");
                report.skipped += 1;
            }
            Ok(_) => match client.create(spec).await {
                Ok(()) => {
                    tracing::info!(title = %spec.title, "created");
                    report.applied += 1;
                }
                Err(e) => report.record_failure(spec.title.clone(), &e),
            },
            // When the guard itself fails, do not create: a duplicate is
            // worse than a missed creation, and the batch is re-runnable.
            Err(e) => report.record_failure(spec.title.clone(), &e),
        }
    }

    report
}

/// Applies per-issue label and title fixups.
pub async fn apply_overrides(
    client: &dyn TrackerClient,
    overrides: &[IssueOverride],
) -> SyncReport {
    let mut report = SyncReport::default();

    for fixup in overrides {
        if let Some(labels) = &fixup.labels {
            match client.set_labels(&fixup.issue, labels).await {
                Ok(()) => report.applied += 1,
                Err(e) => report.record_failure(fixup.issue.to_string(), &e),
            }
        }
        if let Some(title) = &fixup.title {
            match client.set_title(&fixup.issue, title).await {
                Ok(()) => report.applied += 1,
                Err(e) => report.record_failure(fixup.issue.to_string(), &e),
            }
        }
    }

    report
}

#[cfg(any(test, feature = "test-util"))]
pub use mock::MockTracker;

#[cfg(any(test, feature = "test-util"))]
mod mock {
    //! A scriptable in-memory tracker for tests.

    use super::{NewTrackerIssue, TrackerClient};
    use crate::domain::{IssueId, IssueRecord};
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Records every call and can be told to fail specific issue ids or
    /// report specific titles as already existing.
    #[derive(Debug, Default)]
    pub struct MockTracker {
        /// Ids for which every call fails.
        pub fail_ids: HashSet<IssueId>,
        /// Titles `search` reports as existing.
        pub existing_titles: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl MockTracker {
        /// Creates a tracker that accepts everything.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// The call log, in order.
        #[must_use]
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("mock call log poisoned").clone()
        }

        fn log(&self, call: String) {
            self.calls.lock().expect("mock call log poisoned").push(call);
        }

        fn check(&self, id: &IssueId) -> Result<()> {
            if self.fail_ids.contains(id) {
                return Err(Error::Tracker(format!("injected failure for {id}")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TrackerClient for MockTracker {
        async fn set_labels(&self, id: &IssueId, labels: &[String]) -> Result<()> {
            self.check(id)?;
            self.log(format!("set_labels {id} {}", labels.join(",")));
            Ok(())
        }

        async fn set_title(&self, id: &IssueId, title: &str) -> Result<()> {
            self.check(id)?;
            self.log(format!("set_title {id} {title}"));
            Ok(())
        }

        async fn create(&self, issue: &NewTrackerIssue) -> Result<()> {
            self.log(format!("create {}", issue.title));
            Ok(())
        }

        async fn search(&self, title_fragment: &str) -> Result<Vec<IssueId>> {
            self.log(format!("search {title_fragment}"));
            let hits = self
                .existing_titles
                .iter()
                .filter(|t| t.contains(title_fragment))
                .map(|t| IssueId::new(t.clone()))
                .collect();
            Ok(hits)
        }

        async fn fetch(&self, id: &IssueId) -> Result<IssueRecord> {
            self.check(id)?;
            self.log(format!("fetch {id}"));
            Ok(IssueRecord {
                id: id.clone(),
                issue_type: None,
                title: None,
                labels: vec![],
                dependencies: vec![],
                extra: serde_json::Map::new(),
            })
        }
    }
}
