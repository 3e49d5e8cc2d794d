//! Structural anomaly detection over the live store.

use crate::domain::IssueId;
use crate::store::Store;

/// Finds structurally orphaned issues, in store order.
///
/// An issue is orphaned when it is not an epic and holds no
/// parent-child edge at all. Merely possessing such an edge, even a
/// dangling one, disqualifies it: target validity is a separate concern
/// (see [`Store::dangling_edges`]).
///
/// Read-only; safe to run at any point, including mid-repair.
#[must_use]
pub fn find_orphans(store: &Store) -> Vec<IssueId> {
    store
        .records()
        .filter(|record| !record.is_epic())
        .filter(|record| !record.has_parent_edge())
        .map(|record| record.id.clone())
        .collect()
}
