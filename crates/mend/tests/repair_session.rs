//! End-to-end repair session tests: load, correct, persist, re-run,
//! plus the membership and orphan scenarios the engine exists for.

use mend::detect::find_orphans;
use mend::domain::IssueId;
use mend::plan::RepairPlan;
use mend::repair::apply_corrections;
use mend::snapshot::{phase_label, Snapshot};
use mend::store::Store;
use std::collections::BTreeSet;
use std::io::Write;
use tempfile::NamedTempFile;

fn temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("failed to write temp file");
    file.flush().expect("failed to flush temp file");
    file
}

/// Store with X (parent-child to P), Y (blocks P, no parent), P (epic).
const SCENARIO_STORE: &str = concat!(
    "{\"id\":\"X\",\"issue_type\":\"task\",\"title\":\"Task X\",\"dependencies\":[{\"depends_on_id\":\"P\",\"dep_type\":\"parent-child\"}]}\n",
    "{\"id\":\"Y\",\"issue_type\":\"task\",\"title\":\"Task Y\",\"dependencies\":[{\"depends_on_id\":\"P\",\"dep_type\":\"blocks\"}]}\n",
    "{\"id\":\"P\",\"issue_type\":\"epic\",\"title\":\"Phase P\"}\n",
);

#[tokio::test]
async fn orphan_and_membership_scenario() {
    let store_file = temp_file(SCENARIO_STORE);
    let (store, warnings) = Store::load(store_file.path()).await.unwrap();
    assert!(warnings.is_empty());

    // Y has no parent-child edge; X does; P is an epic.
    assert_eq!(find_orphans(&store), vec![IssueId::new("Y")]);

    // Membership matches on target id alone: both X and Y link to P.
    let snapshot = Snapshot::from_records(store.records().cloned().collect());
    let members = snapshot.members_of(&IssueId::new("P"));
    assert_eq!(members, BTreeSet::from([IssueId::new("X"), IssueId::new("Y")]));
}

#[tokio::test]
async fn full_repair_pass_is_rerunnable() {
    // X holds edges to Z and W; the plan removes only the Z edge.
    let content = concat!(
        "{\"id\":\"X\",\"dependencies\":[{\"depends_on_id\":\"Z\",\"dep_type\":\"parent-child\"},{\"depends_on_id\":\"W\",\"dep_type\":\"blocks\"}]}\n",
        "{\"id\":\"Z\",\"issue_type\":\"epic\"}\n",
        "{\"id\":\"W\"}\n",
    );
    let store_file = temp_file(content);

    let plan: RepairPlan =
        serde_yaml::from_str("corrections:\n  - issue: X\n    remove: Z\n").unwrap();

    // First pass removes the edge and persists.
    let (mut store, _) = Store::load(store_file.path()).await.unwrap();
    let summary = apply_corrections(&mut store, &plan.corrections);
    assert_eq!(summary.edges_removed(), 1);
    store.persist(store_file.path()).await.unwrap();

    let after_first = std::fs::read_to_string(store_file.path()).unwrap();
    let record_line = after_first.lines().next().unwrap();
    assert!(record_line.contains("\"W\""));
    assert!(!record_line.contains("\"Z\","));

    // Second pass over the already-fixed store removes nothing and
    // produces identical output.
    let (mut store, _) = Store::load(store_file.path()).await.unwrap();
    let summary = apply_corrections(&mut store, &plan.corrections);
    assert_eq!(summary.edges_removed(), 0);
    store.persist(store_file.path()).await.unwrap();

    let after_second = std::fs::read_to_string(store_file.path()).unwrap();
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn membership_must_come_from_the_snapshot_not_the_repaired_store() {
    // The snapshot is captured before repair.
    let snapshot_file = temp_file(
        r#"[
            {"id":"P","issue_type":"epic","title":"Phase 2"},
            {"id":"A","title":"Task A","dependencies":[{"id":"P","type":"parent-child"}]},
            {"id":"B","title":"Task B","dependencies":[{"id":"P","type":"parent-child"}]}
        ]"#,
    );
    let snapshot = Snapshot::load(snapshot_file.path()).await.unwrap();

    // The live store gets its phase edges stripped.
    let store_file = temp_file(concat!(
        "{\"id\":\"P\",\"issue_type\":\"epic\"}\n",
        "{\"id\":\"A\",\"dependencies\":[{\"depends_on_id\":\"P\",\"dep_type\":\"parent-child\"}]}\n",
        "{\"id\":\"B\",\"dependencies\":[{\"depends_on_id\":\"P\",\"dep_type\":\"parent-child\"}]}\n",
    ));
    let (mut store, _) = Store::load(store_file.path()).await.unwrap();
    store.remove_edges_to(&IssueId::new("A"), &IssueId::new("P"));
    store.remove_edges_to(&IssueId::new("B"), &IssueId::new("P"));

    // The frozen snapshot still resolves the full membership.
    let members = snapshot.members_of(&IssueId::new("P"));
    assert_eq!(members, BTreeSet::from([IssueId::new("A"), IssueId::new("B")]));

    // A same-shaped query against the repaired store's records would be
    // empty, which is exactly why Snapshot is a separate input.
    let stripped = Snapshot::from_records(store.records().cloned().collect());
    assert!(stripped.members_of(&IssueId::new("P")).is_empty());
}

#[tokio::test]
async fn plan_driven_session_from_files() {
    let store_file = temp_file(concat!(
        "{\"id\":\"bd-7wy\",\"dependencies\":[{\"depends_on_id\":\"bd-6mv\",\"dep_type\":\"parent-child\"},{\"depends_on_id\":\"bd-34z\"}]}\n",
        "{\"id\":\"bd-vtl\",\"dependencies\":[\"bd-2xf\"]}\n",
        "{\"id\":\"bd-6mv\",\"issue_type\":\"epic\"}\n",
    ));
    let plan_file = temp_file(concat!(
        "phases:\n",
        "  \"Phase 2\": bd-6mv\n",
        "corrections:\n",
        "  - issue: bd-7wy\n",
        "    remove: bd-6mv\n",
        "  - issue: bd-vtl\n",
        "    remove: bd-2xf\n",
        "  - issue: bd-hdu\n",
        "    remove: bd-2xf\n",
    ));

    let plan = RepairPlan::load(plan_file.path()).await.unwrap();
    let (mut store, warnings) = Store::load(store_file.path()).await.unwrap();
    assert!(warnings.is_empty());

    let summary = apply_corrections(&mut store, &plan.corrections);

    // bd-hdu is not in this store; that correction is a no-op.
    assert_eq!(summary.edges_removed(), 2);
    assert_eq!(summary.records_modified(), 2);

    store.persist(store_file.path()).await.unwrap();
    let written = std::fs::read_to_string(store_file.path()).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert!(lines[0].contains("bd-34z"));
    assert!(!lines[0].contains("bd-6mv"));
    assert_eq!(lines[1], "{\"id\":\"bd-vtl\",\"dependencies\":[]}");
    // The epic line was never touched.
    assert_eq!(lines[2], "{\"id\":\"bd-6mv\",\"issue_type\":\"epic\"}");

    // The phase map still derives its label for the adapter.
    let (name, _) = plan.phases.iter().next().unwrap();
    assert_eq!(phase_label(name), "phase-2");
}
