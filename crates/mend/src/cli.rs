//! Command-line interface.
//!
//! Subcommands map one-to-one onto the engine's operations: `repair`
//! applies a plan's corrections to the live store, `orphans` and
//! `check` are read-only scans, `members` and `phases` query the
//! historical snapshot. All file paths are explicit flags; nothing is
//! read from the environment.

use crate::detect::find_orphans;
use crate::domain::IssueId;
use crate::plan::RepairPlan;
use crate::repair::apply_corrections;
use crate::report::SessionReport;
use crate::snapshot::{phase_label, Snapshot};
use crate::store::Store;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Default number of orphans listed, matching the scan this replaces.
const DEFAULT_ORPHAN_LIMIT: usize = 20;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "mend", version, about = "Repair and inspect a JSONL issue-graph mirror")]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply a repair plan's corrections to the live store
    Repair {
        /// Path to the JSONL store file
        #[arg(long)]
        store: PathBuf,

        /// Path to the YAML repair plan
        #[arg(long)]
        plan: PathBuf,

        /// Report what would change without writing the store
        #[arg(long)]
        dry_run: bool,
    },

    /// List issues with no parent-child edge (epics exempt)
    Orphans {
        /// Path to the JSONL store file
        #[arg(long)]
        store: PathBuf,

        /// Maximum number of orphans to list
        #[arg(long, default_value_t = DEFAULT_ORPHAN_LIMIT)]
        limit: usize,
    },

    /// List the direct members of one phase root in a snapshot
    Members {
        /// Path to the snapshot file (JSON array of issue details)
        #[arg(long)]
        snapshot: PathBuf,

        /// Phase root issue id
        #[arg(long)]
        root: String,
    },

    /// Print the tracker action plan derived from a snapshot and plan
    Phases {
        /// Path to the snapshot file (JSON array of issue details)
        #[arg(long)]
        snapshot: PathBuf,

        /// Path to the YAML repair plan
        #[arg(long)]
        plan: PathBuf,
    },

    /// Report load warnings and dangling edges in a store
    Check {
        /// Path to the JSONL store file
        #[arg(long)]
        store: PathBuf,
    },
}

impl Cli {
    /// Parse arguments from the process command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Execute the parsed command.
    ///
    /// # Errors
    ///
    /// Returns an error on file-level failures (missing store, invalid
    /// plan, refused persist); per-line warnings are reported, never
    /// fatal.
    pub async fn execute(self) -> Result<()> {
        let use_colors = !self.no_color;
        match self.command {
            Commands::Repair {
                store,
                plan,
                dry_run,
            } => repair(&store, &plan, dry_run, use_colors).await,
            Commands::Orphans { store, limit } => orphans(&store, limit, use_colors).await,
            Commands::Members { snapshot, root } => members(&snapshot, &root, use_colors).await,
            Commands::Phases { snapshot, plan } => phases(&snapshot, &plan).await,
            Commands::Check { store } => check(&store, use_colors).await,
        }
    }
}

async fn repair(
    store_path: &Path,
    plan_path: &Path,
    dry_run: bool,
    use_colors: bool,
) -> Result<()> {
    let plan = RepairPlan::load(plan_path).await?;
    let (mut store, warnings) = Store::load(store_path).await?;

    let summary = apply_corrections(&mut store, &plan.corrections);
    for outcome in &summary.outcomes {
        if outcome.removed > 0 {
            println!(
                "Fixed {}: removed {} edge(s) to {}",
                outcome.correction.issue_id, outcome.removed, outcome.correction.target_id
            );
        }
    }

    if dry_run {
        println!("Dry run: store not written");
    } else {
        store.persist(store_path).await?;
    }

    let report = SessionReport {
        records_loaded: store.record_count(),
        lines_total: Some(store.line_count()),
        warnings,
        dangling: store.dangling_edges(),
        edges_removed: Some(summary.edges_removed()),
        records_modified: Some(summary.records_modified()),
        ..SessionReport::default()
    };
    print!("{}", report.render(use_colors));
    Ok(())
}

async fn orphans(store_path: &Path, limit: usize, use_colors: bool) -> Result<()> {
    let (store, warnings) = Store::load(store_path).await?;

    let orphan_ids = find_orphans(&store);
    println!("Remaining orphan tasks: {}", orphan_ids.len());
    for id in orphan_ids.iter().take(limit) {
        // The id always resolves: it came from this store's records.
        if let Some(record) = store.get(id) {
            let labels = if record.labels.is_empty() {
                "<no-label>".to_string()
            } else {
                record.labels.join(",")
            };
            println!("- {}: {} [labels: {}]", id, record.title_or_empty(), labels);
        }
    }

    let report = SessionReport {
        records_loaded: store.record_count(),
        lines_total: Some(store.line_count()),
        warnings,
        orphans_found: Some(orphan_ids.len()),
        ..SessionReport::default()
    };
    print!("{}", report.render(use_colors));
    Ok(())
}

async fn members(snapshot_path: &Path, root: &str, use_colors: bool) -> Result<()> {
    let snapshot = Snapshot::load(snapshot_path).await?;
    let root_id = IssueId::new(root);

    let members = snapshot.members_of(&root_id);
    println!("{} direct member(s) of {root_id}:", members.len());
    for id in &members {
        println!("- {id}");
    }

    let report = SessionReport {
        records_loaded: snapshot.len(),
        members_resolved: Some(members.len()),
        ..SessionReport::default()
    };
    print!("{}", report.render(use_colors));
    Ok(())
}

async fn phases(snapshot_path: &Path, plan_path: &Path) -> Result<()> {
    let plan = RepairPlan::load(plan_path).await?;
    let snapshot = Snapshot::load(snapshot_path).await?;

    for (phase_name, root_id) in &plan.phases {
        let label = phase_label(phase_name);
        let members = snapshot.members_of(root_id);
        println!(
            "{phase_name} ({root_id}): label {} task(s) with '{label}'",
            members.len()
        );
        for id in &members {
            println!("  - {id}");
        }
    }

    for spec in &plan.missing {
        println!(
            "create if absent (guard: '{}'): {}",
            spec.search_fragment(),
            spec.title
        );
    }

    for fixup in &plan.overrides {
        if let Some(labels) = &fixup.labels {
            println!("relabel {}: {}", fixup.issue, labels.join(","));
        }
        if let Some(title) = &fixup.title {
            println!("retitle {}: {title}", fixup.issue);
        }
    }
    Ok(())
}

async fn check(store_path: &Path, use_colors: bool) -> Result<()> {
    let (store, warnings) = Store::load(store_path).await?;

    let report = SessionReport {
        records_loaded: store.record_count(),
        lines_total: Some(store.line_count()),
        warnings,
        dangling: store.dangling_edges(),
        ..SessionReport::default()
    };
    print!("{}", report.render(use_colors));
    Ok(())
}
