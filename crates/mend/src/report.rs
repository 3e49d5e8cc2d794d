//! End-of-session reporting.
//!
//! Every session prints a final summary (records loaded, warnings,
//! edges removed, orphans found) whether or not any individual warning
//! occurred. Warnings are accumulated during the session and surface
//! only in this summary; they never abort a run.

use crate::domain::IssueId;
use crate::store::LoadWarning;
use colored::Colorize;
use std::fmt::Write as _;

/// Semantic color theme (matching the rest of the toolchain):
///   green = clean / applied, yellow = warnings, red = failures,
///   cyan = ids and counts.
fn warn_text(text: &str, use_colors: bool) -> String {
    if use_colors {
        text.yellow().to_string()
    } else {
        text.to_string()
    }
}

fn ok_text(text: &str, use_colors: bool) -> String {
    if use_colors {
        text.green().to_string()
    } else {
        text.to_string()
    }
}

fn count_text(n: usize, use_colors: bool) -> String {
    let text = n.to_string();
    if use_colors {
        text.cyan().to_string()
    } else {
        text
    }
}

/// Aggregated session outcome.
///
/// Counts not relevant to the command that ran stay `None` and are
/// omitted from the rendering.
#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    /// Records successfully parsed from the input file.
    pub records_loaded: usize,
    /// Total lines in the store file; `None` for snapshot-backed
    /// commands, where there is no line count to report.
    pub lines_total: Option<usize>,
    /// Non-fatal load problems.
    pub warnings: Vec<LoadWarning>,
    /// Dangling edges observed, as `(source, target)` pairs.
    pub dangling: Vec<(IssueId, IssueId)>,
    /// Edges removed by the repair pass, if one ran.
    pub edges_removed: Option<usize>,
    /// Records modified by the repair pass, if one ran.
    pub records_modified: Option<usize>,
    /// Phase members resolved from the snapshot, if queried.
    pub members_resolved: Option<usize>,
    /// Orphans found, if the detector ran.
    pub orphans_found: Option<usize>,
}

impl SessionReport {
    /// Renders the report as a multi-line string.
    #[must_use]
    pub fn render(&self, use_colors: bool) -> String {
        let mut out = String::new();

        if let Some(lines) = self.lines_total {
            let _ = writeln!(
                out,
                "Records loaded: {} ({lines} lines)",
                count_text(self.records_loaded, use_colors)
            );
        } else {
            let _ = writeln!(
                out,
                "Records loaded: {}",
                count_text(self.records_loaded, use_colors)
            );
        }

        if self.warnings.is_empty() {
            let _ = writeln!(out, "{}", ok_text("No load warnings", use_colors));
        } else {
            let header = format!("{} load warning(s):", self.warnings.len());
            let _ = writeln!(out, "{}", warn_text(&header, use_colors));
            for warning in &self.warnings {
                let _ = writeln!(out, "  - {warning}");
            }
        }

        if !self.dangling.is_empty() {
            let header = format!("{} dangling edge(s):", self.dangling.len());
            let _ = writeln!(out, "{}", warn_text(&header, use_colors));
            for (source, target) in &self.dangling {
                let _ = writeln!(out, "  - {source} -> {target} (target not in store)");
            }
        }

        if let Some(removed) = self.edges_removed {
            let modified = self.records_modified.unwrap_or(0);
            let _ = writeln!(
                out,
                "Edges removed: {} (across {} record(s))",
                count_text(removed, use_colors),
                modified
            );
        }

        if let Some(members) = self.members_resolved {
            let _ = writeln!(
                out,
                "Members resolved: {}",
                count_text(members, use_colors)
            );
        }

        if let Some(orphans) = self.orphans_found {
            let _ = writeln!(out, "Orphans found: {}", count_text(orphans, use_colors));
        }

        out
    }
}
