//! Plain-text reports
//!
//! Terminal renditions of the margin summary, the per-project roll-up and
//! the ordering warnings.

use std::fmt::Write as _;

use milestrack_core::{DateResolution, DependencyEdge, ProjectStatus};
use milestrack_status::MarginSummary;

/// Three bucket counts with their detail lines.
///
/// A loading bucket shows `N/A`; a loaded but empty feed says so instead of
/// printing three zeros.
pub fn render_summary(summary: &MarginSummary) -> String {
    if summary.is_empty() {
        return "No dependencies\n".to_string();
    }

    let mut out = String::new();
    for view in summary.views() {
        let _ = writeln!(out, "{}: {}", view.bucket.title(), view.count_label());
        for line in &view.lines {
            let _ = writeln!(out, "  {}", line);
        }
    }
    out
}

/// One line per project, worst first
pub fn render_project_status(projects: &[ProjectStatus]) -> String {
    if projects.is_empty() {
        return "No projects\n".to_string();
    }

    let mut sorted: Vec<&ProjectStatus> = projects.iter().collect();
    sorted.sort_by(|a, b| b.status.cmp(&a.status).then_with(|| a.project.cmp(&b.project)));

    let width = sorted.iter().map(|p| p.project.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for project in sorted {
        let _ = write!(
            out,
            "{:<width$}  {:<13}  incoming {}",
            project.project,
            project.status.as_str(),
            project.incoming,
            width = width
        );
        if let Some(margin) = project.worst_margin {
            let _ = write!(out, ", worst margin {}", margin);
        }
        out.push('\n');
    }
    out
}

/// Ordering warnings, one per offending edge
pub fn render_violations(violations: &[&DependencyEdge], policy: DateResolution) -> String {
    let mut out = String::new();
    for edge in violations {
        let start = edge.successor.resolved_start(policy);
        let end = edge.predecessor.resolved_end(policy);
        let _ = write!(
            out,
            "warning: {} starts before {} finishes",
            edge.successor.key(),
            edge.predecessor.key()
        );
        if let (Some(start), Some(end)) = (start, end) {
            let _ = write!(out, " ({} < {})", start, end);
        }
        out.push('\n');
    }
    out
}
