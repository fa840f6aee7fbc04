//! # milestrack-status
//!
//! Dependency status computation for milestone feeds.
//!
//! This crate provides:
//! - Ordering warnings (successor starts before its predecessor finishes)
//! - Counted dependencies and green / yellow / red margin buckets
//! - Percent-complete interpolation (actual vs. projected framing)
//! - Gantt row formatting
//! - Cross-project dependency graph traversal
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use milestrack_core::{Config, DependencyEdge, Milestone};
//! use milestrack_status::analyze;
//!
//! let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
//! let edges = vec![DependencyEdge::new(
//!     Milestone::new("Radar", "CDR").actual(d(2024, 1, 1), d(2024, 1, 10)),
//!     Milestone::new("Avionics", "Integration").actual_start(d(2024, 1, 5)),
//! )];
//!
//! let report = analyze(&edges, &Config::default(), d(2024, 1, 6));
//! assert_eq!(report.violations, 1);
//! assert_eq!(report.buckets.red.len(), 1);
//! ```

pub mod classify;
pub mod gantt;
pub mod graph;
pub mod margins;
pub mod progress;

pub use classify::{classify_margin, detect_ordering_violation, StatusClassifier};
pub use gantt::{format_dependencies, GanttFormatter};
pub use graph::DependencyGraph;
pub use margins::{format_margin, BucketView, DependencyLine, MarginBuckets, MarginSummary};
pub use progress::{days_elapsed, edge_percent_complete, percent_complete};

use chrono::NaiveDate;
use milestrack_core::{
    Config, CountedDependency, DateResolution, DependencyEdge, GanttChart, Loadable,
    ProjectStatus,
};
use serde::Serialize;
use tracing::info;

/// Earliest resolved start and latest resolved end over every milestone in
/// the feed, predecessors and successors alike.
///
/// `None` when either bound cannot be determined.
pub fn date_range(edges: &[DependencyEdge], policy: DateResolution) -> Option<(NaiveDate, NaiveDate)> {
    let milestones = edges
        .iter()
        .flat_map(|edge| [&edge.predecessor, &edge.successor]);

    let mut earliest: Option<NaiveDate> = None;
    let mut latest: Option<NaiveDate> = None;
    for milestone in milestones {
        if let Some(start) = milestone.resolved_start(policy) {
            earliest = Some(earliest.map_or(start, |e| e.min(start)));
        }
        if let Some(end) = milestone.resolved_end(policy) {
            latest = Some(latest.map_or(end, |l| l.max(end)));
        }
    }

    Some((earliest?, latest?))
}

/// Everything the dashboard shows for one snapshot of the feed
#[derive(Clone, Debug, Serialize)]
pub struct DependencyReport {
    pub edges: usize,
    /// Edges whose successor starts before the predecessor finishes
    pub violations: usize,
    pub counted: Vec<CountedDependency>,
    pub buckets: MarginBuckets,
    pub projects: Vec<ProjectStatus>,
    pub chart: GanttChart,
}

impl DependencyReport {
    pub fn summary(&self) -> MarginSummary {
        MarginSummary::from_buckets(Loadable::Ready(&self.buckets))
    }
}

/// Run the full pipeline over one snapshot
pub fn analyze(edges: &[DependencyEdge], config: &Config, today: NaiveDate) -> DependencyReport {
    let classifier = StatusClassifier::from_config(&config.status);
    let formatter = GanttFormatter::from_config(&config.gantt, classifier.resolution);

    let violations = classifier.ordering_violations(edges).len();
    let counted = classifier.count_all(edges);
    let buckets = MarginBuckets::partition(&counted, &classifier);
    let projects = classifier.project_statuses(&counted);
    let chart = formatter.format(edges, today);

    info!(
        edges = edges.len(),
        counted = counted.len(),
        violations,
        green = buckets.green.len(),
        yellow = buckets.yellow.len(),
        red = buckets.red.len(),
        "analyzed dependency feed"
    );

    DependencyReport {
        edges: edges.len(),
        violations,
        counted,
        buckets,
        projects,
        chart,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use milestrack_core::Milestone;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn date_range_spans_both_roles() {
        let edges = vec![
            DependencyEdge::new(
                Milestone::new("A", "a").projected(date(2024, 3, 1), date(2024, 4, 1)),
                Milestone::new("B", "b").projected(date(2024, 5, 1), date(2024, 9, 30)),
            ),
            DependencyEdge::new(
                Milestone::new("C", "c")
                    .projected(date(2024, 2, 1), date(2024, 2, 20))
                    .actual_start(date(2024, 1, 15)),
                Milestone::new("B", "b"),
            ),
        ];
        assert_eq!(
            date_range(&edges, DateResolution::default()),
            Some((date(2024, 1, 15), date(2024, 9, 30)))
        );
    }

    #[test]
    fn date_range_needs_both_bounds() {
        let edges = vec![DependencyEdge::new(
            Milestone::new("A", "a").projected_start(date(2024, 1, 1)),
            Milestone::new("B", "b").projected_end(date(1969, 12, 31)),
        )];
        assert_eq!(date_range(&edges, DateResolution::default()), None);
        assert_eq!(date_range(&[], DateResolution::default()), None);
    }

    #[test]
    fn analyze_empty_feed() {
        let report = analyze(&[], &Config::default(), date(2024, 1, 1));
        assert_eq!(report.edges, 0);
        assert!(report.chart.is_empty());
        assert!(report.summary().is_empty());
    }
}
