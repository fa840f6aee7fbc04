//! Status classification
//!
//! Turns dependency edges into ordering warnings, counted dependencies and
//! per-project status.
//!
//! | Condition | Bucket | Status |
//! |-----------|--------|--------|
//! | impacted, or margin < 0 | red | really-behind |
//! | margin > threshold | green | on-track |
//! | otherwise | yellow | behind |

use std::collections::BTreeMap;

use milestrack_core::{
    CountedDependency, DateResolution, DependencyEdge, MarginBucket, ProjectStatus,
    ScheduleStatus, StatusConfig,
};
use tracing::{debug, warn};

/// True iff the successor's resolved start precedes the predecessor's
/// resolved end. Missing dates never raise a warning.
pub fn detect_ordering_violation(edge: &DependencyEdge) -> bool {
    StatusClassifier::new().ordering_violation(edge)
}

/// Bucket for a margin under the given threshold
pub fn classify_margin(margin: i64, impacted: bool, green_threshold_days: i64) -> MarginBucket {
    if impacted || margin < 0 {
        MarginBucket::Red
    } else if margin > green_threshold_days {
        MarginBucket::Green
    } else {
        MarginBucket::Yellow
    }
}

/// Classifier configured with a date policy and a green threshold
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusClassifier {
    pub resolution: DateResolution,
    pub green_threshold_days: i64,
}

impl Default for StatusClassifier {
    fn default() -> Self {
        Self::from_config(&StatusConfig::default())
    }
}

impl StatusClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &StatusConfig) -> Self {
        Self {
            resolution: config.resolution(),
            green_threshold_days: config.green_threshold_days,
        }
    }

    /// Set the green threshold
    pub fn green_threshold(mut self, days: i64) -> Self {
        self.green_threshold_days = days;
        self
    }

    pub fn ordering_violation(&self, edge: &DependencyEdge) -> bool {
        match (
            edge.successor.resolved_start(self.resolution),
            edge.predecessor.resolved_end(self.resolution),
        ) {
            (Some(successor_start), Some(predecessor_end)) => successor_start < predecessor_end,
            _ => false,
        }
    }

    /// Edges whose successor starts before the predecessor ends
    pub fn ordering_violations<'a>(&self, edges: &'a [DependencyEdge]) -> Vec<&'a DependencyEdge> {
        edges
            .iter()
            .filter(|edge| {
                let violated = self.ordering_violation(edge);
                if violated {
                    warn!(
                        predecessor = %edge.predecessor.name,
                        successor = %edge.successor.name,
                        "successor starts before predecessor finishes"
                    );
                }
                violated
            })
            .collect()
    }

    /// Reduce an edge to day counts; `None` when either resolved date is missing
    pub fn count(&self, edge: &DependencyEdge) -> Option<CountedDependency> {
        let predecessor_end = edge.predecessor.resolved_end(self.resolution)?;
        let successor_start = edge.successor.resolved_start(self.resolution)?;

        let date_difference = self
            .resolution
            .valid(edge.predecessor.projected_end)
            .map_or(0, |planned| (predecessor_end - planned).num_days());

        Some(CountedDependency {
            predecessor_project: edge.predecessor.project.clone(),
            predecessor_milestone: edge.predecessor.name.clone(),
            successor_project: edge.successor.project.clone(),
            successor_milestone: edge.successor.name.clone(),
            date_margin: (successor_start - predecessor_end).num_days(),
            date_difference,
            impacted: successor_start < predecessor_end,
        })
    }

    pub fn count_all(&self, edges: &[DependencyEdge]) -> Vec<CountedDependency> {
        edges
            .iter()
            .filter_map(|edge| {
                let counted = self.count(edge);
                if counted.is_none() {
                    debug!(
                        predecessor = %edge.predecessor.name,
                        successor = %edge.successor.name,
                        "edge lacks resolvable dates, not counted"
                    );
                }
                counted
            })
            .collect()
    }

    pub fn bucket(&self, dependency: &CountedDependency) -> MarginBucket {
        classify_margin(
            dependency.date_margin,
            dependency.impacted,
            self.green_threshold_days,
        )
    }

    /// Worst bucket among dependencies flowing into each project.
    ///
    /// Projects that only appear as predecessors are on track.
    pub fn project_statuses(&self, counted: &[CountedDependency]) -> Vec<ProjectStatus> {
        let mut projects: BTreeMap<&str, ProjectStatus> = BTreeMap::new();

        for dep in counted {
            projects
                .entry(dep.predecessor_project.as_str())
                .or_insert_with(|| on_track(&dep.predecessor_project));

            let entry = projects
                .entry(dep.successor_project.as_str())
                .or_insert_with(|| on_track(&dep.successor_project));
            entry.incoming += 1;
            entry.status = entry.status.max(ScheduleStatus::from(self.bucket(dep)));
            entry.worst_margin = Some(
                entry
                    .worst_margin
                    .map_or(dep.date_margin, |m| m.min(dep.date_margin)),
            );
        }

        projects.into_values().collect()
    }
}

fn on_track(project: &str) -> ProjectStatus {
    ProjectStatus {
        project: project.to_string(),
        status: ScheduleStatus::OnTrack,
        incoming: 0,
        worst_margin: None,
    }
}
