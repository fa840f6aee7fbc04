//! Gantt data formatting
//!
//! Converts a flat list of dependency edges into per-task timeline rows.
//! Rows come out in encounter order; a task seen again as a successor gets
//! the new predecessor appended to its dependency list instead of a second
//! row.
//!
//! With `dedupe_predecessors` off, every edge also emits its own predecessor
//! row, duplicates included. That mode exists for chart backends that were
//! fed this shape before; the default emits exactly one row per task.

use std::collections::HashMap;

use chrono::NaiveDate;
use milestrack_core::{DateResolution, DependencyEdge, GanttChart, GanttConfig, GanttRow, Milestone};
use tracing::{debug, warn};

use crate::progress::percent_complete;

/// Edge list to chart rows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GanttFormatter {
    pub resolution: DateResolution,
    pub dedupe_predecessors: bool,
}

impl Default for GanttFormatter {
    fn default() -> Self {
        Self {
            resolution: DateResolution::default(),
            dedupe_predecessors: true,
        }
    }
}

impl GanttFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &GanttConfig, resolution: DateResolution) -> Self {
        Self {
            resolution,
            dedupe_predecessors: config.dedupe_predecessors,
        }
    }

    /// Emit one predecessor row per edge
    pub fn keep_duplicate_predecessors(mut self) -> Self {
        self.dedupe_predecessors = false;
        self
    }

    /// Build chart rows for `edges` as of `now`
    pub fn format(&self, edges: &[DependencyEdge], now: NaiveDate) -> GanttChart {
        let mut rows: Vec<GanttRow> = Vec::new();
        // first row carrying each task id
        let mut index: HashMap<String, usize> = HashMap::new();

        for edge in edges {
            let predecessor = &edge.predecessor;
            let successor = &edge.successor;

            if !self.dedupe_predecessors || !index.contains_key(&predecessor.name) {
                index.entry(predecessor.name.clone()).or_insert(rows.len());
                rows.push(self.row_for(predecessor, now));
            }

            // the task keeps its row, only the dependency on itself is dropped
            if predecessor.name == successor.name {
                warn!(task = %predecessor.name, "skipping self-dependency");
                continue;
            }

            match index.get(&successor.name) {
                Some(&row) => rows[row].add_dependency(&predecessor.name),
                None => {
                    let mut row = self.row_for(successor, now);
                    row.add_dependency(&predecessor.name);
                    index.insert(successor.name.clone(), rows.len());
                    rows.push(row);
                }
            }
        }

        debug!(edges = edges.len(), rows = rows.len(), "formatted gantt rows");
        GanttChart::new(rows)
    }

    fn row_for(&self, milestone: &Milestone, now: NaiveDate) -> GanttRow {
        let mut row = GanttRow::new(milestone.name.clone());
        row.start = milestone.resolved_start(self.resolution);
        row.end = milestone.resolved_end(self.resolution);
        row.percent = percent_complete(milestone, now, self.resolution);
        row
    }
}

/// Format with default settings
pub fn format_dependencies(edges: &[DependencyEdge], now: NaiveDate) -> GanttChart {
    GanttFormatter::new().format(edges, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use milestrack_core::PercentComplete;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn task(name: &str) -> Milestone {
        Milestone::new("P", name).projected(date(2024, 1, 1), date(2024, 2, 1))
    }

    fn ids(chart: &GanttChart) -> Vec<&str> {
        chart.rows.iter().map(|r| r.task_id.as_str()).collect()
    }

    #[test]
    fn empty_input_gives_empty_rows() {
        let chart = format_dependencies(&[], date(2024, 1, 1));
        assert!(chart.is_empty());
        assert_eq!(chart.columns.len(), 7);
    }

    #[test]
    fn repeated_successor_merges_dependencies() {
        let edges = vec![
            DependencyEdge::new(task("A"), task("B")),
            DependencyEdge::new(task("C"), task("B")),
        ];
        let chart = format_dependencies(&edges, date(2024, 1, 10));
        assert_eq!(ids(&chart), ["A", "B", "C"]);
        assert_eq!(chart.row("B").unwrap().dependency_list().as_deref(), Some("A, C"));
        assert_eq!(chart.row("A").unwrap().dependency_list(), None);
    }

    #[test]
    fn legacy_mode_duplicates_predecessor_rows() {
        let edges = vec![
            DependencyEdge::new(task("A"), task("B")),
            DependencyEdge::new(task("A"), task("C")),
        ];
        let chart = GanttFormatter::new()
            .keep_duplicate_predecessors()
            .format(&edges, date(2024, 1, 10));
        assert_eq!(ids(&chart), ["A", "B", "A", "C"]);

        let deduped = format_dependencies(&edges, date(2024, 1, 10));
        assert_eq!(ids(&deduped), ["A", "B", "C"]);
    }

    #[test]
    fn successor_seen_earlier_as_predecessor_reuses_row() {
        let edges = vec![
            DependencyEdge::new(task("B"), task("C")),
            DependencyEdge::new(task("A"), task("B")),
        ];
        for formatter in [GanttFormatter::new(), GanttFormatter::new().keep_duplicate_predecessors()] {
            let chart = formatter.format(&edges, date(2024, 1, 10));
            assert_eq!(ids(&chart), ["B", "C", "A"]);
            assert_eq!(chart.row("B").unwrap().dependency_list().as_deref(), Some("A"));
        }
    }

    #[test]
    fn rows_carry_resolved_dates_and_progress() {
        let pred = Milestone::new("Radar", "CDR")
            .projected(date(2024, 1, 1), date(2024, 1, 20))
            .actual(date(2024, 1, 1), date(2024, 1, 11));
        let succ = Milestone::new("Avionics", "Integration").projected(date(2024, 2, 1), date(2024, 3, 1));
        let chart = format_dependencies(&[DependencyEdge::new(pred, succ)], date(2024, 1, 6));

        let cdr = chart.row("CDR").unwrap();
        assert_eq!(cdr.start, Some(date(2024, 1, 1)));
        assert_eq!(cdr.end, Some(date(2024, 1, 11)));
        assert_eq!(cdr.percent, PercentComplete::Actual(50));

        let integration = chart.row("Integration").unwrap();
        assert_eq!(integration.percent, PercentComplete::Projected(0));
        assert_eq!(integration.label, "Integration");
    }

    #[test]
    fn undated_tasks_have_no_bar() {
        let edges = vec![DependencyEdge::new(
            Milestone::new("A", "a").projected_start(date(1969, 12, 31)),
            Milestone::new("B", "b"),
        )];
        let chart = format_dependencies(&edges, date(2024, 1, 1));
        assert!(chart.rows.iter().all(|r| r.start.is_none() && r.end.is_none()));
        assert!(!chart.rows[0].has_bar());
    }

    #[test]
    fn self_dependency_keeps_row_without_dependency() {
        let edges = vec![DependencyEdge::new(task("A"), task("A"))];
        let chart = format_dependencies(&edges, date(2024, 1, 10));
        assert_eq!(ids(&chart), ["A"]);
        assert_eq!(chart.rows[0].dependency_list(), None);
        assert_eq!(chart.rows[0].start, Some(date(2024, 1, 1)));

        let edges = vec![
            DependencyEdge::new(task("A"), task("A")),
            DependencyEdge::new(task("A"), task("B")),
        ];
        let chart = format_dependencies(&edges, date(2024, 1, 10));
        assert_eq!(ids(&chart), ["A", "B"]);
        assert_eq!(chart.rows[0].dependency_list(), None);
        assert_eq!(chart.rows[1].dependency_list(), Some("A".to_string()));
    }
}
