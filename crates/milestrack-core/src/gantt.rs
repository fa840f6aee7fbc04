//! Timeline chart data
//!
//! Row/column shapes handed to a timeline chart renderer: one row per task,
//! seven fixed cells per row, plus a column descriptor.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Completion of a single task
///
/// The two framings are drawn differently by chart backends, so they are
/// kept apart instead of being told apart by value type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PercentComplete {
    /// Progress measured against actual dates
    Actual(u8),
    /// Progress measured against a projected window
    Projected(u8),
}

impl PercentComplete {
    pub fn value(&self) -> u8 {
        match self {
            PercentComplete::Actual(v) | PercentComplete::Projected(v) => *v,
        }
    }

    pub fn is_projected(&self) -> bool {
        matches!(self, PercentComplete::Projected(_))
    }
}

impl Default for PercentComplete {
    fn default() -> Self {
        PercentComplete::Actual(0)
    }
}

impl fmt::Display for PercentComplete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PercentComplete::Actual(v) => write!(f, "{}", v),
            PercentComplete::Projected(v) => write!(f, "Projected {}", v),
        }
    }
}

/// Cell type of a chart column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Date,
    Number,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Date => "date",
            ColumnType::Number => "number",
        }
    }
}

/// One entry of the column descriptor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub kind: ColumnType,
    pub label: String,
}

impl Column {
    pub fn new(kind: ColumnType, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
        }
    }
}

/// One renderable timeline bar
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GanttRow {
    /// Task id (the task name, used as a natural key)
    pub task_id: String,
    /// Display name
    pub label: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub percent: PercentComplete,
    /// Predecessor task ids, first-seen order, no repeats
    pub dependencies: Vec<String>,
}

impl GanttRow {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            task_id: name.clone(),
            label: name,
            start: None,
            end: None,
            percent: PercentComplete::default(),
            dependencies: Vec::new(),
        }
    }

    /// Record a predecessor; repeats are ignored
    pub fn add_dependency(&mut self, task_id: &str) {
        if !self.dependencies.iter().any(|d| d == task_id) {
            self.dependencies.push(task_id.to_string());
        }
    }

    /// Dependency cell in the external chart format (`"A, C"`), or `None`
    pub fn dependency_list(&self) -> Option<String> {
        if self.dependencies.is_empty() {
            None
        } else {
            Some(self.dependencies.join(", "))
        }
    }

    /// True when the row has both ends and can be drawn as a bar
    pub fn has_bar(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }
}

/// Rows plus column descriptor, ready for a timeline renderer
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GanttChart {
    pub columns: Vec<Column>,
    pub rows: Vec<GanttRow>,
}

impl GanttChart {
    /// The fixed seven-column descriptor
    pub fn default_columns() -> Vec<Column> {
        vec![
            Column::new(ColumnType::String, "Task ID"),
            Column::new(ColumnType::String, "Task Name"),
            Column::new(ColumnType::Date, "Start Date"),
            Column::new(ColumnType::Date, "End Date"),
            Column::new(ColumnType::Number, "Duration"),
            Column::new(ColumnType::Number, "Percent Complete"),
            Column::new(ColumnType::String, "Dependencies"),
        ]
    }

    pub fn new(rows: Vec<GanttRow>) -> Self {
        Self {
            columns: Self::default_columns(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, task_id: &str) -> Option<&GanttRow> {
        self.rows.iter().find(|r| r.task_id == task_id)
    }

    /// Earliest start and latest end over rows that have them
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.rows.iter().filter_map(|r| r.start).min()?;
        let end = self.rows.iter().filter_map(|r| r.end).max()?;
        Some((start, end.max(start)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn percent_display_keeps_projected_prefix() {
        assert_eq!(PercentComplete::Actual(50).to_string(), "50");
        assert_eq!(PercentComplete::Projected(0).to_string(), "Projected 0");
        assert_eq!(PercentComplete::Projected(100).value(), 100);
        assert!(PercentComplete::Projected(3).is_projected());
        assert!(!PercentComplete::Actual(3).is_projected());
    }

    #[test]
    fn dependency_list_accumulates_without_repeats() {
        let mut row = GanttRow::new("B");
        assert_eq!(row.dependency_list(), None);
        row.add_dependency("A");
        row.add_dependency("C");
        row.add_dependency("A");
        assert_eq!(row.dependency_list().as_deref(), Some("A, C"));
    }

    #[test]
    fn default_columns_shape() {
        let kinds: Vec<&str> = GanttChart::default_columns()
            .iter()
            .map(|c| c.kind.as_str())
            .collect();
        assert_eq!(
            kinds,
            ["string", "string", "date", "date", "number", "number", "string"]
        );
    }

    #[test]
    fn chart_date_range_skips_undated_rows() {
        let mut a = GanttRow::new("a");
        a.start = Some(date(2024, 2, 1));
        a.end = Some(date(2024, 3, 1));
        let mut b = GanttRow::new("b");
        b.start = Some(date(2024, 1, 15));
        let c = GanttRow::new("c");
        let chart = GanttChart::new(vec![a, b, c]);
        assert_eq!(chart.date_range(), Some((date(2024, 1, 15), date(2024, 3, 1))));
        assert!(GanttChart::new(vec![]).date_range().is_none());
    }
}
