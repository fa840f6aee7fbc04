//! Chart data JSON
//!
//! The shape a generic timeline component consumes:
//!
//! ```json
//! {
//!   "columns": [["string", "Task ID"], ...],
//!   "rows": [["CDR", "CDR", "2024-01-03", "2024-01-30", null, 100, null], ...]
//! }
//! ```
//!
//! The duration cell is always null; the component derives it from the dates.

use milestrack_core::{GanttChart, GanttRow, PercentComplete, RenderError, Renderer};
use serde_json::{json, Value};

/// Chart data as JSON text
#[derive(Clone, Debug, Default)]
pub struct ChartDataRenderer {
    pub pretty: bool,
}

impl ChartDataRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

impl Renderer for ChartDataRenderer {
    type Output = String;

    fn render(&self, chart: &GanttChart) -> Result<String, RenderError> {
        let value = chart_value(chart);
        let text = if self.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        text.map_err(|e| RenderError::Format(format!("Failed to write chart JSON: {}", e)))
    }
}

/// The full `{columns, rows}` document
pub fn chart_value(chart: &GanttChart) -> Value {
    let columns: Vec<Value> = chart
        .columns
        .iter()
        .map(|column| json!([column.kind.as_str(), column.label]))
        .collect();
    let rows: Vec<Value> = chart.rows.iter().map(row_cells).collect();
    json!({ "columns": columns, "rows": rows })
}

/// The seven cells of one row
pub fn row_cells(row: &GanttRow) -> Value {
    let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string());
    json!([
        row.task_id,
        row.label,
        date(row.start),
        date(row.end),
        Value::Null,
        percent_cell(row.percent),
        row.dependency_list(),
    ])
}

/// A number for actual progress, `"Projected N"` for projected progress
pub fn percent_cell(percent: PercentComplete) -> Value {
    match percent {
        PercentComplete::Actual(value) => json!(value),
        PercentComplete::Projected(value) => json!(format!("Projected {}", value)),
    }
}
