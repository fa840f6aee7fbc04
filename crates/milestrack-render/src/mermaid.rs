//! MermaidJS gantt renderer
//!
//! Text-based timeline for Markdown, wikis and issue trackers.
//!
//! ## Example Output
//!
//! ```text
//! gantt
//!     title Milestone Dependencies
//!     dateFormat YYYY-MM-DD
//!
//!     CDR              :done, CDR, 2024-01-03, 2024-01-30
//!     Build            :active, Build, 2024-02-05, 2024-04-10
//! ```
//!
//! Rows without both dates are left out; Mermaid needs a start and an end.

use std::collections::HashSet;

use milestrack_core::{GanttChart, GanttRow, PercentComplete, RenderError, Renderer};

/// MermaidJS gantt renderer
#[derive(Clone, Debug)]
pub struct MermaidRenderer {
    pub title: String,
    /// Mark tasks `done` / `active` from their actual progress
    pub show_completion: bool,
}

impl Default for MermaidRenderer {
    fn default() -> Self {
        Self {
            title: "Milestone Dependencies".into(),
            show_completion: true,
        }
    }
}

impl MermaidRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Disable completion status
    pub fn no_completion(mut self) -> Self {
        self.show_completion = false;
        self
    }

    /// Mermaid is sensitive to colons and special chars in task names
    fn sanitize_name(name: &str) -> String {
        name.replace([':', ';'], "-")
            .replace('#', "")
            .replace('\n', " ")
            .replace('\r', "")
    }

    /// Mermaid IDs must be alphanumeric with underscores
    fn make_id(task_id: &str) -> String {
        task_id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .collect()
    }

    /// Projected progress is only a forecast, so it never marks a task
    fn modifier(&self, row: &GanttRow) -> Option<&'static str> {
        if !self.show_completion {
            return None;
        }
        match row.percent {
            PercentComplete::Actual(100) => Some("done"),
            PercentComplete::Actual(v) if v > 0 => Some("active"),
            PercentComplete::Actual(_) | PercentComplete::Projected(_) => None,
        }
    }
}

impl Renderer for MermaidRenderer {
    type Output = String;

    fn render(&self, chart: &GanttChart) -> Result<String, RenderError> {
        let mut output = String::new();
        output.push_str("gantt\n");
        output.push_str(&format!("    title {}\n", Self::sanitize_name(&self.title)));
        output.push_str("    dateFormat YYYY-MM-DD\n\n");

        if chart.is_empty() {
            output.push_str("    %% No dependencies\n");
            return Ok(output);
        }

        let mut seen = HashSet::new();
        for row in &chart.rows {
            let (Some(start), Some(end)) = (row.start, row.end) else {
                continue;
            };
            // legacy charts can repeat a task
            if !seen.insert(row.task_id.as_str()) {
                continue;
            }

            let mut parts: Vec<String> = Vec::new();
            if let Some(modifier) = self.modifier(row) {
                parts.push(modifier.to_string());
            }
            parts.push(Self::make_id(&row.task_id));
            parts.push(start.format("%Y-%m-%d").to_string());
            parts.push(end.format("%Y-%m-%d").to_string());

            output.push_str(&format!(
                "    {:<16} :{}\n",
                Self::sanitize_name(&row.label),
                parts.join(", ")
            ));
        }

        if seen.is_empty() {
            output.push_str("    %% No dated milestones\n");
        }
        Ok(output)
    }
}
