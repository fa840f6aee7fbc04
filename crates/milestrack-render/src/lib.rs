//! # milestrack-render
//!
//! Rendering backends and the today-line overlay for milestrack.
//!
//! This crate provides:
//! - SVG timeline rendering with a month axis and a built-in today line
//! - Chart data JSON for generic timeline components
//! - MermaidJS gantt output (for Markdown/docs)
//! - Plain-text summary and status reports
//! - The label-scanning today-line overlay for charts rendered elsewhere,
//!   plus a background controller that keeps it in sync with data changes
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use milestrack_core::{ChartRenderer, DependencyEdge, Milestone, Renderer};
//! use milestrack_render::TimelineSvgRenderer;
//! use milestrack_status::format_dependencies;
//!
//! let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
//! let edges = vec![DependencyEdge::new(
//!     Milestone::new("Radar", "CDR").projected(d(2024, 1, 3), d(2024, 1, 30)),
//!     Milestone::new("Avionics", "Integration").projected(d(2024, 2, 5), d(2024, 3, 20)),
//! )];
//! let chart = format_dependencies(&edges, d(2024, 2, 15));
//!
//! let renderer = TimelineSvgRenderer::new().with_today(d(2024, 2, 15));
//! let svg = renderer.render(&chart).unwrap();
//! assert!(svg.contains("today-line"));
//! assert!(renderer.date_to_x(&chart, d(2024, 2, 15)).is_some());
//! ```

pub mod chart;
pub mod controller;
pub mod data;
pub mod mermaid;
pub mod overlay;
pub mod text;

pub use chart::{ChartError, Element, Node, SvgChart, TextLabel};
pub use controller::{ChartHost, ChartSlot, TodayLineController};
pub use data::ChartDataRenderer;
pub use mermaid::MermaidRenderer;
pub use overlay::{
    draw_today_line, overlay_today_line, LineStyle, LocateError, OverlayOutcome, Placement,
    PlanError, TodayLinePlan,
};
pub use text::{render_project_status, render_summary, render_violations};

use chrono::{Datelike, NaiveDate};
use milestrack_core::{
    ChartRenderer, GanttChart, GanttRow, OverlayConfig, PercentComplete, RenderError, Renderer,
};
use svg::node::element::{Group, Line, Polyline, Rectangle, Text};
use svg::Document;

use crate::overlay::{first_of_month, next_month};

/// SVG timeline renderer configuration
#[derive(Clone, Debug)]
pub struct TimelineSvgRenderer {
    /// Width of the chart area (excluding labels) in pixels
    pub chart_width: u32,
    /// Height per task row in pixels
    pub row_height: u32,
    /// Width of the label column in pixels
    pub label_width: u32,
    /// Header height in pixels
    pub header_height: u32,
    /// Padding around the chart
    pub padding: u32,
    /// Bar color for tasks measured against actual dates
    pub actual_color: String,
    /// Bar color for tasks measured against a projected window
    pub projected_color: String,
    /// Progress fill color
    pub progress_color: String,
    /// Dependency connector color
    pub connector_color: String,
    /// Background color
    pub background_color: String,
    /// Grid line color
    pub grid_color: String,
    /// Text color
    pub text_color: String,
    /// Font family
    pub font_family: String,
    /// Font size in pixels
    pub font_size: u32,
    /// Draw a today line at this date
    pub today: Option<NaiveDate>,
    pub today_line: LineStyle,
}

impl Default for TimelineSvgRenderer {
    fn default() -> Self {
        Self {
            chart_width: 800,
            row_height: 28,
            label_width: 180,
            header_height: 50,
            padding: 20,
            actual_color: "#3498db".into(),
            projected_color: "#95a5a6".into(),
            progress_color: "#1f618d".into(),
            connector_color: "#7f8c8d".into(),
            background_color: "#ffffff".into(),
            grid_color: "#ecf0f1".into(),
            text_color: "#2c3e50".into(),
            font_family: "system-ui, -apple-system, sans-serif".into(),
            font_size: 12,
            today: None,
            today_line: LineStyle::default(),
        }
    }
}

/// Horizontal axis of one rendering: whole months covering the data range
#[derive(Clone, Copy, Debug, PartialEq)]
struct Axis {
    data_start: NaiveDate,
    data_end: NaiveDate,
    start: NaiveDate,
    end: NaiveDate,
    px_per_day: f64,
}

impl TimelineSvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure chart width
    pub fn chart_width(mut self, width: u32) -> Self {
        self.chart_width = width;
        self
    }

    /// Configure row height
    pub fn row_height(mut self, height: u32) -> Self {
        self.row_height = height;
        self
    }

    /// Draw a today line at `date` when it falls inside the data range
    pub fn with_today(mut self, date: NaiveDate) -> Self {
        self.today = Some(date);
        self
    }

    /// Take the line id and color from the overlay settings
    pub fn today_style(mut self, config: &OverlayConfig) -> Self {
        self.today_line = LineStyle::from(config);
        self
    }

    fn total_width(&self) -> u32 {
        self.padding * 2 + self.label_width + self.chart_width
    }

    fn total_height(&self, row_count: usize) -> u32 {
        self.padding * 2 + self.header_height + (row_count as u32 * self.row_height)
    }

    fn chart_left(&self) -> f64 {
        f64::from(self.padding + self.label_width)
    }

    fn axis(&self, chart: &GanttChart) -> Option<Axis> {
        let (data_start, data_end) = chart.date_range()?;
        let start = first_of_month(data_start);
        let end = next_month(first_of_month(data_end))?;
        let days = (end - start).num_days().max(1) as f64;
        Some(Axis {
            data_start,
            data_end,
            start,
            end,
            px_per_day: f64::from(self.chart_width) / days,
        })
    }

    fn x_for(&self, axis: &Axis, date: NaiveDate) -> f64 {
        let days = (date - axis.start).num_days() as f64;
        self.chart_left() + days * axis.px_per_day
    }

    fn months(axis: &Axis) -> Vec<NaiveDate> {
        let mut months = Vec::new();
        let mut month = axis.start;
        while month < axis.end {
            months.push(month);
            match next_month(month) {
                Some(next) => month = next,
                None => break,
            }
        }
        months
    }

    /// Month labels, one `<text>` per month, and year captions
    fn render_header(&self, axis: &Axis) -> (Group, Group) {
        let label_y = self.padding + self.header_height - 15;
        let mut labels = Group::new().set("class", "months");
        let mut years = Group::new().set("class", "years");

        for (index, month) in Self::months(axis).into_iter().enumerate() {
            let x = self.x_for(axis, month);
            labels = labels.add(
                Text::new(month.format("%b").to_string())
                    .set("x", x)
                    .set("y", label_y)
                    .set("dx", 4)
                    .set("font-family", self.font_family.as_str())
                    .set("font-size", self.font_size - 1)
                    .set("fill", self.text_color.as_str())
                    .set("data-month", month.format("%Y-%m").to_string()),
            );

            if index == 0 || month.month() == 1 {
                years = years.add(
                    Text::new(month.format("%Y").to_string())
                        .set("x", x)
                        .set("y", self.padding + 18)
                        .set("dx", 4)
                        .set("font-family", self.font_family.as_str())
                        .set("font-size", self.font_size + 1)
                        .set("font-weight", "bold")
                        .set("fill", self.text_color.as_str()),
                );
            }
        }

        (labels, years)
    }

    /// Month boundaries and row separators
    fn render_grid(&self, axis: &Axis, row_count: usize) -> Group {
        let mut group = Group::new().set("class", "grid");

        let chart_top = self.padding + self.header_height;
        let chart_bottom = chart_top + (row_count as u32 * self.row_height);

        for i in 0..=row_count {
            let y = chart_top + (i as u32 * self.row_height);
            group = group.add(
                Line::new()
                    .set("x1", self.padding)
                    .set("y1", y)
                    .set("x2", self.total_width() - self.padding)
                    .set("y2", y)
                    .set("stroke", self.grid_color.as_str())
                    .set("stroke-width", 1),
            );
        }

        for month in Self::months(axis).into_iter().chain([axis.end]) {
            let x = self.x_for(axis, month);
            group = group.add(
                Line::new()
                    .set("x1", x)
                    .set("y1", chart_top - 10)
                    .set("x2", x)
                    .set("y2", chart_bottom)
                    .set("stroke", self.grid_color.as_str())
                    .set("stroke-width", 1),
            );
        }

        group
    }

    fn bar_y(&self, row: usize) -> (f64, f64) {
        let y = self.padding + self.header_height + (row as u32 * self.row_height);
        let bar_height = (self.row_height as f64 * 0.6).round();
        let bar_y = y as f64 + (self.row_height as f64 - bar_height) / 2.0;
        (bar_y, bar_height)
    }

    /// Label plus, when both ends are known, bar and progress fill
    fn render_row(&self, axis: &Axis, row: &GanttRow, index: usize) -> Group {
        let mut group = Group::new()
            .set("class", "task")
            .set("data-task", row.task_id.as_str());

        let y = self.padding + self.header_height + (index as u32 * self.row_height);
        group = group.add(
            Text::new(truncate(&row.label, 24))
                .set("x", self.padding + 8)
                .set("y", y + self.row_height / 2 + 4)
                .set("font-family", self.font_family.as_str())
                .set("font-size", self.font_size)
                .set("fill", self.text_color.as_str()),
        );

        let (Some(start), Some(end)) = (row.start, row.end) else {
            return group;
        };

        let (bar_y, bar_height) = self.bar_y(index);
        let x_start = self.x_for(axis, start);
        let bar_width = (self.x_for(axis, end) - x_start).max(4.0);

        let (color, fill_opacity) = match row.percent {
            PercentComplete::Actual(_) => (self.actual_color.as_str(), 1.0),
            PercentComplete::Projected(_) => (self.projected_color.as_str(), 0.45),
        };

        group = group.add(
            Rectangle::new()
                .set("x", x_start)
                .set("y", bar_y)
                .set("width", bar_width)
                .set("height", bar_height)
                .set("rx", 3)
                .set("ry", 3)
                .set("fill", color)
                .set("data-percent", row.percent.to_string()),
        );

        let done = bar_width * f64::from(row.percent.value()) / 100.0;
        if done > 0.0 {
            group = group.add(
                Rectangle::new()
                    .set("class", "progress")
                    .set("x", x_start)
                    .set("y", bar_y)
                    .set("width", done)
                    .set("height", bar_height)
                    .set("rx", 3)
                    .set("ry", 3)
                    .set("fill", self.progress_color.as_str())
                    .set("fill-opacity", fill_opacity),
            );
        }

        group
    }

    /// Elbow connectors from each predecessor's bar end to the successor's
    /// bar start
    fn render_connectors(&self, axis: &Axis, rows: &[GanttRow]) -> Group {
        let mut group = Group::new().set("class", "dependencies");

        for (index, row) in rows.iter().enumerate() {
            let Some(start) = row.start.filter(|_| row.has_bar()) else {
                continue;
            };
            let (succ_y, succ_height) = self.bar_y(index);
            let x2 = self.x_for(axis, start);
            let y2 = succ_y + succ_height / 2.0;

            for dependency in &row.dependencies {
                let Some((pred_index, pred_end)) = rows
                    .iter()
                    .enumerate()
                    .find(|(_, r)| &r.task_id == dependency && r.has_bar())
                    .and_then(|(i, r)| Some((i, r.end?)))
                else {
                    continue;
                };
                let (pred_y, pred_height) = self.bar_y(pred_index);
                let x1 = self.x_for(axis, pred_end);
                let y1 = pred_y + pred_height / 2.0;
                let elbow = x1 + 6.0;

                group = group.add(
                    Polyline::new()
                        .set(
                            "points",
                            format!(
                                "{},{} {},{} {},{} {},{}",
                                x1, y1, elbow, y1, elbow, y2, x2, y2
                            ),
                        )
                        .set("fill", "none")
                        .set("stroke", self.connector_color.as_str())
                        .set("stroke-width", 1),
                );
            }
        }

        group
    }

    /// Render the legend
    fn render_legend(&self, y_offset: u32) -> Group {
        let mut group = Group::new().set("class", "legend");
        let x_start = self.padding as f64;
        let y = y_offset as f64 + 15.0;
        let box_size = 12.0;
        let spacing = 120.0;

        for (i, (color, label)) in [
            (self.actual_color.as_str(), "Actual"),
            (self.projected_color.as_str(), "Projected"),
        ]
        .into_iter()
        .enumerate()
        {
            let x = x_start + spacing * i as f64;
            group = group
                .add(
                    Rectangle::new()
                        .set("x", x)
                        .set("y", y - box_size + 2.0)
                        .set("width", box_size)
                        .set("height", box_size)
                        .set("rx", 2)
                        .set("fill", color),
                )
                .add(
                    Text::new(label)
                        .set("x", x + box_size + 5.0)
                        .set("y", y)
                        .set("font-family", self.font_family.as_str())
                        .set("font-size", self.font_size - 1)
                        .set("fill", self.text_color.as_str()),
                );
        }

        group
    }

    fn render_placeholder(&self, message: &str) -> Document {
        let width = self.total_width();
        let height = self.padding * 2 + self.header_height;
        Document::new()
            .set("width", width)
            .set("height", height)
            .set("viewBox", (0, 0, width, height))
            .set("xmlns", "http://www.w3.org/2000/svg")
            .add(
                Text::new(message)
                    .set("x", width / 2)
                    .set("y", height / 2)
                    .set("font-family", self.font_family.as_str())
                    .set("font-size", self.font_size + 2)
                    .set("fill", self.text_color.as_str())
                    .set("text-anchor", "middle"),
            )
    }
}

impl Renderer for TimelineSvgRenderer {
    type Output = String;

    fn render(&self, chart: &GanttChart) -> Result<String, RenderError> {
        let document = match self.axis(chart) {
            None if chart.is_empty() => self.render_placeholder("No dependencies"),
            None => self.render_placeholder("No dated milestones"),
            Some(axis) => {
                let row_count = chart.rows.len();
                let width = self.total_width();
                let height = self.total_height(row_count) + 30;

                let (months, years) = self.render_header(&axis);
                let mut document = Document::new()
                    .set("width", width)
                    .set("height", height)
                    .set("viewBox", (0, 0, width, height))
                    .set("xmlns", "http://www.w3.org/2000/svg")
                    .add(
                        Rectangle::new()
                            .set("width", "100%")
                            .set("height", "100%")
                            .set("fill", self.background_color.as_str()),
                    )
                    .add(self.render_grid(&axis, row_count))
                    .add(years)
                    .add(months)
                    .add(self.render_connectors(&axis, &chart.rows));

                for (index, row) in chart.rows.iter().enumerate() {
                    document = document.add(self.render_row(&axis, row, index));
                }

                if let Some(x) = self.today.and_then(|today| self.date_to_x(chart, today)) {
                    document = document.add(
                        Line::new()
                            .set("id", self.today_line.id.as_str())
                            .set("x1", x)
                            .set("x2", x)
                            .set("y1", self.padding + self.header_height - 10)
                            .set("y2", self.total_height(row_count) - self.padding)
                            .set("stroke", self.today_line.color.as_str())
                            .set("stroke-width", 2),
                    );
                }

                let legend_y = self.total_height(row_count) - self.padding + 10;
                document.add(self.render_legend(legend_y))
            }
        };

        let mut output = Vec::new();
        svg::write(&mut output, &document)
            .map_err(|e| RenderError::Format(format!("Failed to write SVG: {}", e)))?;

        String::from_utf8(output).map_err(|e| RenderError::Format(format!("Invalid UTF-8: {}", e)))
    }
}

impl ChartRenderer for TimelineSvgRenderer {
    fn date_to_x(&self, chart: &GanttChart, date: NaiveDate) -> Option<f64> {
        let axis = self.axis(chart)?;
        if date < axis.data_start || date > axis.data_end {
            return None;
        }
        Some(self.x_for(&axis, date))
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 1).collect();
        format!("{}…", truncated)
    }
}
