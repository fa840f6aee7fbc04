//! Today-line overlay for externally rendered charts
//!
//! Given the feed and today's date, the overlay finds the rendered axis label
//! for the current month and interpolates within it:
//!
//! ```text
//! x = label.x + (next_label.x - label.x) * day_of_month / days_in_month
//! ```
//!
//! Month abbreviations repeat on multi-year charts, so the plan counts how
//! many labels should read e.g. `Jan` and which of them is this year's. If
//! the chart shows a different number of such labels (clipped edges, for
//! instance) nothing is drawn.

use chrono::{Datelike, NaiveDate};
use milestrack_core::{DateResolution, DependencyEdge, OverlayConfig};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::chart::{Element, SvgChart};

/// Why no plan could be made
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("feed has no resolvable start or end dates")]
    NoDates,

    #[error("{today} is outside the charted range {start} to {end}")]
    OutsideRange {
        today: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// Why a plan could not be placed on a chart
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LocateError {
    /// No label for the month has been painted yet
    #[error("no `{0}` label in the chart")]
    LabelsMissing(String),

    #[error("expected {expected} month labels, chart has {found}")]
    LabelMismatch { expected: usize, found: usize },
}

/// Result of one overlay run
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OverlayOutcome {
    /// Line drawn at `x`
    Drawn { x: f64 },
    NoDates,
    OutsideRange,
    LabelMismatch { expected: usize, found: usize },
    /// The chart never painted within the ready timeout
    TimedOut,
    /// Newer data arrived (or the run was cancelled) before anything was drawn
    Superseded,
    /// Stopped after drawing and maintaining the line
    Retired { x: f64, redraws: usize },
}

impl OverlayOutcome {
    pub fn x(&self) -> Option<f64> {
        match self {
            OverlayOutcome::Drawn { x } | OverlayOutcome::Retired { x, .. } => Some(*x),
            _ => None,
        }
    }

    pub fn is_drawn(&self) -> bool {
        self.x().is_some()
    }
}

impl From<PlanError> for OverlayOutcome {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::NoDates => OverlayOutcome::NoDates,
            PlanError::OutsideRange { .. } => OverlayOutcome::OutsideRange,
        }
    }
}

/// Id and stroke of the overlay line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineStyle {
    pub id: String,
    pub color: String,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self::from(&OverlayConfig::default())
    }
}

impl From<&OverlayConfig> for LineStyle {
    fn from(config: &OverlayConfig) -> Self {
        Self {
            id: config.line_id.clone(),
            color: config.line_color.clone(),
        }
    }
}

/// Everything known about today's line before looking at the chart
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodayLinePlan {
    pub today: NaiveDate,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Abbreviated month name as it appears on the axis (`%b`)
    pub label: String,
    /// How many months in the range share that abbreviation
    pub occurrences: usize,
    /// Which of them (1-based) is today's year
    pub occurrence: usize,
}

impl TodayLinePlan {
    /// Plan from the feed's resolved date range
    pub fn new(
        edges: &[DependencyEdge],
        today: NaiveDate,
        policy: DateResolution,
    ) -> Result<Self, PlanError> {
        let (start, end) = milestrack_status::date_range(edges, policy).ok_or(PlanError::NoDates)?;
        Self::for_range(start, end, today)
    }

    pub fn for_range(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<Self, PlanError> {
        if today < start || today > end {
            return Err(PlanError::OutsideRange { today, start, end });
        }

        let mut occurrences = 0;
        let mut occurrence = 0;
        let mut month = first_of_month(start);
        while month <= end {
            if month.month() == today.month() {
                occurrences += 1;
                if month.year() == today.year() {
                    occurrence = occurrences;
                }
            }
            match next_month(month) {
                Some(next) => month = next,
                None => break,
            }
        }

        Ok(Self {
            today,
            start,
            end,
            label: today.format("%b").to_string(),
            occurrences,
            occurrence,
        })
    }

    /// `day_of_month / days_in_month`
    pub fn month_fraction(&self) -> f64 {
        f64::from(self.today.day()) / f64::from(days_in_month(self.today))
    }

    /// Find today's x position in `chart` without modifying it
    pub fn locate(&self, chart: &SvgChart) -> Result<Placement, LocateError> {
        let labels = chart.text_labels(&self.label);
        if labels.is_empty() {
            return Err(LocateError::LabelsMissing(self.label.clone()));
        }
        if labels.len() != self.occurrences || self.occurrence == 0 {
            return Err(LocateError::LabelMismatch {
                expected: self.occurrences,
                found: labels.len(),
            });
        }

        let label = &labels[self.occurrence - 1];
        let span_end = label.next_x.or_else(|| chart.width()).unwrap_or(label.x);
        let x = label.x + (span_end - label.x) * self.month_fraction();

        Ok(Placement {
            x,
            label_path: label.path.clone(),
        })
    }
}

/// Where the line goes
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub label_path: Vec<usize>,
}

/// Remove any previous line and draw a new one for `plan`.
///
/// The line is inserted right after the label's parent, or right after the
/// label when it sits directly under the root. Leaves the chart untouched on
/// error.
pub fn draw_today_line(
    chart: &mut SvgChart,
    plan: &TodayLinePlan,
    style: &LineStyle,
) -> Result<f64, LocateError> {
    plan.locate(chart)?;
    chart.remove_by_id(&style.id);
    // removal can shift indices, so locate again on the cleaned tree
    let placement = plan.locate(chart)?;
    let height = chart
        .height()
        .or_else(|| chart.content_height())
        .unwrap_or(0.0);

    let line = Element::new("line")
        .with_attr("id", &style.id)
        .with_attr("x1", placement.x)
        .with_attr("x2", placement.x)
        .with_attr("y1", 0)
        .with_attr("y2", height)
        .with_attr("stroke", &style.color)
        .with_attr("stroke-width", 2);

    let path = &placement.label_path;
    let anchor = if path.len() >= 2 { &path[..path.len() - 1] } else { &path[..] };
    if !chart.insert_after(anchor, line.clone()) {
        chart.append(line);
    }

    debug!(x = placement.x, label = %plan.label, "drew today line");
    Ok(placement.x)
}

/// One-shot overlay: plan, locate, draw
pub fn overlay_today_line(
    chart: &mut SvgChart,
    edges: &[DependencyEdge],
    today: NaiveDate,
    policy: DateResolution,
    style: &LineStyle,
) -> OverlayOutcome {
    let plan = match TodayLinePlan::new(edges, today, policy) {
        Ok(plan) => plan,
        Err(err) => {
            info!("no today line: {}", err);
            return err.into();
        }
    };

    match draw_today_line(chart, &plan, style) {
        Ok(x) => OverlayOutcome::Drawn { x },
        Err(LocateError::LabelsMissing(_)) => OverlayOutcome::LabelMismatch {
            expected: plan.occurrences,
            found: 0,
        },
        Err(LocateError::LabelMismatch { expected, found }) => {
            info!(expected, found, "month label count mismatch, no today line");
            OverlayOutcome::LabelMismatch { expected, found }
        }
    }
}

pub(crate) fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub(crate) fn next_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

pub(crate) fn days_in_month(date: NaiveDate) -> u32 {
    let first = first_of_month(date);
    next_month(first).map_or(31, |next| (next - first).num_days() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use milestrack_core::Milestone;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn axis(labels: &[(&str, u32)], width: u32) -> SvgChart {
        let texts: String = labels
            .iter()
            .map(|(label, x)| format!(r#"<text x="{}" y="20">{}</text>"#, x, label))
            .collect();
        SvgChart::parse(&format!(
            r#"<svg width="{w}" height="300"><g class="axis">{t}</g><g class="bars"/></svg>"#,
            w = width,
            t = texts
        ))
        .unwrap()
    }

    #[test]
    fn plan_counts_repeated_months() {
        let plan = TodayLinePlan::for_range(date(2023, 11, 20), date(2025, 2, 3), date(2024, 1, 15))
            .unwrap();
        assert_eq!(plan.label, "Jan");
        assert_eq!(plan.occurrences, 2);
        assert_eq!(plan.occurrence, 1);

        let plan = TodayLinePlan::for_range(date(2023, 1, 31), date(2025, 2, 3), date(2025, 1, 2))
            .unwrap();
        assert_eq!(plan.occurrences, 3);
        assert_eq!(plan.occurrence, 3);
    }

    #[test]
    fn plan_rejects_today_outside_range() {
        let err = TodayLinePlan::for_range(date(2024, 1, 1), date(2024, 3, 1), date(2024, 3, 2))
            .unwrap_err();
        assert!(matches!(err, PlanError::OutsideRange { .. }));
        assert!(
            TodayLinePlan::for_range(date(2024, 1, 1), date(2024, 3, 1), date(2023, 12, 31)).is_err()
        );
        assert!(TodayLinePlan::for_range(date(2024, 1, 1), date(2024, 3, 1), date(2024, 3, 1)).is_ok());
    }

    #[test]
    fn plan_from_feed_without_dates() {
        let edges = vec![DependencyEdge::new(Milestone::new("A", "a"), Milestone::new("B", "b"))];
        assert_eq!(
            TodayLinePlan::new(&edges, date(2024, 1, 1), DateResolution::default()),
            Err(PlanError::NoDates)
        );
    }

    #[test]
    fn month_fraction_uses_month_length() {
        let plan = TodayLinePlan::for_range(date(2024, 1, 1), date(2024, 12, 31), date(2024, 2, 29))
            .unwrap();
        assert_eq!(plan.month_fraction(), 1.0);
        assert_eq!(days_in_month(date(2023, 2, 10)), 28);
        assert_eq!(days_in_month(date(2024, 12, 31)), 31);
    }

    #[test]
    fn draws_interpolated_line_after_label_group() {
        let mut chart = axis(&[("Jan", 100), ("Feb", 224), ("Mar", 340)], 500);
        let plan = TodayLinePlan::for_range(date(2024, 1, 1), date(2024, 3, 31), date(2024, 2, 15))
            .unwrap();

        let x = draw_today_line(&mut chart, &plan, &LineStyle::default()).unwrap();
        // 15 of 29 days across a 116px span
        assert!((x - (224.0 + 116.0 * 15.0 / 29.0)).abs() < 1e-9);

        let line = chart.find_by_id("today-line").unwrap();
        assert_eq!(line.attr("y2"), Some("300"));
        assert_eq!(line.attr("stroke"), Some("#d62728"));
        let names: Vec<&str> = chart.root().elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["g", "line", "g"]);
    }

    #[test]
    fn last_label_spans_to_chart_width() {
        let mut chart = axis(&[("Jan", 100), ("Feb", 224), ("Mar", 340)], 650);
        let plan = TodayLinePlan::for_range(date(2024, 1, 1), date(2024, 3, 31), date(2024, 3, 31))
            .unwrap();
        let x = draw_today_line(&mut chart, &plan, &LineStyle::default()).unwrap();
        assert_eq!(x, 650.0);
    }

    #[test]
    fn redraw_replaces_previous_line() {
        let mut chart = axis(&[("Jan", 100), ("Feb", 200)], 300);
        let plan = TodayLinePlan::for_range(date(2024, 1, 1), date(2024, 2, 28), date(2024, 1, 10))
            .unwrap();
        let style = LineStyle::default();
        draw_today_line(&mut chart, &plan, &style).unwrap();
        draw_today_line(&mut chart, &plan, &style).unwrap();

        let svg = chart.to_svg_string();
        assert_eq!(svg.matches("today-line").count(), 1);
    }

    #[test]
    fn label_count_mismatch_draws_nothing() {
        // range covers two Januaries but the chart only shows one
        let mut chart = axis(&[("Jan", 100), ("Feb", 200)], 300);
        let plan = TodayLinePlan::for_range(date(2023, 1, 1), date(2024, 2, 28), date(2024, 1, 10))
            .unwrap();
        let before = chart.clone();

        assert_eq!(
            draw_today_line(&mut chart, &plan, &LineStyle::default()),
            Err(LocateError::LabelMismatch {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(chart, before);
    }

    #[test]
    fn missing_labels_are_reported_separately() {
        let chart = axis(&[], 300);
        let plan = TodayLinePlan::for_range(date(2024, 1, 1), date(2024, 2, 28), date(2024, 1, 10))
            .unwrap();
        assert_eq!(
            plan.locate(&chart),
            Err(LocateError::LabelsMissing("Jan".into()))
        );
    }

    #[test]
    fn label_directly_under_root() {
        let mut chart = SvgChart::parse(
            r#"<svg width="400" height="100"><text x="0">Jan</text><text x="310">Feb</text></svg>"#,
        )
        .unwrap();
        let plan = TodayLinePlan::for_range(date(2024, 1, 1), date(2024, 2, 28), date(2024, 1, 31))
            .unwrap();
        let x = draw_today_line(&mut chart, &plan, &LineStyle::default()).unwrap();
        assert_eq!(x, 310.0);
        let names: Vec<&str> = chart.root().elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["text", "line", "text"]);
    }

    #[test]
    fn line_spans_content_when_height_is_undeclared() {
        let mut chart = SvgChart::parse(
            r#"<svg width="400"><g><text x="0" y="20">Jan</text><text x="310" y="20">Feb</text></g><rect x="10" y="30" width="50" height="150"/></svg>"#,
        )
        .unwrap();
        let plan = TodayLinePlan::for_range(date(2024, 1, 1), date(2024, 2, 28), date(2024, 1, 31))
            .unwrap();
        draw_today_line(&mut chart, &plan, &LineStyle::default()).unwrap();
        let line = chart.find_by_id("today-line").unwrap();
        assert_eq!(line.numeric_attr("y2"), Some(180.0));
    }

    #[test]
    fn one_shot_outcomes() {
        let edges = vec![DependencyEdge::new(
            Milestone::new("A", "a").projected(date(2024, 1, 5), date(2024, 1, 25)),
            Milestone::new("B", "b").projected(date(2024, 2, 1), date(2024, 2, 20)),
        )];
        let policy = DateResolution::default();
        let style = LineStyle::default();

        let mut chart = axis(&[("Jan", 100), ("Feb", 200)], 300);
        let outcome = overlay_today_line(&mut chart, &edges, date(2024, 2, 10), policy, &style);
        assert!(outcome.is_drawn());

        let outcome = overlay_today_line(&mut chart, &edges, date(2024, 6, 1), policy, &style);
        assert_eq!(outcome, OverlayOutcome::OutsideRange);

        let mut bare = axis(&[], 300);
        let outcome = overlay_today_line(&mut bare, &edges, date(2024, 2, 10), policy, &style);
        assert_eq!(
            outcome,
            OverlayOutcome::LabelMismatch {
                expected: 1,
                found: 0
            }
        );
        assert_eq!(overlay_today_line(&mut bare, &[], date(2024, 2, 10), policy, &style), OverlayOutcome::NoDates);
    }
}
