//! Flat dependency feed records
//!
//! The external data source hands over one flat record per dependency edge.
//! Dates arrive as `YYYY-MM-DD` strings; blank cells and nulls are absent.
//! Sentinel-year dates are kept as-is here and rejected later by
//! [`DateResolution`](crate::DateResolution).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DependencyEdge, Milestone};

/// Feed parsing error
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("row {row}: invalid date '{value}' in column '{field}'")]
    InvalidDate {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("row {row}: missing {field}")]
    MissingField { row: usize, field: &'static str },

    #[error("Malformed feed: {0}")]
    Malformed(String),
}

/// One feed row, mirroring the external column layout
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRecord {
    pub predecessor_project: String,
    pub predecessor_milestone: String,
    #[serde(default)]
    pub predecessor_projected_start: Option<String>,
    #[serde(default)]
    pub predecessor_projected_end: Option<String>,
    #[serde(default)]
    pub predecessor_actual_start: Option<String>,
    #[serde(default)]
    pub predecessor_actual_end: Option<String>,
    pub successor_project: String,
    pub successor_milestone: String,
    #[serde(default)]
    pub successor_projected_start: Option<String>,
    #[serde(default)]
    pub successor_projected_end: Option<String>,
    #[serde(default)]
    pub successor_actual_start: Option<String>,
    #[serde(default)]
    pub successor_actual_end: Option<String>,
}

impl FeedRecord {
    /// Convert to an edge; `row` is used in error messages (1-based)
    pub fn into_edge(self, row: usize) -> Result<DependencyEdge, FeedError> {
        if self.predecessor_milestone.trim().is_empty() {
            return Err(FeedError::MissingField {
                row,
                field: "predecessor_milestone",
            });
        }
        if self.successor_milestone.trim().is_empty() {
            return Err(FeedError::MissingField {
                row,
                field: "successor_milestone",
            });
        }

        let predecessor = Milestone {
            project: self.predecessor_project.trim().to_string(),
            name: self.predecessor_milestone.trim().to_string(),
            projected_start: parse_cell(
                row,
                "predecessor_projected_start",
                self.predecessor_projected_start,
            )?,
            projected_end: parse_cell(row, "predecessor_projected_end", self.predecessor_projected_end)?,
            actual_start: parse_cell(row, "predecessor_actual_start", self.predecessor_actual_start)?,
            actual_end: parse_cell(row, "predecessor_actual_end", self.predecessor_actual_end)?,
        };
        let successor = Milestone {
            project: self.successor_project.trim().to_string(),
            name: self.successor_milestone.trim().to_string(),
            projected_start: parse_cell(row, "successor_projected_start", self.successor_projected_start)?,
            projected_end: parse_cell(row, "successor_projected_end", self.successor_projected_end)?,
            actual_start: parse_cell(row, "successor_actual_start", self.successor_actual_start)?,
            actual_end: parse_cell(row, "successor_actual_end", self.successor_actual_end)?,
        };
        Ok(DependencyEdge::new(predecessor, successor))
    }
}

impl From<&DependencyEdge> for FeedRecord {
    fn from(edge: &DependencyEdge) -> Self {
        let fmt = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string());
        Self {
            predecessor_project: edge.predecessor.project.clone(),
            predecessor_milestone: edge.predecessor.name.clone(),
            predecessor_projected_start: fmt(edge.predecessor.projected_start),
            predecessor_projected_end: fmt(edge.predecessor.projected_end),
            predecessor_actual_start: fmt(edge.predecessor.actual_start),
            predecessor_actual_end: fmt(edge.predecessor.actual_end),
            successor_project: edge.successor.project.clone(),
            successor_milestone: edge.successor.name.clone(),
            successor_projected_start: fmt(edge.successor.projected_start),
            successor_projected_end: fmt(edge.successor.projected_end),
            successor_actual_start: fmt(edge.successor.actual_start),
            successor_actual_end: fmt(edge.successor.actual_end),
        }
    }
}

/// Parse one date cell; blank and `null` mean absent
pub fn parse_cell(
    row: usize,
    field: &'static str,
    value: Option<String>,
) -> Result<Option<NaiveDate>, FeedError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    // Timestamps such as "1969-12-31T19:00:00" keep only the date part
    let date_part = trimmed.split(['T', ' ']).next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| FeedError::InvalidDate {
            row,
            field,
            value: raw.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn record() -> FeedRecord {
        FeedRecord {
            predecessor_project: "Radar".into(),
            predecessor_milestone: "CDR".into(),
            predecessor_actual_end: Some("2024-01-10".into()),
            successor_project: "Avionics".into(),
            successor_milestone: "Integration".into(),
            successor_actual_start: Some("2024-01-05".into()),
            ..Default::default()
        }
    }

    #[test]
    fn converts_record_to_edge() {
        let edge = record().into_edge(1).unwrap();
        assert_eq!(edge.predecessor.actual_end, Some(date(2024, 1, 10)));
        assert_eq!(edge.successor.actual_start, Some(date(2024, 1, 5)));
        assert_eq!(edge.successor.projected_end, None);
    }

    #[test]
    fn blank_and_null_cells_are_absent() {
        assert_eq!(parse_cell(1, "x", Some("  ".into())).unwrap(), None);
        assert_eq!(parse_cell(1, "x", Some("NULL".into())).unwrap(), None);
        assert_eq!(parse_cell(1, "x", None).unwrap(), None);
    }

    #[test]
    fn sentinel_dates_survive_loading() {
        let parsed = parse_cell(1, "x", Some("1969-12-31T19:00:00".into())).unwrap();
        assert_eq!(parsed, Some(date(1969, 12, 31)));
    }

    #[test]
    fn invalid_date_names_row_and_column() {
        let mut rec = record();
        rec.successor_projected_end = Some("31/02/2024".into());
        let err = rec.into_edge(7).unwrap_err();
        assert_eq!(
            err.to_string(),
            "row 7: invalid date '31/02/2024' in column 'successor_projected_end'"
        );
    }

    #[test]
    fn missing_milestone_name_is_rejected() {
        let mut rec = record();
        rec.successor_milestone = " ".into();
        assert!(matches!(
            rec.into_edge(2),
            Err(FeedError::MissingField { row: 2, .. })
        ));
    }

    #[test]
    fn edge_converts_back_to_record() {
        let edge = record().into_edge(1).unwrap();
        let back = FeedRecord::from(&edge);
        assert_eq!(back.predecessor_actual_end.as_deref(), Some("2024-01-10"));
        assert_eq!(back.into_edge(1).unwrap(), edge);
    }
}
