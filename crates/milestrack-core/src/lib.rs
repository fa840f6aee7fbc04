//! # milestrack-core
//!
//! Core domain model and traits for the milestrack dependency status engine.
//!
//! This crate provides:
//! - Domain types: `Milestone`, `DependencyEdge`, `CountedDependency`, `GanttRow`
//! - The date resolution policy (`DateResolution`, `resolve_date`)
//! - Core traits: `Renderer`, `ChartRenderer`
//! - Configuration and error types
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use milestrack_core::{resolve_date, DependencyEdge, Milestone};
//!
//! let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
//!
//! let edge = DependencyEdge::new(
//!     Milestone::new("Radar", "CDR").actual(d(2024, 1, 2), d(2024, 1, 10)),
//!     Milestone::new("Avionics", "Integration").projected(d(2024, 1, 15), d(2024, 2, 1)),
//! );
//!
//! // Actual dates always win over projected ones
//! assert_eq!(
//!     resolve_date(edge.predecessor.actual_end, edge.predecessor.projected_end),
//!     Some(d(2024, 1, 10))
//! );
//!
//! // The epoch sentinel counts as "no date"
//! assert_eq!(resolve_date(Some(d(1969, 12, 31)), None), None);
//! ```

pub mod config;
pub mod feed;
pub mod gantt;
pub mod status;

pub use config::{Config, ConfigError, GanttConfig, OverlayConfig, StatusConfig};
pub use feed::{FeedError, FeedRecord};
pub use gantt::{Column, ColumnType, GanttChart, GanttRow, PercentComplete};
pub use status::{CountedDependency, Loadable, MarginBucket, ProjectStatus, ScheduleStatus};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Date Resolution
// ============================================================================

/// Year that nullable date columns materialize as when they hold no value.
///
/// A zero timestamp read back in a western timezone lands on 1969-12-31, so
/// any date in this year is treated as absent.
pub const SENTINEL_YEAR: i32 = 1969;

/// The "actual if valid, else projected if valid, else absent" policy.
///
/// Every date read in the workspace goes through this type, so the sentinel
/// rule is applied in exactly one place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateResolution {
    /// Dates falling in this year are treated as absent
    pub sentinel_year: i32,
}

impl Default for DateResolution {
    fn default() -> Self {
        Self {
            sentinel_year: SENTINEL_YEAR,
        }
    }
}

impl DateResolution {
    pub const fn new(sentinel_year: i32) -> Self {
        Self { sentinel_year }
    }

    /// Check a single date against the sentinel rule
    pub fn is_valid(&self, date: Option<NaiveDate>) -> bool {
        self.valid(date).is_some()
    }

    /// Filter a date through the sentinel rule
    pub fn valid(&self, date: Option<NaiveDate>) -> Option<NaiveDate> {
        date.filter(|d| d.year() != self.sentinel_year)
    }

    /// Pick the actual date if valid, else the projected date if valid
    pub fn resolve(
        &self,
        actual: Option<NaiveDate>,
        projected: Option<NaiveDate>,
    ) -> Option<NaiveDate> {
        self.valid(actual).or_else(|| self.valid(projected))
    }
}

/// Resolve a date pair with the default sentinel year.
pub fn resolve_date(actual: Option<NaiveDate>, projected: Option<NaiveDate>) -> Option<NaiveDate> {
    DateResolution::default().resolve(actual, projected)
}

/// Check a date against the default sentinel year.
pub fn is_valid_date(date: Option<NaiveDate>) -> bool {
    DateResolution::default().is_valid(date)
}

// ============================================================================
// Milestones and Dependency Edges
// ============================================================================

/// A scheduled task or event within a project
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Owning project name
    pub project: String,
    /// Milestone name (the natural key in chart data)
    pub name: String,
    pub projected_start: Option<NaiveDate>,
    pub projected_end: Option<NaiveDate>,
    pub actual_start: Option<NaiveDate>,
    pub actual_end: Option<NaiveDate>,
}

impl Milestone {
    /// Create a milestone with no dates
    pub fn new(project: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            name: name.into(),
            projected_start: None,
            projected_end: None,
            actual_start: None,
            actual_end: None,
        }
    }

    /// Set both projected dates
    pub fn projected(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.projected_start = Some(start);
        self.projected_end = Some(end);
        self
    }

    /// Set both actual dates
    pub fn actual(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.actual_start = Some(start);
        self.actual_end = Some(end);
        self
    }

    pub fn projected_start(mut self, date: NaiveDate) -> Self {
        self.projected_start = Some(date);
        self
    }

    pub fn projected_end(mut self, date: NaiveDate) -> Self {
        self.projected_end = Some(date);
        self
    }

    pub fn actual_start(mut self, date: NaiveDate) -> Self {
        self.actual_start = Some(date);
        self
    }

    pub fn actual_end(mut self, date: NaiveDate) -> Self {
        self.actual_end = Some(date);
        self
    }

    /// Resolved start date under the given policy
    pub fn resolved_start(&self, policy: DateResolution) -> Option<NaiveDate> {
        policy.resolve(self.actual_start, self.projected_start)
    }

    /// Resolved end date under the given policy
    pub fn resolved_end(&self, policy: DateResolution) -> Option<NaiveDate> {
        policy.resolve(self.actual_end, self.projected_end)
    }

    /// Graph key for this milestone
    pub fn key(&self) -> MilestoneKey {
        MilestoneKey::new(&self.project, &self.name)
    }
}

/// Identifies a milestone across projects
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MilestoneKey {
    pub project: String,
    pub milestone: String,
}

impl MilestoneKey {
    pub fn new(project: impl Into<String>, milestone: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            milestone: milestone.into(),
        }
    }
}

impl fmt::Display for MilestoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.project, self.milestone)
    }
}

/// Which end of a dependency edge a milestone sits on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Predecessor,
    Successor,
}

/// A predecessor -> successor relationship between two milestones,
/// possibly in different projects.
///
/// Edges are read-only snapshots of the external feed; nothing in the
/// workspace mutates them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub predecessor: Milestone,
    pub successor: Milestone,
}

impl DependencyEdge {
    pub fn new(predecessor: Milestone, successor: Milestone) -> Self {
        Self {
            predecessor,
            successor,
        }
    }

    /// The milestone playing the given role
    pub fn side(&self, role: Role) -> &Milestone {
        match role {
            Role::Predecessor => &self.predecessor,
            Role::Successor => &self.successor,
        }
    }

    /// True when the two milestones belong to different projects
    pub fn is_cross_project(&self) -> bool {
        self.predecessor.project != self.successor.project
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render chart data to the output format
    fn render(&self, chart: &GanttChart) -> Result<Self::Output, RenderError>;
}

/// A charting backend that can place dates on its own horizontal axis.
///
/// Backends implementing this let the today marker be positioned directly,
/// without scanning rendered axis labels.
pub trait ChartRenderer: Renderer {
    /// X coordinate of `date` in the rendering of `chart`, or `None` when the
    /// chart has no dated rows or the date falls outside its range.
    fn date_to_x(&self, chart: &GanttChart, date: NaiveDate) -> Option<f64>;
}

// ============================================================================
// Errors
// ============================================================================

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================
