//! Schedule status types
//!
//! Types describing how far ahead of (or behind) its dependencies a milestone
//! is. The classification itself lives in `milestrack-status`; this module
//! only holds the vocabulary.
//!
//! # Core Concepts
//!
//! - **CountedDependency**: one dependency edge reduced to signed day counts
//! - **MarginBucket**: green / yellow / red partition of counted dependencies
//! - **ScheduleStatus**: on-track / behind / really-behind roll-up per project
//! - **Loadable**: distinguishes "still loading" from "loaded but empty"

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Buckets and Status
// ============================================================================

/// Margin bucket for a counted dependency
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginBucket {
    /// Ample buffer between predecessor end and successor start
    Green,
    /// Little or no buffer left
    Yellow,
    /// Successor is already impacted
    Red,
}

impl MarginBucket {
    pub const ALL: [MarginBucket; 3] = [MarginBucket::Green, MarginBucket::Yellow, MarginBucket::Red];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarginBucket::Green => "green",
            MarginBucket::Yellow => "yellow",
            MarginBucket::Red => "red",
        }
    }

    /// Heading used in the dashboard summary
    pub fn title(&self) -> &'static str {
        match self {
            MarginBucket::Green => "On Schedule",
            MarginBucket::Yellow => "At Risk",
            MarginBucket::Red => "Tracked Impacts",
        }
    }
}

impl fmt::Display for MarginBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status classification for a project's milestones
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleStatus {
    OnTrack,
    Behind,
    ReallyBehind,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::OnTrack => "on-track",
            ScheduleStatus::Behind => "behind",
            ScheduleStatus::ReallyBehind => "really-behind",
        }
    }

    /// Traffic-light color for this status
    pub fn color(&self) -> MarginBucket {
        match self {
            ScheduleStatus::OnTrack => MarginBucket::Green,
            ScheduleStatus::Behind => MarginBucket::Yellow,
            ScheduleStatus::ReallyBehind => MarginBucket::Red,
        }
    }
}

impl From<MarginBucket> for ScheduleStatus {
    fn from(bucket: MarginBucket) -> Self {
        match bucket {
            MarginBucket::Green => ScheduleStatus::OnTrack,
            MarginBucket::Yellow => ScheduleStatus::Behind,
            MarginBucket::Red => ScheduleStatus::ReallyBehind,
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Counted Dependencies
// ============================================================================

/// A dependency edge reduced to signed day counts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountedDependency {
    pub predecessor_project: String,
    pub predecessor_milestone: String,
    pub successor_project: String,
    pub successor_milestone: String,
    /// Days from predecessor end to successor start (positive = buffer)
    pub date_margin: i64,
    /// Days the predecessor end moved past its projected end (positive = slip)
    pub date_difference: i64,
    /// Successor starts before the predecessor finishes
    pub impacted: bool,
}

impl CountedDependency {
    /// `"{pred} → {succ}"` label for list rendering
    pub fn label(&self) -> String {
        format!(
            "{} \u{2192} {}",
            self.predecessor_milestone, self.successor_milestone
        )
    }
}

/// Per-project status roll-up
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub project: String,
    pub status: ScheduleStatus,
    /// Counted dependencies whose successor belongs to this project
    pub incoming: usize,
    /// Smallest margin among those dependencies
    pub worst_margin: Option<i64>,
}

// ============================================================================
// Loading State
// ============================================================================

/// Data that may still be on its way
///
/// `Loading` must never be treated as an empty collection: the dashboard
/// shows "N/A" for it, and a "no dependencies" placeholder only for
/// `Ready` with no items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "data", rename_all = "lowercase")]
pub enum Loadable<T> {
    Loading,
    Ready(T),
}

impl<T> Loadable<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn as_ref(&self) -> Loadable<&T> {
        match self {
            Loadable::Loading => Loadable::Loading,
            Loadable::Ready(value) => Loadable::Ready(value),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loadable<U> {
        match self {
            Loadable::Loading => Loadable::Loading,
            Loadable::Ready(value) => Loadable::Ready(f(value)),
        }
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Loadable::Loading => None,
            Loadable::Ready(value) => Some(value),
        }
    }
}

impl<T> From<Option<T>> for Loadable<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Loadable::Loading, Loadable::Ready)
    }
}
