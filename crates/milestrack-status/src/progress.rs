//! Percent-complete interpolation
//!
//! A task is measured against its actual window when it has an actual end,
//! and against its projected window otherwise. The order of the checks
//! matters and is kept exactly:
//!
//! 1. no valid actual start and no valid projected end: `Actual(0)`
//! 2. valid actual end: interpolate up to it, `Actual(100)` once passed
//! 3. valid projected end: start from the actual start (or the projected
//!    start), `Projected(0)` before it, interpolate, `Projected(100)` after;
//!    with no usable start at all, `Projected(100)`
//! 4. otherwise `Actual(0)`

use chrono::NaiveDate;
use milestrack_core::{DateResolution, DependencyEdge, Milestone, PercentComplete, Role};

/// Linear position of `now` within `[start, end]`, as a rounded 0–100 value.
///
/// A zero-length (or inverted) window is 0 before its end and 100 from it on.
pub fn days_elapsed(start: NaiveDate, end: NaiveDate, now: NaiveDate) -> u8 {
    let total = (end - start).num_days();
    if total <= 0 {
        return if now >= end { 100 } else { 0 };
    }
    let elapsed = (now - start).num_days();
    let percent = (elapsed as f64 / total as f64 * 100.0).clamp(0.0, 100.0);
    percent.round() as u8
}

/// Completion of `milestone` as of `now`
pub fn percent_complete(
    milestone: &Milestone,
    now: NaiveDate,
    policy: DateResolution,
) -> PercentComplete {
    let actual_start = policy.valid(milestone.actual_start);
    let actual_end = policy.valid(milestone.actual_end);
    let projected_end = policy.valid(milestone.projected_end);

    if actual_start.is_none() && projected_end.is_none() {
        return PercentComplete::Actual(0);
    }

    if let Some(end) = actual_end {
        if now <= end {
            let start = actual_start.or_else(|| policy.valid(milestone.projected_start));
            return PercentComplete::Actual(start.map_or(0, |s| days_elapsed(s, end, now)));
        }
        return PercentComplete::Actual(100);
    }

    if let Some(end) = projected_end {
        let projected_start = actual_start.or_else(|| policy.valid(milestone.projected_start));
        return match projected_start {
            Some(start) if now >= start => {
                if now <= end {
                    PercentComplete::Projected(days_elapsed(start, end, now))
                } else {
                    PercentComplete::Projected(100)
                }
            }
            Some(_) => PercentComplete::Projected(0),
            None => PercentComplete::Projected(100),
        };
    }

    PercentComplete::Actual(0)
}

/// Completion of one side of an edge
pub fn edge_percent_complete(
    edge: &DependencyEdge,
    role: Role,
    now: NaiveDate,
    policy: DateResolution,
) -> PercentComplete {
    percent_complete(edge.side(role), now, policy)
}
