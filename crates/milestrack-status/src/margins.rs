//! Dependency margin aggregation
//!
//! Splits counted dependencies into green / yellow / red buckets and formats
//! each bucket as a count plus an expandable list of lines such as
//! `PDR → CDR (3 days left)`.
//!
//! A bucket whose list has not arrived yet reports its count as `N/A`; it is
//! never shown as zero.

use std::fmt;

use milestrack_core::{CountedDependency, Loadable, MarginBucket};
use serde::Serialize;

use crate::classify::StatusClassifier;

/// Counted dependencies split by bucket
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MarginBuckets {
    pub green: Vec<CountedDependency>,
    pub yellow: Vec<CountedDependency>,
    pub red: Vec<CountedDependency>,
}

impl MarginBuckets {
    pub fn partition(records: &[CountedDependency], classifier: &StatusClassifier) -> Self {
        let mut buckets = Self::default();
        for record in records {
            buckets
                .bucket_mut(classifier.bucket(record))
                .push(record.clone());
        }
        buckets
    }

    pub fn get(&self, bucket: MarginBucket) -> &[CountedDependency] {
        match bucket {
            MarginBucket::Green => &self.green,
            MarginBucket::Yellow => &self.yellow,
            MarginBucket::Red => &self.red,
        }
    }

    fn bucket_mut(&mut self, bucket: MarginBucket) -> &mut Vec<CountedDependency> {
        match bucket {
            MarginBucket::Green => &mut self.green,
            MarginBucket::Yellow => &mut self.yellow,
            MarginBucket::Red => &mut self.red,
        }
    }

    pub fn len(&self) -> usize {
        self.green.len() + self.yellow.len() + self.red.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether a margin is remaining buffer or an overrun
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginDirection {
    Left,
    Over,
}

/// `"N day(s) left"` / `"N day(s) over"`: absolute value, sign picks the word
pub fn format_margin(margin: i64) -> String {
    let days = margin.unsigned_abs();
    let unit = if days == 1 { "day" } else { "days" };
    let word = if margin < 0 { "over" } else { "left" };
    format!("{} {} {}", days, unit, word)
}

/// One detail line of a bucket list
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DependencyLine {
    pub predecessor: String,
    pub successor: String,
    pub days: u64,
    pub direction: MarginDirection,
}

impl From<&CountedDependency> for DependencyLine {
    fn from(dep: &CountedDependency) -> Self {
        Self {
            predecessor: dep.predecessor_milestone.clone(),
            successor: dep.successor_milestone.clone(),
            days: dep.date_margin.unsigned_abs(),
            direction: if dep.date_margin < 0 {
                MarginDirection::Over
            } else {
                MarginDirection::Left
            },
        }
    }
}

impl fmt::Display for DependencyLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let signed = match self.direction {
            MarginDirection::Left => self.days as i64,
            MarginDirection::Over => -(self.days as i64),
        };
        write!(
            f,
            "{} \u{2192} {} ({})",
            self.predecessor,
            self.successor,
            format_margin(signed)
        )
    }
}

/// Count and detail lines for one bucket
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BucketView {
    pub bucket: MarginBucket,
    /// `None` while the list is still loading
    pub count: Option<usize>,
    pub lines: Vec<DependencyLine>,
}

impl BucketView {
    pub fn new(bucket: MarginBucket, records: Loadable<&[CountedDependency]>) -> Self {
        match records {
            Loadable::Loading => Self {
                bucket,
                count: None,
                lines: Vec::new(),
            },
            Loadable::Ready(records) => Self {
                bucket,
                count: Some(records.len()),
                lines: records.iter().map(DependencyLine::from).collect(),
            },
        }
    }

    /// `"N/A"` while loading, the count otherwise
    pub fn count_label(&self) -> String {
        self.count
            .map_or_else(|| "N/A".to_string(), |count| count.to_string())
    }
}

/// The three bucket views shown on the dashboard
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MarginSummary {
    pub green: BucketView,
    pub yellow: BucketView,
    pub red: BucketView,
}

impl MarginSummary {
    /// Build from three independently fetched lists
    pub fn from_lists(
        green: Loadable<&[CountedDependency]>,
        yellow: Loadable<&[CountedDependency]>,
        red: Loadable<&[CountedDependency]>,
    ) -> Self {
        Self {
            green: BucketView::new(MarginBucket::Green, green),
            yellow: BucketView::new(MarginBucket::Yellow, yellow),
            red: BucketView::new(MarginBucket::Red, red),
        }
    }

    /// Build from an in-process partition
    pub fn from_buckets(buckets: Loadable<&MarginBuckets>) -> Self {
        match buckets {
            Loadable::Loading => {
                Self::from_lists(Loadable::Loading, Loadable::Loading, Loadable::Loading)
            }
            Loadable::Ready(b) => Self::from_lists(
                Loadable::Ready(b.green.as_slice()),
                Loadable::Ready(b.yellow.as_slice()),
                Loadable::Ready(b.red.as_slice()),
            ),
        }
    }

    pub fn views(&self) -> [&BucketView; 3] {
        [&self.green, &self.yellow, &self.red]
    }

    /// Total count, or `None` if any bucket is still loading
    pub fn total(&self) -> Option<usize> {
        self.views().iter().map(|v| v.count).sum()
    }

    /// Loaded, and no dependencies at all
    pub fn is_empty(&self) -> bool {
        self.total() == Some(0)
    }
}
