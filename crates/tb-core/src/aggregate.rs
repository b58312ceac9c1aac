//! Tag totals over a span of dates.
//!
//! The aggregator walks every date in a span in ascending order, loads that
//! date's partition through a [`PartitionSource`], and folds each record's
//! duration into a per-tag bucket. A date that fails to load contributes
//! nothing; the scan always runs to the end of the span.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::event::EventRecord;

/// Label used for records whose tag is empty or whitespace-only.
pub const UNTAGGED_LABEL: &str = "(untagged)";

/// Read access to per-date event collections.
pub trait PartitionSource {
    type Error: fmt::Display;

    /// Loads all records for one date. A date with no data is an empty `Vec`.
    fn load_partition(&self, date: NaiveDate) -> Result<Vec<EventRecord>, Self::Error>;
}

/// An inclusive, ascending range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateSpan {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateSpan {
    /// Builds a span from two endpoints given in either order.
    #[must_use]
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        if a > b {
            Self { from: b, to: a }
        } else {
            Self { from: a, to: b }
        }
    }

    /// A span covering exactly one date.
    #[must_use]
    pub const fn single(date: NaiveDate) -> Self {
        Self {
            from: date,
            to: date,
        }
    }

    /// Every date in the span, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let to = self.to;
        self.from.iter_days().take_while(move |d| *d <= to)
    }

    /// Number of dates in the span (at least 1).
    #[must_use]
    pub fn len_days(&self) -> u64 {
        // Both ends are valid dates, so the difference is never negative.
        (self.to - self.from).num_days().unsigned_abs() + 1
    }

    /// From `days` days before `end` through `end`.
    ///
    /// Returns `None` when the start would fall before the earliest
    /// representable date.
    #[must_use]
    pub fn looking_back(end: NaiveDate, days: u64) -> Option<Self> {
        let start = end.checked_sub_days(Days::new(days))?;
        Some(Self::new(start, end))
    }
}

/// Minutes per tag over a span, plus the grand total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagSummary {
    /// Minutes per normalized tag, in natural key order.
    pub totals: BTreeMap<String, i64>,
    pub grand_total: i64,
    /// Dates visited by the scan.
    pub days_scanned: u64,
    /// Records left out because a time field did not parse.
    pub records_skipped: usize,
}

impl TagSummary {
    /// Share of the grand total for `tag`, in percent. Zero when nothing was
    /// recorded.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self, tag: &str) -> f64 {
        if self.grand_total <= 0 {
            return 0.0;
        }
        let minutes = self.totals.get(tag).copied().unwrap_or(0);
        minutes as f64 * 100.0 / self.grand_total as f64
    }

    /// `(tag, minutes)` pairs sorted by tag.
    pub fn entries(&self) -> impl Iterator<Item = (&str, i64)> {
        self.totals.iter().map(|(tag, minutes)| (tag.as_str(), *minutes))
    }

    /// Largest single bucket, used to scale bars.
    #[must_use]
    pub fn max_bucket(&self) -> i64 {
        self.totals.values().copied().max().unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    fn add(&mut self, record: &EventRecord) {
        let Some(minutes) = record.duration_minutes() else {
            self.records_skipped += 1;
            return;
        };
        *self.totals.entry(normalize_tag(&record.tag)).or_insert(0) += minutes;
        self.grand_total += minutes;
    }
}

/// Maps empty or whitespace-only tags to [`UNTAGGED_LABEL`], trimming others.
#[must_use]
pub fn normalize_tag(tag: &str) -> String {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        UNTAGGED_LABEL.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Sums minutes per tag for every date between `from` and `to` inclusive.
///
/// Endpoints may be given in either order.
pub fn aggregate<S: PartitionSource>(source: &S, from: NaiveDate, to: NaiveDate) -> TagSummary {
    aggregate_span(source, DateSpan::new(from, to))
}

/// Like [`aggregate`], over an already-ordered span.
pub fn aggregate_span<S: PartitionSource>(source: &S, span: DateSpan) -> TagSummary {
    let mut summary = TagSummary::default();

    for date in span.days() {
        summary.days_scanned += 1;
        let records = match source.load_partition(date) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(%date, error = %e, "skipping unreadable date");
                continue;
            }
        };
        for record in &records {
            summary.add(record);
        }
    }

    tracing::debug!(
        from = %span.from,
        to = %span.to,
        tags = summary.totals.len(),
        grand_total = summary.grand_total,
        skipped = summary.records_skipped,
        "aggregated tag totals"
    );
    summary
}
