//! Time-block events as recorded by the user.

use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::types::{EventId, ValidationError};

/// Wire format for wall-clock times.
pub const CLOCK_FORMAT: &str = "%H:%M";

/// Minutes in one day, added once to intervals that cross midnight.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// A wall-clock time as stored on disk.
///
/// The original text is kept verbatim so that records with unparseable
/// times survive a load/save cycle unchanged. Use [`ClockTime::parse`] to get
/// a usable time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClockTime(String);

impl ClockTime {
    /// Wraps raw text without validating it.
    pub fn raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Parses the stored text as `HH:MM`.
    #[must_use]
    pub fn parse(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.0, CLOCK_FORMAT).ok()
    }

    /// Returns the stored text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(time: NaiveTime) -> Self {
        Self(time.format(CLOCK_FORMAT).to_string())
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Minutes from `start` to `end`, treating `end < start` as crossing
/// midnight exactly once.
#[must_use]
pub fn minutes_between(start: NaiveTime, end: NaiveTime) -> i64 {
    let minutes = (end - start).num_minutes();
    if minutes < 0 {
        minutes + MINUTES_PER_DAY
    } else {
        minutes
    }
}

/// A single recorded time-block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Stable identity; the only handle for update and delete.
    pub id: EventId,
    pub title: String,
    pub start: ClockTime,
    pub end: ClockTime,
    /// Free-form category. Empty tags are kept as-is in storage.
    pub tag: String,
    pub description: String,
}

impl EventRecord {
    /// Duration in minutes, or `None` if either time is unparseable.
    #[must_use]
    pub fn duration_minutes(&self) -> Option<i64> {
        Some(minutes_between(self.start.parse()?, self.end.parse()?))
    }

    /// One-line summary: `HH:MM - HH:MM | title [tag]`.
    #[must_use]
    pub fn display_line(&self) -> String {
        format!(
            "{} - {} | {} [{}]",
            display_time(&self.start),
            display_time(&self.end),
            self.title,
            self.tag
        )
    }

    /// Copies the editable fields out, e.g. to pre-fill an edit.
    #[must_use]
    pub fn draft(&self) -> EventDraft {
        EventDraft {
            title: self.title.clone(),
            start: self.start.clone(),
            end: self.end.clone(),
            tag: self.tag.clone(),
            description: self.description.clone(),
        }
    }

    /// Replaces every editable field, keeping the identity.
    pub fn apply(&mut self, draft: EventDraft) {
        self.title = draft.title;
        self.start = draft.start;
        self.end = draft.end;
        self.tag = draft.tag;
        self.description = draft.description;
    }
}

fn display_time(time: &ClockTime) -> String {
    time.parse()
        .map_or_else(|| "--:--".to_string(), |t| t.format(CLOCK_FORMAT).to_string())
}

/// The user-editable part of an event, before it has an identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub start: ClockTime,
    pub end: ClockTime,
    pub tag: String,
    pub description: String,
}

impl EventDraft {
    /// Checks the rules applied when a user enters or edits an event.
    ///
    /// `end < start` is accepted and means the block runs past midnight.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }
        let start = self.start.parse().ok_or_else(|| ValidationError::InvalidTime {
            field: "start",
            value: self.start.as_str().to_string(),
        })?;
        let end = self.end.parse().ok_or_else(|| ValidationError::InvalidTime {
            field: "end",
            value: self.end.as_str().to_string(),
        })?;
        if start == end {
            return Err(ValidationError::ZeroLengthInterval);
        }
        Ok(())
    }

    /// Attaches an identity, producing a storable record.
    #[must_use]
    pub fn into_record(self, id: EventId) -> EventRecord {
        EventRecord {
            id,
            title: self.title,
            start: self.start,
            end: self.end,
            tag: self.tag,
            description: self.description,
        }
    }
}

/// Orders records for listing: by start time, then title.
///
/// Records whose start time does not parse go last, ordered by
/// case-insensitive title.
pub fn sort_for_display(records: &mut [EventRecord]) {
    records.sort_by_cached_key(|r| {
        let start = r.start.parse();
        (start.is_none(), start, r.title.to_lowercase())
    });
}
