//! Core domain logic for the time-block tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Events: the recorded time-block, its identity, and the duration rule
//! - Aggregation: summing minutes per tag over a span of dates

pub mod aggregate;
pub mod event;
pub mod types;

pub use aggregate::{
    DateSpan, PartitionSource, TagSummary, UNTAGGED_LABEL, aggregate, aggregate_span,
    normalize_tag,
};
pub use event::{ClockTime, EventDraft, EventRecord, minutes_between, sort_for_display};
pub use types::{EventId, ValidationError};
