//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::{Context, bail};
use chrono::{Days, Local, NaiveDate};
use regex::Regex;
use tb_core::EventId;
use tb_store::EventStore;

/// Pre-compiled regex for relative date parsing.
static RELATIVE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(day|week)s?\s+ago$").unwrap());

/// Conservative bound for relative dates and report spans (~1000 years in days).
pub const MAX_RELATIVE_DAYS: u64 = 1000 * 366;

/// Characters of an event ID shown in listings.
pub const SHORT_ID_LEN: usize = 8;

/// Today's date in the local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parses an optional date argument, defaulting to today.
pub fn parse_date_or_today(s: Option<&str>) -> anyhow::Result<NaiveDate> {
    s.map_or_else(|| Ok(today()), parse_date)
}

/// Parse a date string as either `YYYY-MM-DD` or a relative date.
///
/// Supports:
/// - ISO 8601: "2026-01-15"
/// - Keywords: "today", "yesterday"
/// - Relative: "3 days ago", "1 week ago"
pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    parse_date_from(s, today())
}

/// Like [`parse_date`], resolving relative dates against `today`.
pub fn parse_date_from(s: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    match s {
        "today" => return Ok(today),
        "yesterday" => return days_before(today, 1),
        _ => {}
    }

    let Some(caps) = RELATIVE_DATE_RE.captures(s) else {
        bail!("Invalid date: {s}. Use YYYY-MM-DD (e.g., 2026-01-15) or relative (e.g., '3 days ago')");
    };

    let n: u64 = caps[1]
        .parse()
        .context("failed to parse number in relative date")?;
    let days = match &caps[2] {
        "day" => n,
        "week" => n.saturating_mul(7),
        unit => bail!("Unknown date unit: {unit}"),
    };
    if days > MAX_RELATIVE_DAYS {
        bail!("Relative date too far back: {s}");
    }
    days_before(today, days)
}

fn days_before(date: NaiveDate, days: u64) -> anyhow::Result<NaiveDate> {
    date.checked_sub_days(Days::new(days))
        .with_context(|| format!("date out of range: {days} days before {date}"))
}

/// First few characters of an ID, for display.
pub fn short_id(id: &EventId) -> String {
    id.to_string().chars().take(SHORT_ID_LEN).collect()
}

/// Resolves a full event ID or a unique prefix of one among the events of `date`.
pub fn resolve_event_id(store: &EventStore, date: NaiveDate, s: &str) -> anyhow::Result<EventId> {
    if let Ok(id) = s.parse::<EventId>() {
        return Ok(id);
    }

    let prefix = s.trim().to_lowercase();
    if prefix.is_empty() {
        bail!("event ID cannot be empty");
    }

    let records = store
        .load_partition(date)
        .with_context(|| format!("failed to load events for {date}"))?;
    let mut matches = records
        .iter()
        .map(|r| r.id)
        .filter(|id| id.to_string().starts_with(&prefix));

    match (matches.next(), matches.next()) {
        (Some(id), None) => Ok(id),
        (None, _) => bail!("no event matching {s} on {date}"),
        (Some(_), Some(_)) => bail!("event ID prefix {s} is ambiguous on {date}"),
    }
}
