//! Report command for time spent per tag.
//!
//! This module implements `tb report` for a single date (`--date`), an
//! explicit range (`--from`/`--to`), or the last `--days` days, with
//! human-readable and JSON output.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use tb_core::{DateSpan, TagSummary, aggregate_span};
use tb_store::EventStore;

use super::util;

/// Days before today covered when no dates are given.
pub const DEFAULT_LOOKBACK_DAYS: u64 = 7;

/// Minimum width of the tag column.
const TAG_COLUMN_MIN: usize = 12;

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Report on a single date.
    #[arg(long, short, conflicts_with_all = ["from", "to"])]
    pub date: Option<String>,

    /// First date of the range (inclusive).
    #[arg(long)]
    pub from: Option<String>,

    /// Last date of the range (inclusive, defaults to today).
    #[arg(long)]
    pub to: Option<String>,

    /// Days to look back when --from is not given.
    #[arg(
        long,
        default_value_t = DEFAULT_LOOKBACK_DAYS,
        value_parser = clap::value_parser!(u64).range(0..=util::MAX_RELATIVE_DAYS)
    )]
    pub days: u64,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ReportArgs {
    /// Resolves the date arguments into a span, relative to `today`.
    pub fn span(&self, today: NaiveDate) -> Result<DateSpan> {
        let parse = |s: &str| util::parse_date_from(s, today);

        if let Some(date) = &self.date {
            return Ok(DateSpan::single(parse(date.as_str())?));
        }
        let to = self.to.as_deref().map(parse).transpose()?.unwrap_or(today);
        let span = match self.from.as_deref().map(parse).transpose()? {
            Some(from) => DateSpan::new(from, to),
            None => DateSpan::looking_back(to, self.days)
                .with_context(|| format!("date out of range: {} days before {to}", self.days))?,
        };
        if span.len_days() - 1 > util::MAX_RELATIVE_DAYS {
            bail!(
                "Report range too long: {} to {} spans {} days (at most {} allowed)",
                span.from,
                span.to,
                span.len_days(),
                util::MAX_RELATIVE_DAYS + 1
            );
        }
        Ok(span)
    }
}

/// Computed report data.
#[derive(Debug)]
pub struct ReportData {
    pub span: DateSpan,
    pub summary: TagSummary,
}

// ========== Report Generation ==========

/// Aggregates the store over `span`.
pub fn generate_report_data(store: &EventStore, span: DateSpan) -> ReportData {
    tracing::debug!(
        from = %span.from,
        to = %span.to,
        days = span.len_days(),
        "generating report"
    );
    ReportData {
        span,
        summary: aggregate_span(store, span),
    }
}

// ========== Duration Formatting ==========

/// Formats minutes as duration string.
/// Returns "Xh Ym" if >= 1 hour, "Xm" if < 1 hour.
/// Negative durations are treated as 0m.
pub fn format_duration(minutes: i64) -> String {
    if minutes < 0 {
        return "0m".to_string();
    }
    let hours = minutes / 60;
    let minutes = minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

// ========== Progress Bar ==========

/// Generates a 10-character progress bar.
/// Values <5% of max get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(value: i64, max: i64) -> String {
    if max <= 0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = value as f64 / max as f64;
    let filled = if ratio < 0.05 && value > 0 {
        1
    } else {
        (ratio * 10.0).round().clamp(0.0, 10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

fn format_span(span: DateSpan) -> String {
    if span.from == span.to {
        span.from.to_string()
    } else {
        format!("{} to {}", span.from, span.to)
    }
}

/// Formats the human-readable report output.
pub fn format_report(data: &ReportData) -> String {
    let mut output = String::new();
    let summary = &data.summary;

    writeln!(output, "TIME REPORT: {}", format_span(data.span)).unwrap();

    if summary.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No events recorded in this period.").unwrap();
        return output;
    }

    let width = summary
        .entries()
        .map(|(tag, _)| tag.chars().count())
        .max()
        .unwrap_or(0)
        .max(TAG_COLUMN_MIN);
    let max_bucket = summary.max_bucket();

    writeln!(output).unwrap();
    writeln!(output, "BY TAG").unwrap();
    writeln!(output, "──────").unwrap();
    for (tag, minutes) in summary.entries() {
        writeln!(
            output,
            "{tag:<width$}  {:>7}  {:>5.1}%  {}",
            format_duration(minutes),
            summary.percent(tag),
            progress_bar(minutes, max_bucket)
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "SUMMARY").unwrap();
    writeln!(output, "───────").unwrap();
    writeln!(output, "Total tracked:  {}", format_duration(summary.grand_total)).unwrap();
    writeln!(output, "Days scanned:   {}", summary.days_scanned).unwrap();
    if summary.records_skipped > 0 {
        writeln!(
            output,
            "Skipped:        {} event(s) with unreadable times",
            summary.records_skipped
        )
        .unwrap();
    }

    output
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub period: JsonPeriod,
    pub by_tag: Vec<JsonTagEntry>,
    pub total_minutes: i64,
    pub records_skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonPeriod {
    pub start: String,
    pub end: String,
    pub days: u64,
}

#[derive(Debug, Serialize)]
pub struct JsonTagEntry {
    pub tag: String,
    pub minutes: i64,
    pub percent: f64,
}

/// Formats report data as JSON.
pub fn format_report_json(data: &ReportData) -> Result<String> {
    let summary = &data.summary;
    let report = JsonReport {
        period: JsonPeriod {
            start: data.span.from.format("%Y-%m-%d").to_string(),
            end: data.span.to.format("%Y-%m-%d").to_string(),
            days: data.span.len_days(),
        },
        by_tag: summary
            .entries()
            .map(|(tag, minutes)| JsonTagEntry {
                tag: tag.to_string(),
                minutes,
                percent: (summary.percent(tag) * 10.0).round() / 10.0,
            })
            .collect(),
        total_minutes: summary.grand_total,
        records_skipped: summary.records_skipped,
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run<W: Write>(writer: &mut W, store: &EventStore, args: &ReportArgs) -> Result<()> {
    let span = args.span(util::today())?;
    let data = generate_report_data(store, span);

    if args.json {
        writeln!(writer, "{}", format_report_json(&data)?)?;
    } else {
        write!(writer, "{}", format_report(&data))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use tb_core::{ClockTime, EventDraft};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(start: &str, end: &str, tag: &str) -> EventDraft {
        EventDraft {
            title: "block".into(),
            start: ClockTime::raw(start),
            end: ClockTime::raw(end),
            tag: tag.into(),
            description: String::new(),
        }
    }

    fn args() -> ReportArgs {
        ReportArgs {
            date: None,
            from: None,
            to: None,
            days: DEFAULT_LOOKBACK_DAYS,
            json: false,
        }
    }

    fn seeded_store(temp: &tempfile::TempDir) -> EventStore {
        let store = EventStore::new(temp.path(), None);
        store
            .create(date(2024, 1, 1), draft("23:30", "00:15", "Study"))
            .unwrap();
        store
            .create(date(2024, 1, 2), draft("12:00", "13:00", "Study"))
            .unwrap();
        store
            .create(date(2024, 1, 2), draft("10:00", "10:20", ""))
            .unwrap();
        store
    }

    // ========== Span Resolution Tests ==========

    #[test]
    fn test_default_span_looks_back_a_week() {
        let span = args().span(date(2025, 1, 29)).unwrap();
        assert_eq!(span, DateSpan::new(date(2025, 1, 22), date(2025, 1, 29)));
    }

    #[test]
    fn test_single_date_span() {
        let mut a = args();
        a.date = Some("2025-01-10".into());
        assert_eq!(
            a.span(date(2025, 1, 29)).unwrap(),
            DateSpan::single(date(2025, 1, 10))
        );
    }

    #[test]
    fn test_reversed_range_is_swapped() {
        let mut a = args();
        a.from = Some("2025-01-10".into());
        a.to = Some("2025-01-03".into());
        let span = a.span(date(2025, 1, 29)).unwrap();
        assert_eq!(span.from, date(2025, 1, 3));
        assert_eq!(span.to, date(2025, 1, 10));
    }

    #[test]
    fn test_from_without_to_runs_until_today() {
        let mut a = args();
        a.from = Some("2025-01-20".into());
        let span = a.span(date(2025, 1, 29)).unwrap();
        assert_eq!(span.to, date(2025, 1, 29));
    }

    #[test]
    fn test_unbounded_lookback_is_rejected() {
        let mut a = args();
        a.days = u64::MAX;
        assert!(a.span(date(2026, 10, 19)).is_err());

        a.days = util::MAX_RELATIVE_DAYS + 1;
        assert!(a.span(date(2026, 10, 19)).is_err());
    }

    #[test]
    fn test_lookback_at_bound_is_accepted() {
        let mut a = args();
        a.days = util::MAX_RELATIVE_DAYS;
        let span = a.span(date(2026, 10, 19)).unwrap();
        assert_eq!(span.len_days(), util::MAX_RELATIVE_DAYS + 1);
    }

    #[test]
    fn test_ancient_from_date_is_rejected() {
        let mut a = args();
        a.from = Some("0001-01-01".into());
        let err = a.span(date(2026, 10, 19)).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn test_days_flag_is_range_checked() {
        use clap::Parser;

        use crate::{Cli, Commands};

        let too_many = (util::MAX_RELATIVE_DAYS + 1).to_string();
        assert!(Cli::try_parse_from(["tb", "report", "--days", too_many.as_str()]).is_err());
        assert!(Cli::try_parse_from(["tb", "report", "--days", "18446744073709551615"]).is_err());

        let cli = Cli::try_parse_from(["tb", "report", "--days", "30"]).unwrap();
        let Some(Commands::Report(args)) = cli.command else {
            panic!("expected report command");
        };
        assert_eq!(args.days, 30);
    }

    // ========== Duration Formatting Tests ==========

    #[test]
    fn test_format_duration_hours_and_minutes() {
        assert_eq!(format_duration(150), "2h 30m");
        assert_eq!(format_duration(60), "1h 0m");
    }

    #[test]
    fn test_format_duration_minutes_only() {
        assert_eq!(format_duration(45), "45m");
        assert_eq!(format_duration(0), "0m");
    }

    #[test]
    fn test_format_duration_negative_is_zero() {
        assert_eq!(format_duration(-5), "0m");
    }

    // ========== Progress Bar Tests ==========

    #[test]
    fn test_progress_bar_full_and_partial() {
        assert_eq!(progress_bar(100, 100), "██████████");
        assert_eq!(progress_bar(50, 100), "█████░░░░░");
        assert_eq!(progress_bar(20, 105), "██░░░░░░░░");
    }

    #[test]
    fn test_progress_bar_minimum() {
        assert_eq!(progress_bar(1, 100), "█░░░░░░░░░");
    }

    #[test]
    fn test_progress_bar_zero_max() {
        assert_eq!(progress_bar(0, 0), "░░░░░░░░░░");
    }

    // ========== Integration Tests (Snapshot) ==========

    #[test]
    fn test_report_by_tag() {
        let temp = tempfile::tempdir().unwrap();
        let store = seeded_store(&temp);

        let data = generate_report_data(&store, DateSpan::new(date(2024, 1, 1), date(2024, 1, 2)));

        assert_snapshot!(format_report(&data), @r"
        TIME REPORT: 2024-01-01 to 2024-01-02

        BY TAG
        ──────
        (untagged)        20m   16.0%  ██░░░░░░░░
        Study          1h 45m   84.0%  ██████████

        SUMMARY
        ───────
        Total tracked:  2h 5m
        Days scanned:   2
        ");
    }

    #[test]
    fn test_report_empty_period() {
        let temp = tempfile::tempdir().unwrap();
        let store = EventStore::new(temp.path(), None);

        let data = generate_report_data(&store, DateSpan::single(date(2024, 1, 1)));

        assert_eq!(
            format_report(&data),
            "TIME REPORT: 2024-01-01\n\nNo events recorded in this period.\n"
        );
    }

    #[test]
    fn test_report_mentions_skipped_records() {
        let temp = tempfile::tempdir().unwrap();
        let store = EventStore::new(temp.path(), None);
        store
            .create(date(2024, 1, 1), draft("08:00", "09:00", "Work"))
            .unwrap();
        store
            .create(date(2024, 1, 1), draft("??", "09:00", "Work"))
            .unwrap();

        let data = generate_report_data(&store, DateSpan::single(date(2024, 1, 1)));

        assert!(format_report(&data).contains("Skipped:        1 event(s)"));
    }

    #[test]
    fn test_report_json_output() {
        let temp = tempfile::tempdir().unwrap();
        let store = seeded_store(&temp);

        let data = generate_report_data(&store, DateSpan::new(date(2024, 1, 2), date(2024, 1, 1)));
        let json: serde_json::Value =
            serde_json::from_str(&format_report_json(&data).unwrap()).unwrap();

        assert_eq!(json["period"]["start"], "2024-01-01");
        assert_eq!(json["period"]["end"], "2024-01-02");
        assert_eq!(json["period"]["days"], 2);
        assert_eq!(json["total_minutes"], 125);
        assert_eq!(json["by_tag"][0]["tag"], "(untagged)");
        assert_eq!(json["by_tag"][1]["tag"], "Study");
        assert_eq!(json["by_tag"][1]["minutes"], 105);
        assert_eq!(json["by_tag"][1]["percent"], 84.0);
    }
}
