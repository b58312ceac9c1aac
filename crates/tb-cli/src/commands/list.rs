//! List command for showing the events of one date.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use tb_core::sort_for_display;
use tb_store::EventStore;

use super::util;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Date to list (YYYY-MM-DD, "today", "yesterday", "3 days ago").
    #[arg(long, short)]
    pub date: Option<String>,

    /// Output the events as a JSON array.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, store: &EventStore, args: &ListArgs) -> Result<()> {
    let date = util::parse_date_or_today(args.date.as_deref())?;
    write_events(writer, store, date, args.json)
}

fn write_events<W: Write>(writer: &mut W, store: &EventStore, date: NaiveDate, json: bool) -> Result<()> {
    let mut records = store
        .load_partition(date)
        .with_context(|| format!("failed to load events for {date}"))?;
    sort_for_display(&mut records);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&records)?)?;
        return Ok(());
    }

    writeln!(writer, "Events for {date}")?;
    if records.is_empty() {
        writeln!(writer, "No events recorded.")?;
        return Ok(());
    }
    for record in &records {
        writeln!(writer, "  {}  {}", util::short_id(&record.id), record.display_line())?;
    }
    Ok(())
}
