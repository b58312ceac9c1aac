//! Add command for recording a new time-block.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use tb_core::{ClockTime, EventDraft, EventRecord};
use tb_store::EventStore;

use super::util;

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Short name of the event.
    #[arg(long)]
    pub title: String,

    /// Start time (HH:MM).
    #[arg(long)]
    pub start: String,

    /// End time (HH:MM). An end before the start runs past midnight.
    #[arg(long)]
    pub end: String,

    /// Category used for reports.
    #[arg(long, default_value = "")]
    pub tag: String,

    /// Free-form notes.
    #[arg(long, default_value = "")]
    pub description: String,

    /// Date the event belongs to (defaults to today).
    #[arg(long, short)]
    pub date: Option<String>,
}

impl AddArgs {
    fn draft(&self) -> EventDraft {
        EventDraft {
            title: self.title.trim().to_string(),
            start: ClockTime::raw(self.start.trim()),
            end: ClockTime::raw(self.end.trim()),
            tag: self.tag.trim().to_string(),
            description: self.description.clone(),
        }
    }
}

pub fn run<W: Write>(writer: &mut W, store: &EventStore, args: &AddArgs) -> Result<()> {
    let date = util::parse_date_or_today(args.date.as_deref())?;
    let record = add_event(store, date, args.draft())?;
    writeln!(
        writer,
        "Added {} on {date}: {}",
        record.id,
        record.display_line()
    )?;
    Ok(())
}

/// Validates the draft and stores it under `date`.
pub fn add_event(store: &EventStore, date: NaiveDate, draft: EventDraft) -> Result<EventRecord> {
    draft.validate()?;
    store
        .create(date, draft)
        .with_context(|| format!("failed to save event for {date}"))
}
