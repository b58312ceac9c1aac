//! Edit command for changing an existing event in place.

use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::Args;
use tb_core::ClockTime;
use tb_store::EventStore;

use super::util;

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Event ID, or a unique prefix of it.
    pub id: String,

    /// Date the event belongs to (defaults to today).
    #[arg(long, short)]
    pub date: Option<String>,

    #[arg(long)]
    pub title: Option<String>,

    /// New start time (HH:MM).
    #[arg(long)]
    pub start: Option<String>,

    /// New end time (HH:MM).
    #[arg(long)]
    pub end: Option<String>,

    #[arg(long)]
    pub tag: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
}

impl EditArgs {
    fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.start.is_some()
            || self.end.is_some()
            || self.tag.is_some()
            || self.description.is_some()
    }
}

pub fn run<W: Write>(writer: &mut W, store: &EventStore, args: &EditArgs) -> Result<()> {
    if !args.has_changes() {
        bail!("nothing to change; pass at least one of --title, --start, --end, --tag, --description");
    }

    let date = util::parse_date_or_today(args.date.as_deref())?;
    let id = util::resolve_event_id(store, date, &args.id)?;
    let mut record = store.find(date, &id)?;

    let mut draft = record.draft();
    if let Some(title) = &args.title {
        draft.title = title.trim().to_string();
    }
    if let Some(start) = &args.start {
        draft.start = ClockTime::raw(start.trim());
    }
    if let Some(end) = &args.end {
        draft.end = ClockTime::raw(end.trim());
    }
    if let Some(tag) = &args.tag {
        draft.tag = tag.trim().to_string();
    }
    if let Some(description) = &args.description {
        draft.description.clone_from(description);
    }
    draft.validate()?;

    record.apply(draft);
    store
        .update(date, &record)
        .with_context(|| format!("failed to update event {id}"))?;

    writeln!(writer, "Updated {id}: {}", record.display_line())?;
    Ok(())
}
