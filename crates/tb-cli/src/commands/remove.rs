//! Remove command for deleting an event by ID.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use tb_store::EventStore;

use super::util;

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Event ID, or a unique prefix of it.
    pub id: String,

    /// Date the event belongs to (defaults to today).
    #[arg(long, short)]
    pub date: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, store: &EventStore, args: &RemoveArgs) -> Result<()> {
    let date = util::parse_date_or_today(args.date.as_deref())?;
    let id = util::resolve_event_id(store, date, &args.id)?;
    let removed = store
        .delete(date, &id)
        .with_context(|| format!("failed to delete event {id}"))?;
    writeln!(writer, "Deleted {id}: {}", removed.display_line())?;
    Ok(())
}
