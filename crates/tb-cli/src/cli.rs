//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{add::AddArgs, edit::EditArgs, list::ListArgs, remove::RemoveArgs, report::ReportArgs};

/// Time-block tracker.
///
/// Records blocks of time per calendar date and reports how the time was
/// split across tags.
#[derive(Debug, Parser)]
#[command(name = "tb", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the events of one date.
    List(ListArgs),

    /// Record a new event.
    Add(AddArgs),

    /// Change fields of an existing event.
    Edit(EditArgs),

    /// Delete an event.
    #[command(alias = "remove")]
    Rm(RemoveArgs),

    /// Show time per tag over a range of dates.
    Report(ReportArgs),

    /// List the configured tags.
    Tags,
}
