//! CLI subcommand implementations.

pub mod add;
pub mod edit;
pub mod list;
pub mod remove;
pub mod report;
pub mod tags;
pub mod util;
