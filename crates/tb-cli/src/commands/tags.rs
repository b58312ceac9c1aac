//! Tags command for listing the configured categories.

use std::io::Write;

use anyhow::Result;

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let tags = config.available_tags();
    if tags.is_empty() {
        writeln!(writer, "No tags configured.")?;
        return Ok(());
    }
    for tag in tags {
        writeln!(writer, "{tag}")?;
    }
    Ok(())
}
