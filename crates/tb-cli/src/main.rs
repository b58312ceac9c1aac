use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tb_cli::commands::{add, edit, list, remove, report, tags};
use tb_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    let store = config.store();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::List(args)) => list::run(&mut out, &store, args)?,
        Some(Commands::Add(args)) => add::run(&mut out, &store, args)?,
        Some(Commands::Edit(args)) => edit::run(&mut out, &store, args)?,
        Some(Commands::Rm(args)) => remove::run(&mut out, &store, args)?,
        Some(Commands::Report(args)) => report::run(&mut out, &store, args)?,
        Some(Commands::Tags) => tags::run(&mut out, &config)?,
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    out.flush()?;
    Ok(())
}
