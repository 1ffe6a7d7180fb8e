mod cli;
mod commands;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use buildwatch_engine::ensure_data_dir;
use clap::Parser;
use directories::ProjectDirs;
use engine_logging::engine_debug;

use crate::cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    ensure_data_dir(&data_dir)
        .with_context(|| format!("cannot use data directory {}", data_dir.display()))?;
    logging::initialize(cli.log, cli.verbose, &data_dir);
    engine_debug!("Using data directory {}", data_dir.display());

    match cli.command {
        Command::Watch(args) => commands::watch(&data_dir, &args),
        Command::Add { locators } => commands::add(&data_dir, &locators),
        Command::Remove { job } => commands::remove(&data_dir, &job),
        Command::List => commands::list(&data_dir),
        Command::Config(args) => commands::config(&data_dir, &args),
    }
}

fn default_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("dev", "buildwatch", "buildwatch")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .context("no home directory; pass --data-dir")
}
