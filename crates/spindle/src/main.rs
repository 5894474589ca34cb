//! Spindle - superstep record writer
//!
//! # Usage
//!
//! ```bash
//! # Shuffle 1000 records per superstep for 3 supersteps
//! spindle run
//! spindle --config spindle.toml run --supersteps 10 --vertices 50000
//!
//! # List the recovery log segments written by a run
//! spindle --config spindle.toml inspect
//! ```

mod cmd;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spindle_config::Config;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Spindle - superstep record writer
#[derive(Parser, Debug)]
#[command(name = "spindle")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file; defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive; overrides the [log] section
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run supersteps of a local shuffle and report per-channel counts
    Run(cmd::run::RunArgs),

    /// List recovery log segments and count their records
    Inspect(cmd::inspect::InspectArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or_else(|| config.log.directive());
    init_logging(level)?;

    match cli.command {
        Command::Run(args) => cmd::run::run(&config, args),
        Command::Inspect(args) => cmd::inspect::run(&config, args),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// Install the tracing subscriber, falling back to `info` on a bad directive
fn init_logging(directive: &str) -> Result<()> {
    let (filter, rejected) = match EnvFilter::try_new(directive) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::try_new("info")?, Some(e)),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_names(true))
        .with(filter)
        .try_init()
        .context("installing log subscriber")?;

    if let Some(e) = rejected {
        tracing::warn!(directive, error = %e, "invalid log filter, using info");
    }
    Ok(())
}
