//! Apex - operator CLI for the Apex Commerce back-office
//!
//! # Usage
//!
//! ```bash
//! # Show the active edition, limits and features
//! apex license show
//! apex --config /etc/apex/apex.toml license show --json
//!
//! # Issue and check keys
//! apex license generate --edition professional --domain shop.example.com
//! apex license check APX-PH7KQ-XXXXX-M4ZT8-7F7D7 --host shop.example.com
//! ```

mod cmd;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use apex_config::{Config, LogConfig, LogFormat, LogLevel, LogOutput};
use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Apex - operator CLI for the Apex Commerce back-office
#[derive(Parser, Debug)]
#[command(name = "apex")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage and inspect license keys
    License(cmd::license::LicenseArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.log, cli.log_level.as_deref())?;

    match cli.command {
        Command::License(args) => cmd::license::run(args, &config),
    }
}

/// Load the config file if one was given, defaults otherwise
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// Initialize the tracing subscriber for logging
///
/// Level: CLI flag > config file > "info".
fn init_logging(log: &LogConfig, cli_level: Option<&str>) -> Result<()> {
    let level = cli_level
        .map(str::parse::<LogLevel>)
        .transpose()
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let filter = EnvFilter::try_new(log.filter_directives(level))
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log filter: {}", e))?;

    let (writer, ansi) = match &log.output {
        LogOutput::Stderr => (BoxMakeWriter::new(std::io::stderr), true),
        LogOutput::Stdout => (BoxMakeWriter::new(std::io::stdout), true),
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
    };

    let layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_ansi(ansi)
        .with_writer(writer);

    let layer = match log.format {
        LogFormat::Console => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    Ok(())
}
