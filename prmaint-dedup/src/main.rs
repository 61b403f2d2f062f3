//! prmaint-dedup - Duplicate pull request maintenance tool
//!
//! Loads a JSON snapshot of pull requests, closes automation-owned duplicates
//! (or validates the snapshot), and prints a JSON report to stdout. Logs go to
//! stderr or to the file named in the `[logging]` config section.

use anyhow::{Context, Result};
use clap::Parser;
use prmaint_common::config::{load_config, ConfigSource, LoggingConfig};
use prmaint_dedup::{execute, Cli};
use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Configuration is needed before tracing so the log level can come from it.
    // Nothing logged by load_config would reach a subscriber, so its outcome
    // is reported below.
    let (config, source) = load_config(cli.config.as_deref())?;

    init_tracing(&config.logging, cli.log_level.as_deref())?;

    // Log build identification immediately after tracing init
    info!(
        "Starting prmaint-dedup v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &source {
        ConfigSource::IgnoredPlatformDefault { path, reason } => warn!(
            "Ignoring config file {}: {}; using compiled defaults",
            path.display(),
            reason
        ),
        _ => match source.path() {
            Some(path) => info!("Configuration: {}", path.display()),
            None => info!("Configuration: compiled defaults"),
        },
    }

    execute(&cli, &config)
}

/// Initialize the tracing subscriber
///
/// RUST_LOG wins over `--log-level`, which wins over the TOML level.
fn init_tracing(logging: &LoggingConfig, cli_level: Option<&str>) -> Result<()> {
    let level = cli_level.unwrap_or(&logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
