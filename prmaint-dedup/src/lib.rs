//! prmaint-dedup library
//!
//! Command-line surface for duplicate pull request maintenance. The binary in
//! `main.rs` only wires logging and configuration; everything testable lives
//! here.
//!
//! Snapshot files are the I/O boundary: records are loaded from a JSON file,
//! maintained in memory, and written back atomically. Closures are reported
//! through the closer's observer seam.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use prmaint_common::config::{DedupConfig, TomlConfig};
use prmaint_common::snapshot::{load_snapshot, validate_snapshot, write_snapshot, ValidationReport};
use prmaint_common::{
    close_duplicate_pull_requests, CanonicalStrategy, CloseDuplicateOptions, CloseSummary,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

/// Command-line arguments for prmaint-dedup
#[derive(Parser, Debug)]
#[command(name = "prmaint-dedup")]
#[command(about = "Close duplicate pull requests owned by automation accounts")]
#[command(version)]
pub struct Cli {
    /// TOML configuration file (overrides PRMAINT_CONFIG)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Close automation-owned duplicates in a snapshot
    CloseDuplicates(CloseArgs),
    /// Check a snapshot for integrity problems
    Validate(ValidateArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct CloseArgs {
    /// Snapshot to read
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Where to write the maintained snapshot (defaults to the input file)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also write the records closed by this run to FILE
    #[arg(long, value_name = "FILE")]
    pub closed_report: Option<PathBuf>,

    /// Canonical selection strategy (earliest, latest, earliest-open, prefer-human)
    #[arg(long)]
    pub strategy: Option<CanonicalStrategy>,

    /// Replace the automation identifiers (repeatable)
    #[arg(long = "identifier", value_name = "ID")]
    pub identifiers: Vec<String>,

    /// Add an automation identifier (repeatable)
    #[arg(long = "extra-identifier", value_name = "ID")]
    pub extra_identifiers: Vec<String>,

    /// Closure reason stamped on closed duplicates
    #[arg(long, value_name = "TEXT")]
    pub reason: Option<String>,

    /// Close human-owned duplicates as well
    #[arg(long)]
    pub close_human_duplicates: bool,

    /// Ignore diacritics when comparing titles
    #[arg(long)]
    pub fold_diacritics: bool,

    /// Report what would be closed without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Snapshot to check
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,
}

/// One closure observed during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Closure {
    pub number: u64,
    pub canonical: u64,
}

/// JSON report printed by `close-duplicates`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseReport {
    pub summary: CloseSummary,
    pub canonical_by_title: BTreeMap<String, u64>,
    pub closures: Vec<Closure>,
    pub skipped: Vec<u64>,
    pub written_to: Option<PathBuf>,
    pub dry_run: bool,
}

/// Merge command-line flags over configuration (CLI > TOML > defaults)
pub fn build_options<'a>(args: &CloseArgs, config: &DedupConfig) -> CloseDuplicateOptions<'a> {
    let mut identifiers = if args.identifiers.is_empty() {
        config.effective_identifiers()
    } else {
        args.identifiers.clone()
    };
    identifiers.extend(args.extra_identifiers.iter().cloned());

    config
        .to_options()
        .with_identifiers(identifiers)
        .with_strategy(args.strategy.unwrap_or(config.canonical_strategy))
        .with_closure_reason(
            args.reason
                .clone()
                .unwrap_or_else(|| config.closure_reason.clone()),
        )
        .with_require_automation_owner(
            config.require_automation_owner && !args.close_human_duplicates,
        )
        .with_fold_diacritics(config.fold_diacritics || args.fold_diacritics)
}

/// Load, maintain, and (unless dry-run) write back a snapshot
pub fn run_close_duplicates(args: &CloseArgs, config: &DedupConfig) -> Result<CloseReport> {
    let records = load_snapshot(&args.input)
        .with_context(|| format!("Failed to load snapshot {}", args.input.display()))?;

    let mut closures = Vec::new();
    let options = build_options(args, config).on_close(|duplicate, canonical| {
        info!(
            "Closing #{} '{}' (duplicate of #{})",
            duplicate.number, duplicate.title, canonical.number
        );
        closures.push(Closure {
            number: duplicate.number,
            canonical: canonical.number,
        });
        Ok(())
    });
    info!("Options: {:?}", options);

    let result = close_duplicate_pull_requests(&records, options);
    info!(
        "Closed {} of {} pull requests across {} titles",
        result.summary.closed_count,
        records.len(),
        result.summary.deduplicated_titles.len()
    );

    let report = validate_snapshot(&result.updated);
    for issue in &report.issues {
        warn!("Snapshot issue after maintenance: {}", issue);
    }

    let written_to = if args.dry_run {
        info!("Dry run: no files written");
        None
    } else {
        let output = args.output.clone().unwrap_or_else(|| args.input.clone());
        write_snapshot(&output, &result.updated)
            .with_context(|| format!("Failed to write snapshot {}", output.display()))?;

        if let Some(path) = &args.closed_report {
            write_snapshot(path, &result.closed)
                .with_context(|| format!("Failed to write closed report {}", path.display()))?;
        }
        Some(output)
    };

    Ok(CloseReport {
        summary: result.summary,
        canonical_by_title: result.canonical_by_title,
        closures,
        skipped: result.skipped.iter().map(|pr| pr.number).collect(),
        written_to,
        dry_run: args.dry_run,
    })
}

/// Load a snapshot and check it
pub fn run_validate(args: &ValidateArgs) -> Result<ValidationReport> {
    let records = load_snapshot(&args.input)
        .with_context(|| format!("Failed to load snapshot {}", args.input.display()))?;
    let report = validate_snapshot(&records);

    if report.is_valid() {
        info!("✓ {} records, no issues", report.record_count);
    } else {
        for issue in &report.issues {
            warn!("{}", issue);
        }
    }
    Ok(report)
}

/// Run the selected subcommand, printing its JSON report to stdout
pub fn execute(cli: &Cli, config: &TomlConfig) -> Result<ExitCode> {
    match &cli.command {
        Command::CloseDuplicates(args) => {
            let report = run_close_duplicates(args, &config.dedup)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate(args) => {
            let report = run_validate(args)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.is_valid() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
