//! # sale-check
//!
//! Validates a sale schedule, vesting distribution or creation draft from
//! a JSON file and prints a JSON report.
//!
//! ## Usage
//! ```text
//! sale-check [--config rules.toml] schedule           phases.json
//! sale-check [--config rules.toml] distribution       vesting.json
//! sale-check [--config rules.toml] distribution-edit  vesting.json
//! sale-check [--config rules.toml] draft              sale.json
//! ```
//!
//! ## Exit Codes
//! - `0` input accepted
//! - `1` input rejected (report says why)
//! - `2` usage, config or I/O error
//!
//! Logs go to stderr; `RUST_LOG` overrides the default filter.

mod checks;
mod config;
mod report;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ico_core::draft::SaleDraft;
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use crate::checks::{check_distribution, check_draft, check_schedule};
use crate::config::load_rules;
use crate::report::CheckReport;

#[derive(Debug, Parser)]
#[command(name = "sale-check", version, about = "Validate ICO sale drafts")]
struct Cli {
    /// TOML rules file (percent_epsilon, input_utc_offset, contiguity)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Check,
}

#[derive(Debug, Subcommand)]
enum Check {
    /// Sale phases: { saleStart, saleEnd, windows }
    Schedule { input: PathBuf },
    /// Vesting at submission: { saleEnd, entries }
    Distribution { input: PathBuf },
    /// Vesting while editing: the total may still be below 100
    DistributionEdit { input: PathBuf },
    /// Sale creation form
    Draft { input: PathBuf },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    ExitCode::from(finish(run(&cli)))
}

/// Prints the report and maps the outcome to a process exit status.
fn finish(outcome: Result<CheckReport>) -> u8 {
    match outcome {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                println!("{}", json);
                report.exit_code()
            }
            Err(e) => {
                error!("Could not serialize report: {}", e);
                2
            }
        },
        Err(e) => {
            error!("{:#}", e);
            eprintln!("sale-check: {:#}", e);
            2
        }
    }
}

fn run(cli: &Cli) -> Result<CheckReport> {
    let rules = load_rules(cli.config.as_deref())?;
    debug!(?rules, "Rules in effect");

    let report = match &cli.command {
        Check::Schedule { input } => check_schedule(&rules, &read_json(input)?),
        Check::Distribution { input } => {
            check_distribution(&rules, &read_json(input)?, false)
        }
        Check::DistributionEdit { input } => {
            check_distribution(&rules, &read_json(input)?, true)
        }
        Check::Draft { input } => check_draft(&rules, &read_json::<SaleDraft>(input)?),
    };
    Ok(report)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Initializes the tracing subscriber for logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - verbose
/// - Default: `info,ico=debug`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ico=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// =============================================================================
// Unit Tests
// =============================================================================
