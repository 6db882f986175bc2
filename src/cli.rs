//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure consumed by [`crate::runner`].

use clap::Parser;
use std::path::PathBuf;

/// Maximum number of worker threads accepted by the CLI.
const MAX_JOBS: usize = 64;

fn parse_jobs(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("{s} is not a valid number"))?;
    if (1..=MAX_JOBS).contains(&value) {
        Ok(value)
    } else {
        Err(format!("jobs must be between 1 and {MAX_JOBS}"))
    }
}

/// Evaluate pre-parsed Gherkin features against StepDefs and built-in rules.
#[derive(Debug, Default, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Feature files or directories searched recursively for `.feature` files.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Enable verbose logging output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Resolve and bind steps without performing literal actions.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip the remaining scenarios of a feature after a failure.
    #[arg(short, long)]
    pub fail_fast: bool,

    /// Stop at the first failure. Implies `--fail-fast`.
    #[arg(long)]
    pub exit_on_fail: bool,

    /// Evaluate features in parallel.
    #[arg(short, long)]
    pub parallel: bool,

    /// Number of worker threads used with `--parallel`.
    #[arg(short, long, value_name = "N", value_parser = parse_jobs)]
    pub jobs: Option<usize>,

    /// YAML settings file; may be repeated, later files win.
    #[arg(short, long = "settings", value_name = "FILE")]
    pub settings: Vec<PathBuf>,

    /// CSV file whose records each drive one run of every feature.
    #[arg(short, long, value_name = "CSV")]
    pub data: Option<PathBuf>,

    /// Directory receiving failure attachments.
    #[arg(short, long, value_name = "DIR")]
    pub attachments: Option<PathBuf>,

    /// Write JSON results to this file.
    #[arg(short, long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

impl Cli {
    /// Whether scenarios after a failure are skipped.
    #[must_use]
    pub const fn fail_fast(&self) -> bool {
        self.fail_fast || self.exit_on_fail
    }
}
