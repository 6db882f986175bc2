//! Application entry point.
//!
//! Parses command-line arguments and delegates execution to [`runner::run`].

use clap::Parser;
use std::process::ExitCode;
use stepwise::{cli::Cli, runner};
use tracing::Level;
use tracing_subscriber::fmt;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let max_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    fmt().with_max_level(max_level).with_writer(std::io::stderr).init();
    match runner::run(&cli) {
        Ok(status) => ExitCode::from(status.exit_code()),
        Err(err) => {
            tracing::error!(error = %err, "runner failed");
            ExitCode::FAILURE
        }
    }
}
