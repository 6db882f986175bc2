//! Error types for the runner module.
//!
//! This submodule isolates derive-macro-affected code to scope lint suppressions
//! narrowly. The `unused_assignments` lint fires in some Rust versions due to
//! thiserror/miette derive macro expansion.

// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while driving a run.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// A path given on the command line does not exist.
    #[error("path not found: {path}")]
    #[diagnostic(code(stepwise::runner::path_not_found))]
    PathNotFound {
        /// The missing path.
        path: Utf8PathBuf,
    },
    /// A path given on the command line is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", .path.display())]
    #[diagnostic(code(stepwise::runner::non_utf8_path))]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },
    /// No feature files were found under the given paths.
    #[error("no .feature files found")]
    #[diagnostic(
        code(stepwise::runner::no_features),
        help("pass feature files or directories containing them")
    )]
    NoFeatures,
    /// The data file has a header but no records.
    #[error("data file {path} has no records")]
    #[diagnostic(
        code(stepwise::runner::empty_data),
        help("add at least one record below the header row")
    )]
    EmptyData {
        /// The data file.
        path: Utf8PathBuf,
    },
    /// The JSON report could not be written.
    #[error("failed to write report {path}")]
    #[diagnostic(code(stepwise::runner::report))]
    Report {
        /// Report destination.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}
