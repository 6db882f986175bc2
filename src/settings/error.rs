//! Error types for settings loading and lookup.

// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while loading or reading settings.
#[derive(Debug, Error, Diagnostic)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings file {path}")]
    #[diagnostic(code(stepwise::settings::read))]
    Read {
        /// File that was read.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The settings file is not valid YAML.
    #[error("failed to parse settings file {path}: {message}")]
    #[diagnostic(code(stepwise::settings::parse))]
    Parse {
        /// File that was parsed.
        path: Utf8PathBuf,
        /// Parser message.
        message: String,
    },
    /// The document root is not a mapping.
    #[error("settings file {path} must contain a mapping at the top level")]
    #[diagnostic(code(stepwise::settings::not_a_map))]
    NotAMap {
        /// File that was parsed.
        path: Utf8PathBuf,
    },
    /// A required setting is missing.
    #[error("setting not found: {name}")]
    #[diagnostic(code(stepwise::settings::missing))]
    Missing {
        /// Requested setting name.
        name: String,
    },
}
