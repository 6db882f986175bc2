//! Error types for normalisation.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while loading, importing, or expanding a feature.
#[derive(Debug, Error, Diagnostic)]
pub enum NormalizeError {
    /// A feature, meta, or CSV file could not be read.
    #[error("failed to read {path}")]
    #[diagnostic(code(stepwise::normalize::read))]
    Read {
        /// File that was read.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// A feature AST document could not be parsed.
    #[error("failed to parse {path}: {message}")]
    #[diagnostic(code(stepwise::normalize::parse))]
    Parse {
        /// File that was parsed.
        path: Utf8PathBuf,
        /// Parser message.
        message: String,
    },
    /// An `@Import` target does not have the meta extension.
    #[error("unsupported import {path}: only .meta files can be imported")]
    #[diagnostic(code(stepwise::normalize::unsupported_import))]
    UnsupportedImport {
        /// Imported path.
        path: Utf8PathBuf,
    },
    /// An `@Import` target does not exist.
    #[error("imported meta file not found: {path}")]
    #[diagnostic(code(stepwise::normalize::missing_import))]
    MissingImport {
        /// Imported path.
        path: Utf8PathBuf,
    },
    /// An import chain leads back to a file already being imported.
    #[error("recursive import: {importer} imports {imported}")]
    #[diagnostic(
        code(stepwise::normalize::recursive_import),
        help("remove the @Import tag that closes the cycle")
    )]
    RecursiveImport {
        /// File declaring the offending import.
        importer: Utf8PathBuf,
        /// File it imports.
        imported: Utf8PathBuf,
    },
    /// An `@Examples` source does not have the CSV extension.
    #[error("unsupported examples source {path}: only .csv files are supported")]
    #[diagnostic(code(stepwise::normalize::unsupported_examples))]
    UnsupportedExamples {
        /// Examples path.
        path: Utf8PathBuf,
    },
    /// An `@Examples` or data source does not exist.
    #[error("data file not found: {path}")]
    #[diagnostic(code(stepwise::normalize::missing_data))]
    MissingData {
        /// Data file path.
        path: Utf8PathBuf,
    },
    /// A CSV file could not be decoded.
    #[error("failed to read CSV file {path}")]
    #[diagnostic(code(stepwise::normalize::csv))]
    Csv {
        /// CSV file path.
        path: Utf8PathBuf,
        /// Underlying CSV failure.
        #[source]
        source: csv::Error,
    },
    /// `@Examples` was used on a scenario that is not an outline.
    #[error("scenario '{scenario}' uses @Examples but is not a scenario outline")]
    #[diagnostic(code(stepwise::normalize::examples_on_scenario))]
    ExamplesOnScenario {
        /// Scenario name.
        scenario: String,
    },
    /// An examples row has a different number of cells than the header.
    #[error("examples '{examples}' line {line}: expected {expected} cells, found {found}")]
    #[diagnostic(code(stepwise::normalize::examples_shape))]
    ExamplesShape {
        /// Examples block name.
        examples: String,
        /// Line of the offending row.
        line: usize,
        /// Header cell count.
        expected: usize,
        /// Row cell count.
        found: usize,
    },
}
