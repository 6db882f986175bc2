//! Error types for tag parsing.

// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while parsing tag text.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum TagError {
    /// A tag with a recognised name has invalid argument syntax.
    #[error("malformed tag '{tag}': {reason}")]
    #[diagnostic(
        code(stepwise::tag::malformed),
        help("use forms such as @Import(\"file.meta\") or @Examples(\"rows.csv\")")
    )]
    Malformed {
        /// The offending tag text.
        tag: String,
        /// What was wrong with it.
        reason: &'static str,
    },
}
