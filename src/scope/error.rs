//! Error types for attribute lookup.

// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by attribute lookup.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// No scope or setting binds the requested name.
    #[error("unbound reference: {name}")]
    #[diagnostic(code(stepwise::scope::unbound))]
    Unbound {
        /// The name that was looked up.
        name: String,
    },
}
