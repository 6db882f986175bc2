//! Error types for literal step actions.

// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::Diagnostic;
use thiserror::Error;

use crate::scope::ScopeError;

/// Failure raised by a literal step action.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// No rule understands the step text.
    #[error("undefined step: {expression}")]
    #[diagnostic(code(stepwise::action::undefined))]
    Undefined {
        /// The step text.
        expression: String,
    },
    /// An assertion did not hold.
    #[error("expected {name} to be {expected} but was {actual}")]
    #[diagnostic(code(stepwise::action::assertion))]
    Assertion {
        /// Attribute under test.
        name: String,
        /// Expected value, or its negation.
        expected: String,
        /// Value found.
        actual: String,
    },
    /// The step referenced an unbound attribute.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Unbound(#[from] ScopeError),
    /// Any other failure reported by an action.
    #[error("{message}")]
    #[diagnostic(code(stepwise::action::failed))]
    Failed {
        /// Failure description.
        message: String,
    },
}
