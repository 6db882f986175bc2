//! Error types for StepDef registration and matching.
//!
//! Kept in a submodule so the lint suppression needed by the derive macros
//! stays narrowly scoped.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::Diagnostic;
use thiserror::Error;

/// Configuration errors raised by the StepDef registry and evaluator.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum StepDefError {
    /// More than one parameterised StepDef reproduces the step text.
    #[error("ambiguous step '{expression}' matches StepDefs: {}", .candidates.join(", "))]
    #[diagnostic(
        code(stepwise::stepdef::ambiguous),
        help("rename one of the StepDefs so only one template matches")
    )]
    Ambiguous {
        /// Step text being resolved.
        expression: String,
        /// Names of every matching StepDef, in registration order.
        candidates: Vec<String>,
    },
    /// A template declares the same placeholder twice.
    #[error("StepDef '{template}' declares placeholder <{placeholder}> more than once")]
    #[diagnostic(code(stepwise::stepdef::duplicate_placeholder))]
    DuplicatePlaceholder {
        /// Offending template.
        template: String,
        /// Repeated placeholder name.
        placeholder: String,
    },
    /// A StepDef name starts with a step keyword.
    #[error("StepDef '{name}' must not start with the keyword '{keyword}'")]
    #[diagnostic(code(stepwise::stepdef::keyword_name))]
    KeywordName {
        /// Offending StepDef name.
        name: String,
        /// Keyword found at the start of the name.
        keyword: &'static str,
    },
    /// A StepDef invoked itself with unchanged input, or nesting ran too deep.
    #[error("infinite recursion evaluating StepDef '{name}' for step '{expression}'")]
    #[diagnostic(code(stepwise::stepdef::infinite_recursion))]
    InfiniteRecursion {
        /// StepDef being entered.
        name: String,
        /// Step text that triggered the call.
        expression: String,
    },
}
