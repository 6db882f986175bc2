//! Fatal evaluation errors.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

use crate::normalize::NormalizeError;
use crate::stepdef::StepDefError;

/// Configuration-time errors that abort evaluation.
///
/// Step failures are not errors; they are recorded as
/// [`EvalStatus::Failed`](crate::status::EvalStatus::Failed) on the step.
#[derive(Debug, Error, Diagnostic)]
pub enum EvalError {
    /// Registering or invoking a StepDef failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    StepDef(#[from] StepDefError),
    /// The feature could not be normalised.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Normalize(#[from] NormalizeError),
    /// An imported meta file failed while loading.
    #[error("meta file {path} failed to load: {cause}")]
    #[diagnostic(code(stepwise::eval::meta_failed))]
    MetaFailed {
        /// Meta file that failed.
        path: Utf8PathBuf,
        /// First failure cause reported by the meta file.
        cause: String,
    },
}
