//! Evaluation status values and their aggregation rule.
//!
//! Every evaluated node carries an [`EvalStatus`]. Parent statuses are never
//! stored independently: they are recomputed from child statuses with
//! [`fold`], which keeps aggregation auditable in one place.
//!
//! ```rust
//! use std::time::Duration;
//! use stepwise::status::{self, EvalStatus};
//!
//! let statuses = [
//!     EvalStatus::passed(Duration::from_secs(1)),
//!     EvalStatus::passed(Duration::from_secs(2)),
//! ];
//! assert_eq!(status::fold(&statuses), EvalStatus::passed(Duration::from_secs(3)));
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Outcome of evaluating a step, scenario, or feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum EvalStatus {
    /// Evaluation succeeded.
    Passed {
        /// Time spent evaluating.
        duration: Duration,
    },
    /// Evaluation failed.
    Failed {
        /// Time spent evaluating.
        duration: Duration,
        /// Description of the first failure.
        cause: String,
    },
    /// Evaluation was skipped.
    Skipped,
    /// Not yet evaluated, or the outcome could not be determined.
    #[default]
    Pending,
    /// A StepDef or meta file was loaded rather than executed.
    Loaded,
}

impl EvalStatus {
    /// Construct a passed status.
    #[must_use]
    pub const fn passed(duration: Duration) -> Self {
        Self::Passed { duration }
    }

    /// Construct a failed status.
    #[must_use]
    pub fn failed(duration: Duration, cause: impl Into<String>) -> Self {
        Self::Failed {
            duration,
            cause: cause.into(),
        }
    }

    /// Time spent; zero for statuses that carry no duration.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        match self {
            Self::Passed { duration } | Self::Failed { duration, .. } => *duration,
            Self::Skipped | Self::Pending | Self::Loaded => Duration::ZERO,
        }
    }

    /// Failure cause, if this status is `Failed`.
    #[must_use]
    pub fn cause(&self) -> Option<&str> {
        match self {
            Self::Failed { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// Whether the status is `Failed`.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Whether the status is `Passed`.
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }

    /// Whether evaluation reached a final outcome. Only `Pending` is
    /// non-terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Process exit code for a run ending in this status.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Passed { .. } | Self::Skipped | Self::Loaded => 0,
            Self::Failed { .. } | Self::Pending => 1,
        }
    }

    /// Status keyword.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Passed { .. } => "Passed",
            Self::Failed { .. } => "Failed",
            Self::Skipped => "Skipped",
            Self::Pending => "Pending",
            Self::Loaded => "Loaded",
        }
    }
}

impl fmt::Display for EvalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed { duration } => write!(f, "Passed ({duration:?})"),
            Self::Failed { duration, cause } => write!(f, "Failed ({duration:?}): {cause}"),
            other => f.write_str(other.keyword()),
        }
    }
}

/// Reduce an ordered list of child statuses to one parent status.
///
/// - no statuses: `Skipped`
/// - any `Failed`: `Failed` with the summed duration and the first cause
/// - all `Loaded`: `Loaded`
/// - otherwise the last non-`Loaded` status decides: `Passed` (summed
///   duration), `Skipped`, or `Pending` for anything else
pub fn fold<I>(statuses: I) -> EvalStatus
where
    I: IntoIterator,
    I::Item: Borrow<EvalStatus>,
{
    let items: Vec<I::Item> = statuses.into_iter().collect();
    let borrowed: Vec<&EvalStatus> = items.iter().map(as_status).collect();
    if borrowed.is_empty() {
        return EvalStatus::Skipped;
    }
    let duration: Duration = borrowed.iter().map(|s| s.duration()).sum();
    if let Some(cause) = borrowed.iter().find_map(|s| s.cause()) {
        return EvalStatus::failed(duration, cause);
    }
    let last = borrowed
        .iter()
        .rev()
        .find(|s| !matches!(s, EvalStatus::Loaded));
    match last {
        None => EvalStatus::Loaded,
        Some(EvalStatus::Passed { .. }) => EvalStatus::passed(duration),
        Some(EvalStatus::Skipped) => EvalStatus::Skipped,
        Some(_) => EvalStatus::Pending,
    }
}

fn as_status<B: Borrow<EvalStatus>>(item: &B) -> &EvalStatus {
    item.borrow()
}
