//! A [`StepAction`] double that records every call.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use stepwise::actions::{ActionEnv, ActionError, StepAction};

/// Records performed expressions and fails the ones it is told to.
#[derive(Debug, Default)]
pub struct RecordingAction {
    failing: HashSet<String>,
    performed: Mutex<Vec<String>>,
}

impl RecordingAction {
    /// An action that succeeds for every expression.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail whenever `expression` is performed.
    #[must_use]
    pub fn failing_on(mut self, expression: &str) -> Self {
        self.failing.insert(expression.to_owned());
        self
    }

    /// Expressions performed so far, in call order.
    #[must_use]
    pub fn performed(&self) -> Vec<String> {
        self.performed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StepAction for RecordingAction {
    fn perform(&self, expression: &str, _env: &mut ActionEnv<'_>) -> Result<(), ActionError> {
        self.performed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(expression.to_owned());
        if self.failing.contains(expression) {
            return Err(ActionError::Failed {
                message: format!("{expression} failed"),
            });
        }
        Ok(())
    }
}
