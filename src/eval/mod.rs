//! Feature evaluation.
//!
//! An [`EvalContext`] owns all mutable state of one feature run: the scope
//! stack, the StepDef registry, the attachment log and the set of meta files
//! already loaded. Nothing is shared between contexts, so separate features
//! may be evaluated on separate threads.
//!
//! Evaluation never mutates its input. Every step, scenario and feature is
//! returned as a new value carrying its [`EvalStatus`].
//!
//! ```rust
//! use std::sync::Arc;
//! use stepwise::actions::BuiltinActions;
//! use stepwise::ast::{FeatureSpec, Scenario, Step, StepKeyword};
//! use stepwise::eval::EvalContext;
//! use stepwise::settings::Settings;
//!
//! let spec = FeatureSpec::new(
//!     "Greeting",
//!     vec![Scenario::new(
//!         "Hello",
//!         vec![
//!             Step::new(StepKeyword::Given, "greeting is \"hello\""),
//!             Step::new(StepKeyword::Then, "greeting should be \"hello\""),
//!         ],
//!     )],
//! );
//! let mut ctx = EvalContext::new(Arc::new(Settings::new()), Arc::new(BuiltinActions));
//! let result = ctx.evaluate_feature(&spec).expect("evaluate");
//! assert!(result.status.is_passed());
//! ```

mod error;
mod feature;
mod interpolate;
mod step;

use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::actions::StepAction;
use crate::ast::{Attachment, FeatureSpec};
use crate::attachments::AttachmentLog;
use crate::normalize::{AstLoader, DataRecord, LoadedMetas, Normalizer};
use crate::scope::{ScopeError, ScopeStack};
use crate::settings::Settings;
use crate::status::EvalStatus;
use crate::stepdef::StepDefRegistry;

pub use error::EvalError;
pub use interpolate::{Reference, escape, interpolate};

/// Maximum nesting of StepDef calls.
pub const MAX_STEPDEF_DEPTH: usize = 128;
/// Object cache name under which a step's data table is bound.
pub const TABLE_OBJECT: &str = "table";

/// Evaluation policy flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvalOptions {
    /// Treat every literal step as passed without performing it.
    pub dry_run: bool,
    /// Skip the remaining scenarios of a feature after a failure.
    pub fail_fast: bool,
    /// Stop after a failure and withhold the remaining scenarios.
    pub exit_on_fail: bool,
}

/// Outcome of evaluating one feature.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureResult {
    /// The evaluated feature with statuses on every node.
    pub spec: FeatureSpec,
    /// Aggregate status of the feature's scenarios.
    pub status: EvalStatus,
    /// Wall-clock time spent.
    pub elapsed: Duration,
    /// Attachments written by the context, sorted by file name.
    pub attachments: Vec<Attachment>,
}

/// Mutable state for one feature run.
pub struct EvalContext {
    scopes: ScopeStack,
    registry: StepDefRegistry,
    settings: Arc<Settings>,
    attachments: AttachmentLog,
    loaded: LoadedMetas,
    options: EvalOptions,
    action: Arc<dyn StepAction>,
    call_stack: Vec<(String, String)>,
}

impl EvalContext {
    /// Create a context performing literal steps with `action`.
    #[must_use]
    pub fn new(settings: Arc<Settings>, action: Arc<dyn StepAction>) -> Self {
        Self {
            scopes: ScopeStack::new(),
            registry: StepDefRegistry::new(),
            settings,
            attachments: AttachmentLog::new(None),
            loaded: LoadedMetas::default(),
            options: EvalOptions::default(),
            action,
            call_stack: Vec::new(),
        }
    }

    /// Set the evaluation policy.
    #[must_use]
    pub fn with_options(mut self, options: EvalOptions) -> Self {
        self.options = options;
        self
    }

    /// Write failure attachments into `dir`.
    #[must_use]
    pub fn with_attachments(mut self, dir: Utf8PathBuf) -> Self {
        self.attachments = AttachmentLog::new(Some(dir));
        self
    }

    /// Evaluation policy.
    #[must_use]
    pub const fn options(&self) -> EvalOptions {
        self.options
    }

    /// Attribute scopes.
    #[must_use]
    pub const fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    /// Mutable attribute scopes.
    pub const fn scopes_mut(&mut self) -> &mut ScopeStack {
        &mut self.scopes
    }

    /// Registered StepDefs.
    #[must_use]
    pub const fn registry(&self) -> &StepDefRegistry {
        &self.registry
    }

    /// Meta files loaded so far.
    #[must_use]
    pub const fn loaded_metas(&self) -> &LoadedMetas {
        &self.loaded
    }

    /// Attachment log.
    #[must_use]
    pub const fn attachments(&self) -> &AttachmentLog {
        &self.attachments
    }

    /// Settings consulted for unbound names.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Look `name` up in the scopes, falling back to settings.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Unbound`] when neither binds the name.
    pub fn get_attribute(&self, name: &str) -> Result<&str, ScopeError> {
        self.scopes
            .get_opt(name)
            .or_else(|| self.settings.get_opt(name))
            .ok_or_else(|| ScopeError::Unbound {
                name: name.to_owned(),
            })
    }

    /// Clear attribute state between runs.
    ///
    /// Registered StepDefs and loaded meta files are kept, matching the
    /// rule that a meta file is loaded once per context.
    pub fn reset(&mut self) {
        self.scopes.reset();
        self.call_stack.clear();
    }

    /// Evaluate a normalised feature: load its meta files, then run its
    /// scenarios in order under the fail-fast policy.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] for ambiguous steps, invalid StepDefs, infinite
    /// StepDef recursion, or a meta file that fails to load.
    pub fn evaluate_feature(&mut self, spec: &FeatureSpec) -> Result<FeatureResult, EvalError> {
        feature::evaluate_feature(self, spec)
    }

    /// Normalise `spec` with `loader` and evaluate the result.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] when normalisation or evaluation fails.
    pub fn load_and_evaluate(
        &mut self,
        loader: &dyn AstLoader,
        spec: &FeatureSpec,
        data: Option<&DataRecord>,
    ) -> Result<FeatureResult, EvalError> {
        let normalized = Normalizer::new(loader, &self.loaded).normalize(spec, data)?;
        self.evaluate_feature(&normalized)
    }
}
