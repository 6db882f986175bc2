//! Feature specification structures.
//!
//! These types describe a parsed feature: its background, scenarios, steps,
//! tags and examples tables. They are produced by an external Gherkin parser
//! (or read from a pre-parsed YAML document) and are rewritten, never mutated
//! in place, by normalisation and evaluation. Every evaluation step returns a
//! new node carrying its status so earlier values stay intact for reporting.
//!
//! ```rust
//! use stepwise::ast::FeatureSpec;
//!
//! let yaml = "feature:\n  name: Greeting\nscenarios:\n  - name: Hello\n    steps:\n      - keyword: Given\n        expression: greeting is \"hello\"";
//! let spec: FeatureSpec = serde_saphyr::from_str(yaml).expect("parse");
//! assert_eq!(spec.scenarios.len(), 1);
//! assert_eq!(spec.scenarios[0].steps[0].to_string(), "Given greeting is \"hello\"");
//! ```

mod error;
mod tag;

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::status::{self, EvalStatus};

pub use error::TagError;
pub use tag::Tag;

/// File extension of meta files whose scenarios are all StepDefs.
pub const META_EXTENSION: &str = "meta";
/// File extension of executable feature files.
pub const FEATURE_EXTENSION: &str = "feature";

/// Source position of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// One-based line number.
    pub line: usize,
    /// One-based column number.
    pub column: usize,
}

/// Gherkin step keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKeyword {
    /// `Given`
    Given,
    /// `When`
    When,
    /// `Then`
    Then,
    /// `And`
    And,
    /// `But`
    But,
}

impl StepKeyword {
    /// All keywords in declaration order.
    pub const ALL: [Self; 5] = [Self::Given, Self::When, Self::Then, Self::And, Self::But];

    /// Keyword text as written in a feature file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::And => "And",
            Self::But => "But",
        }
    }
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named file produced while evaluating a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Human-readable attachment name.
    pub name: String,
    /// Location of the attachment on disk.
    pub file: Utf8PathBuf,
}

/// A single step of a scenario or background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Step keyword.
    pub keyword: StepKeyword,
    /// Step text following the keyword.
    pub expression: String,
    /// Source position.
    #[serde(default)]
    pub pos: Position,
    /// Optional data table, one vector of cells per row.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub table: Vec<Vec<String>>,
    /// Evaluation status; `Pending` until evaluated.
    #[serde(default)]
    pub status: EvalStatus,
    /// Files attached while evaluating this step.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// Evaluated StepDef body when the step was dispatched to a StepDef.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stepdef: Option<Box<Scenario>>,
}

impl Step {
    /// Create an unevaluated step.
    #[must_use]
    pub fn new(keyword: StepKeyword, expression: impl Into<String>) -> Self {
        Self {
            keyword,
            expression: expression.into(),
            pos: Position::default(),
            table: Vec::new(),
            status: EvalStatus::Pending,
            attachments: Vec::new(),
            stepdef: None,
        }
    }

    /// Return a copy of this step carrying `status`.
    #[must_use]
    pub fn with_status(&self, status: EvalStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.keyword, self.expression)
    }
}

/// Steps implicitly run before every scenario of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    /// Background name.
    #[serde(default)]
    pub name: String,
    /// Free-form description lines.
    #[serde(default)]
    pub description: Vec<String>,
    /// Ordered background steps.
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Background {
    /// Aggregate status of the background steps.
    #[must_use]
    pub fn status(&self) -> EvalStatus {
        status::fold(self.steps.iter().map(|step| &step.status))
    }

    fn with_steps_marked(&self, status: &EvalStatus) -> Self {
        Self {
            steps: mark_all(&self.steps, status),
            ..self.clone()
        }
    }
}

/// One row of an examples table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Line the row was read from.
    #[serde(default)]
    pub line: usize,
    /// Ordered cell values.
    pub cells: Vec<String>,
}

impl Row {
    /// Build a row from cell values.
    #[must_use]
    pub fn new(line: usize, cells: Vec<String>) -> Self {
        Self { line, cells }
    }
}

/// An examples table attached to a scenario outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Examples {
    /// Examples block name.
    #[serde(default)]
    pub name: String,
    /// Free-form description lines.
    #[serde(default)]
    pub description: Vec<String>,
    /// Table rows; the first row holds placeholder names.
    #[serde(default)]
    pub table: Vec<Row>,
    /// Scenarios generated from this block by outline expansion.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenarios: Vec<Scenario>,
}

impl Examples {
    /// Header row naming each column.
    #[must_use]
    pub fn header(&self) -> Option<&Row> {
        self.table.first()
    }

    /// Data rows following the header.
    pub fn data_rows(&self) -> impl Iterator<Item = &Row> {
        self.table.iter().skip(1)
    }
}

/// A scenario, scenario outline, or StepDef template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Tags attached to the scenario.
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Scenario name; the match pattern for StepDefs.
    pub name: String,
    /// Free-form description lines.
    #[serde(default)]
    pub description: Vec<String>,
    /// Background attached during normalisation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,
    /// Ordered steps.
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Whether this scenario is an outline awaiting expansion.
    #[serde(default)]
    pub is_outline: bool,
    /// Examples blocks of an outline.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Examples>,
    /// Meta file that declared this scenario, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_file: Option<Utf8PathBuf>,
    /// Source position.
    #[serde(default)]
    pub pos: Position,
}

impl Scenario {
    /// Create a plain scenario with the given steps.
    #[must_use]
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            tags: Vec::new(),
            name: name.into(),
            description: Vec::new(),
            background: None,
            steps,
            is_outline: false,
            examples: Vec::new(),
            meta_file: None,
            pos: Position::default(),
        }
    }

    /// Whether the scenario is a callable StepDef template.
    #[must_use]
    pub fn is_stepdef(&self) -> bool {
        self.tags.contains(&Tag::StepDef)
    }

    /// Whether the scenario is tagged `@Ignore`.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.tags.contains(&Tag::Ignore)
    }

    /// Background steps followed by the scenario's own steps.
    pub fn all_steps(&self) -> impl Iterator<Item = &Step> {
        self.background
            .iter()
            .flat_map(|bg| bg.steps.iter())
            .chain(self.steps.iter())
    }

    /// Aggregate status of the background and scenario steps.
    #[must_use]
    pub fn status(&self) -> EvalStatus {
        status::fold(self.all_steps().map(|step| &step.status))
    }

    /// Copy of the scenario with every step (background included) marked
    /// `status` without being evaluated.
    #[must_use]
    pub fn with_steps_marked(&self, status: &EvalStatus) -> Self {
        Self {
            background: self
                .background
                .as_ref()
                .map(|bg| bg.with_steps_marked(status)),
            steps: mark_all(&self.steps, status),
            ..self.clone()
        }
    }
}

fn mark_all(steps: &[Step], status: &EvalStatus) -> Vec<Step> {
    steps.iter().map(|step| step.with_status(status.clone())).collect()
}

/// Feature-level header information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// Feature name.
    pub name: String,
    /// Free-form description lines.
    #[serde(default)]
    pub description: Vec<String>,
    /// Feature tags, including `@Import` directives before normalisation.
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// A complete feature specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    /// Feature header.
    pub feature: Feature,
    /// Feature background.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,
    /// Ordered scenarios.
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    /// File the feature was loaded from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<Utf8PathBuf>,
    /// Meta files this feature depends on, in load order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metas: Vec<FeatureSpec>,
}

impl FeatureSpec {
    /// Create a feature with the given scenarios.
    #[must_use]
    pub fn new(name: impl Into<String>, scenarios: Vec<Scenario>) -> Self {
        Self {
            feature: Feature {
                name: name.into(),
                ..Feature::default()
            },
            scenarios,
            ..Self::default()
        }
    }

    /// Whether the feature was loaded from a meta file.
    #[must_use]
    pub fn is_meta(&self) -> bool {
        self.file
            .as_deref()
            .and_then(Utf8Path::extension)
            .is_some_and(|ext| ext == META_EXTENSION)
    }

    /// Directory against which relative import and CSV paths resolve.
    #[must_use]
    pub fn base_dir(&self) -> &Utf8Path {
        self.file
            .as_deref()
            .and_then(Utf8Path::parent)
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."))
    }

    /// Aggregate status of all scenarios.
    #[must_use]
    pub fn status(&self) -> EvalStatus {
        status::fold(self.scenarios.iter().map(Scenario::status))
    }

    /// Display label used in logs.
    #[must_use]
    pub fn label(&self) -> String {
        self.file
            .as_ref()
            .map_or_else(|| self.feature.name.clone(), ToString::to_string)
    }
}
