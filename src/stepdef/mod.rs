//! StepDef registry and step text resolution.
//!
//! A StepDef is a scenario tagged `@StepDef` whose name is the text it
//! answers to. Names may carry `<placeholder>` tokens, in which case the
//! matching step text supplies the placeholder values.
//!
//! Resolution first tries an exact lookup of the step text. Failing that,
//! every parameterised StepDef is matched with [`match_template`]; exactly
//! one survivor resolves the step, more than one is an ambiguity error.
//!
//! ```rust
//! use stepwise::ast::{Scenario, Tag};
//! use stepwise::stepdef::StepDefRegistry;
//!
//! let mut registry = StepDefRegistry::new();
//! let mut stepdef = Scenario::new("I greet <name>", Vec::new());
//! stepdef.tags.push(Tag::StepDef);
//! registry.add(stepdef).expect("register");
//!
//! let found = registry.resolve("I greet ada").expect("unambiguous").expect("match");
//! assert_eq!(found.stepdef.name, "I greet <name>");
//! assert_eq!(found.params, vec![("name".to_owned(), "ada".to_owned())]);
//! ```

mod error;
mod template;

use indexmap::IndexMap;

use crate::ast::{Scenario, StepKeyword, Tag};

pub use error::StepDefError;
pub use template::{check_placeholders, match_template, placeholders, substitute};

/// A resolved StepDef together with its placeholder bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct StepDefMatch<'a> {
    /// The matched StepDef.
    pub stepdef: &'a Scenario,
    /// Placeholder bindings in declaration order; empty for exact matches.
    pub params: Vec<(String, String)>,
}

/// Name-keyed StepDef storage owned by one evaluation context.
#[derive(Debug, Clone, Default)]
pub struct StepDefRegistry {
    stepdefs: IndexMap<String, Scenario>,
}

impl StepDefRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a StepDef under its literal name.
    ///
    /// Re-registering a name replaces the body; provenance tags of the
    /// previous registration are kept after the new tags.
    ///
    /// # Errors
    ///
    /// Returns [`StepDefError::KeywordName`] when the name starts with a step
    /// keyword and [`StepDefError::DuplicatePlaceholder`] when it repeats a
    /// placeholder.
    pub fn add(&mut self, mut stepdef: Scenario) -> Result<(), StepDefError> {
        if let Some(keyword) = leading_keyword(&stepdef.name) {
            return Err(StepDefError::KeywordName {
                name: stepdef.name,
                keyword: keyword.as_str(),
            });
        }
        check_placeholders(&stepdef.name)?;
        if !stepdef.is_stepdef() {
            stepdef.tags.insert(0, Tag::StepDef);
        }
        if let Some(previous) = self.stepdefs.get(&stepdef.name) {
            tracing::debug!(stepdef = %stepdef.name, "replacing StepDef");
            let inherited: Vec<Tag> = previous
                .tags
                .iter()
                .filter(|tag| matches!(tag, Tag::Meta(_)) && !stepdef.tags.contains(tag))
                .cloned()
                .collect();
            stepdef.tags.extend(inherited);
        }
        self.stepdefs.insert(stepdef.name.clone(), stepdef);
        Ok(())
    }

    /// StepDef registered under exactly `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.stepdefs.get(name)
    }

    /// Resolve step text to a StepDef.
    ///
    /// Returns `Ok(None)` when no StepDef applies, so callers can fall back
    /// to a literal action.
    ///
    /// # Errors
    ///
    /// Returns [`StepDefError::Ambiguous`] when several parameterised
    /// StepDefs match.
    pub fn resolve(&self, expression: &str) -> Result<Option<StepDefMatch<'_>>, StepDefError> {
        if let Some(stepdef) = self.stepdefs.get(expression) {
            return Ok(Some(StepDefMatch {
                stepdef,
                params: Vec::new(),
            }));
        }
        let mut matches = Vec::new();
        for (name, stepdef) in &self.stepdefs {
            if let Some(params) = match_template(name, expression)? {
                matches.push(StepDefMatch { stepdef, params });
            }
        }
        if matches.len() > 1 {
            return Err(StepDefError::Ambiguous {
                expression: expression.to_owned(),
                candidates: matches.iter().map(|m| m.stepdef.name.clone()).collect(),
            });
        }
        Ok(matches.pop())
    }

    /// Registered names in first-registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stepdefs.keys().map(String::as_str)
    }

    /// Number of registered StepDefs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stepdefs.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stepdefs.is_empty()
    }

    /// Forget every StepDef.
    pub fn clear(&mut self) {
        self.stepdefs.clear();
    }
}

fn leading_keyword(name: &str) -> Option<StepKeyword> {
    let first = name.split_whitespace().next()?;
    StepKeyword::ALL
        .into_iter()
        .find(|keyword| keyword.as_str() == first)
}
