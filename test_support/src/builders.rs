//! Terse constructors for feature ASTs.

use stepwise::ast::{Examples, FeatureSpec, Row, Scenario, Step, StepKeyword, Tag};

/// `Given <text>`
#[must_use]
pub fn given(text: &str) -> Step {
    Step::new(StepKeyword::Given, text)
}

/// `When <text>`
#[must_use]
pub fn when(text: &str) -> Step {
    Step::new(StepKeyword::When, text)
}

/// `Then <text>`
#[must_use]
pub fn then(text: &str) -> Step {
    Step::new(StepKeyword::Then, text)
}

/// `And <text>`
#[must_use]
pub fn and(text: &str) -> Step {
    Step::new(StepKeyword::And, text)
}

/// A plain scenario.
#[must_use]
pub fn scenario(name: &str, steps: Vec<Step>) -> Scenario {
    Scenario::new(name, steps)
}

/// A scenario tagged `@StepDef`.
#[must_use]
pub fn stepdef(name: &str, steps: Vec<Step>) -> Scenario {
    let mut scenario = Scenario::new(name, steps);
    scenario.tags.push(Tag::StepDef);
    scenario
}

/// A scenario outline with the given examples blocks.
#[must_use]
pub fn outline(name: &str, steps: Vec<Step>, blocks: Vec<Examples>) -> Scenario {
    let mut scenario = Scenario::new(name, steps);
    scenario.is_outline = true;
    scenario.examples = blocks;
    scenario
}

/// An examples block; the first row is the header.
#[must_use]
pub fn examples(name: &str, rows: &[&[&str]]) -> Examples {
    Examples {
        name: name.to_owned(),
        description: Vec::new(),
        table: rows
            .iter()
            .enumerate()
            .map(|(index, cells)| {
                Row::new(index + 1, cells.iter().map(|cell| (*cell).to_owned()).collect())
            })
            .collect(),
        scenarios: Vec::new(),
    }
}

/// A feature holding `scenarios`.
#[must_use]
pub fn feature(name: &str, scenarios: Vec<Scenario>) -> FeatureSpec {
    FeatureSpec::new(name, scenarios)
}
