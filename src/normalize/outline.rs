//! Scenario outline expansion.

use camino::Utf8Path;

use crate::ast::{Examples, Scenario, Step, Tag};
use crate::stepdef::substitute;

use super::{NormalizeError, data};

/// Expand `outline` into one scenario per examples row.
///
/// # Errors
///
/// Returns an error when a CSV source cannot be loaded or a row's width
/// differs from its header's.
///
/// Inline examples blocks come first, followed by CSV-sourced blocks in tag
/// order. Scenarios are generated in block order, then row order. The
/// returned outline keeps its examples with the generated scenarios filled
/// in, for reporting. Relative CSV paths resolve against `base_dir`.
pub fn expand(
    outline: &Scenario,
    base_dir: &Utf8Path,
) -> Result<(Scenario, Vec<Scenario>), NormalizeError> {
    let mut blocks = outline.examples.clone();
    for path in outline.tags.iter().filter_map(Tag::examples_path) {
        blocks.push(data::load_examples(&base_dir.join(path))?);
    }

    let mut generated = Vec::new();
    let mut expanded_blocks = Vec::with_capacity(blocks.len());
    for (block_no, block) in blocks.into_iter().enumerate() {
        let scenarios = expand_block(outline, &block, block_no + 1)?;
        generated.extend(scenarios.iter().cloned());
        expanded_blocks.push(Examples { scenarios, ..block });
    }
    tracing::debug!(
        outline = %outline.name,
        scenarios = generated.len(),
        "expanded scenario outline"
    );
    let expanded_outline = Scenario {
        examples: expanded_blocks,
        ..outline.clone()
    };
    Ok((expanded_outline, generated))
}

fn expand_block(
    outline: &Scenario,
    block: &Examples,
    block_no: usize,
) -> Result<Vec<Scenario>, NormalizeError> {
    let Some(header) = block.header() else {
        return Ok(Vec::new());
    };
    block
        .data_rows()
        .enumerate()
        .map(|(row_index, row)| {
            if row.cells.len() != header.cells.len() {
                return Err(NormalizeError::ExamplesShape {
                    examples: block.name.clone(),
                    line: row.line,
                    expected: header.cells.len(),
                    found: row.cells.len(),
                });
            }
            let params: Vec<(String, String)> = header
                .cells
                .iter()
                .cloned()
                .zip(row.cells.iter().cloned())
                .collect();
            let name = format!(
                "{} -- Example {block_no}.{} {}",
                substitute(&outline.name, &params),
                row_index + 1,
                block.name
            );
            Ok(Scenario {
                tags: outline
                    .tags
                    .iter()
                    .filter(|tag| tag.examples_path().is_none())
                    .cloned()
                    .collect(),
                name: name.trim_end().to_owned(),
                description: outline
                    .description
                    .iter()
                    .map(|line| substitute(line, &params))
                    .collect(),
                steps: outline
                    .steps
                    .iter()
                    .map(|step| substitute_step(step, &params))
                    .collect(),
                is_outline: false,
                examples: Vec::new(),
                ..outline.clone()
            })
        })
        .collect()
}

fn substitute_step(step: &Step, params: &[(String, String)]) -> Step {
    Step {
        expression: substitute(&step.expression, params),
        table: step
            .table
            .iter()
            .map(|row| row.iter().map(|cell| substitute(cell, params)).collect())
            .collect(),
        ..step.clone()
    }
}
