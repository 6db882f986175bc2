//! Structural normalisation of parsed features.
//!
//! The [`Normalizer`] turns a parsed [`FeatureSpec`] into the flat form the
//! evaluator walks: imported meta files are resolved and classified,
//! scenario outlines are expanded into concrete scenarios, the feature
//! background is attached to every executable scenario, and an optional
//! data record is bound by a synthetic leading scenario. Normalisation is a
//! pure function of its inputs apart from the file reads needed to follow
//! imports and CSV sources.

mod data;
mod error;
mod imports;
mod loader;
mod outline;

use crate::ast::{FeatureSpec, Scenario, Tag};

pub use data::{
    CSV_EXTENSION, DATA_BINDER_NAME, DataRecord, binder_scenario, load_examples, load_records,
};
pub use error::NormalizeError;
pub use imports::{LoadedMetas, MAX_IMPORT_DEPTH};
pub use loader::{AstLoader, YamlAstLoader};
pub use outline::expand as expand_outline;

use imports::{ImportResolver, strip_imports};

/// Rewrites parsed features into their evaluable form.
#[derive(Clone, Copy)]
pub struct Normalizer<'a> {
    loader: &'a dyn AstLoader,
    loaded: &'a LoadedMetas,
}

impl<'a> Normalizer<'a> {
    /// Create a normaliser that loads imports through `loader` and skips
    /// meta files already present in `loaded`.
    #[must_use]
    pub fn new(loader: &'a dyn AstLoader, loaded: &'a LoadedMetas) -> Self {
        Self { loader, loaded }
    }

    /// Normalise `spec`, optionally binding one data record.
    ///
    /// The result carries no outlines and no `@Import` tags. Imported meta
    /// files are returned in `metas`, dependencies first, each already
    /// normalised and classified.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError`] for invalid or recursive imports, invalid
    /// examples sources, or `@Examples` on a plain scenario.
    pub fn normalize(
        &self,
        spec: &FeatureSpec,
        data: Option<&DataRecord>,
    ) -> Result<FeatureSpec, NormalizeError> {
        let metas = ImportResolver::new(self.loader, self.loaded)
            .resolve(spec)?
            .iter()
            .map(normalize_body)
            .collect::<Result<Vec<_>, _>>()?;

        let mut normalized = normalize_body(spec)?;
        if let Some(record) = data {
            tracing::debug!(
                feature = %spec.label(),
                data = %record.file,
                record = record.record,
                "binding data record"
            );
            normalized.scenarios.insert(0, binder_scenario(record));
        }
        normalized.metas = metas;
        Ok(normalized)
    }
}

/// Classify, expand, and attach backgrounds for a single file.
fn normalize_body(spec: &FeatureSpec) -> Result<FeatureSpec, NormalizeError> {
    let is_meta = spec.is_meta();
    let base_dir = spec.base_dir();
    let mut expanded = Vec::with_capacity(spec.scenarios.len());
    for source in &spec.scenarios {
        let scenario = if is_meta {
            classify_meta(source, spec)
        } else {
            source.clone()
        };
        if scenario.is_outline {
            let (_, generated) = outline::expand(&scenario, base_dir)?;
            expanded.extend(generated);
        } else if scenario.tags.iter().any(|tag| tag.examples_path().is_some()) {
            return Err(NormalizeError::ExamplesOnScenario {
                scenario: scenario.name,
            });
        } else {
            expanded.push(scenario);
        }
    }

    let background = if is_meta {
        None
    } else {
        spec.background.clone()
    };
    let scenarios = expanded
        .into_iter()
        .map(|scenario| {
            if scenario.is_stepdef() || scenario.background.is_some() {
                scenario
            } else {
                Scenario {
                    background: background.clone(),
                    ..scenario
                }
            }
        })
        .collect();

    let mut feature = spec.feature.clone();
    feature.tags = strip_imports(&feature.tags);
    Ok(FeatureSpec {
        feature,
        background,
        scenarios,
        file: spec.file.clone(),
        metas: Vec::new(),
    })
}

/// Treat a meta file scenario as a StepDef owned by that file.
fn classify_meta(scenario: &Scenario, meta: &FeatureSpec) -> Scenario {
    let mut tags = scenario.tags.clone();
    if !tags.contains(&Tag::StepDef) {
        tags.push(Tag::StepDef);
    }
    if let Some(file) = &meta.file {
        tags.push(Tag::Meta(file.clone()));
    }
    Scenario {
        tags,
        background: None,
        meta_file: meta.file.clone(),
        ..scenario.clone()
    }
}
