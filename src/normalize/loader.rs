//! Loading pre-parsed feature ASTs.

use std::fs;

use camino::Utf8Path;

use crate::ast::FeatureSpec;

use super::NormalizeError;

/// Supplies parsed feature ASTs for a path.
///
/// Implementations stand in for the Gherkin parser; the normaliser uses
/// one to load imported meta files.
pub trait AstLoader: Sync {
    /// Load the feature stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError`] when the file cannot be read or parsed.
    fn load(&self, path: &Utf8Path) -> Result<FeatureSpec, NormalizeError>;
}

/// Reads feature ASTs serialised as YAML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlAstLoader;

impl YamlAstLoader {
    /// Parse a YAML AST document, recording `path` as its origin.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::Parse`] when the document is invalid.
    pub fn parse(yaml: &str, path: &Utf8Path) -> Result<FeatureSpec, NormalizeError> {
        let mut spec: FeatureSpec =
            serde_saphyr::from_str(yaml).map_err(|e| NormalizeError::Parse {
                path: path.to_owned(),
                message: e.to_string(),
            })?;
        spec.file = Some(path.to_owned());
        Ok(spec)
    }
}

impl AstLoader for YamlAstLoader {
    fn load(&self, path: &Utf8Path) -> Result<FeatureSpec, NormalizeError> {
        let yaml = fs::read_to_string(path).map_err(|source| NormalizeError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&yaml, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Tag;
    use rstest::rstest;

    #[rstest]
    fn parses_tags_eagerly() {
        let yaml = "feature:\n  name: F\n  tags: ['@Import(\"common.meta\")']\n";
        let spec = YamlAstLoader::parse(yaml, Utf8Path::new("f.feature")).expect("parse");
        assert_eq!(spec.feature.tags, vec![Tag::Import("common.meta".into())]);
        assert_eq!(spec.file.as_deref(), Some(Utf8Path::new("f.feature")));
    }

    #[rstest]
    fn malformed_tags_fail_loading() {
        let yaml = "feature:\n  name: F\n  tags: ['@Import(common.meta)']\n";
        let err = YamlAstLoader::parse(yaml, Utf8Path::new("f.feature"))
            .expect_err("malformed tag");
        assert!(matches!(err, NormalizeError::Parse { .. }), "{err}");
    }
}
