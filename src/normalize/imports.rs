//! Meta import resolution.
//!
//! Walks the `@Import` graph depth first, keeping the chain of files being
//! imported on a stack. An import that points back into the chain is a
//! recursive import; the walk is also depth-limited so a pathological graph
//! is reported the same way instead of exhausting the stack.

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};

use crate::ast::{FeatureSpec, META_EXTENSION, Tag};

use super::{AstLoader, NormalizeError};

/// Maximum nesting of meta imports.
pub const MAX_IMPORT_DEPTH: usize = 32;

/// Canonical paths of meta files already loaded by an evaluation context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedMetas {
    paths: HashSet<Utf8PathBuf>,
}

impl LoadedMetas {
    /// Whether `path` was already loaded.
    #[must_use]
    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.paths.contains(path)
    }

    /// Record `path` as loaded; returns `false` if it already was.
    pub fn insert(&mut self, path: Utf8PathBuf) -> bool {
        self.paths.insert(path)
    }

    /// Number of loaded meta files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no meta file was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Forget every loaded path.
    pub fn clear(&mut self) {
        self.paths.clear();
    }
}

pub(super) struct ImportResolver<'a> {
    loader: &'a dyn AstLoader,
    loaded: &'a LoadedMetas,
    chain: Vec<Utf8PathBuf>,
    seen: HashSet<Utf8PathBuf>,
    resolved: Vec<FeatureSpec>,
}

impl<'a> ImportResolver<'a> {
    pub(super) fn new(loader: &'a dyn AstLoader, loaded: &'a LoadedMetas) -> Self {
        Self {
            loader,
            loaded,
            chain: Vec::new(),
            seen: HashSet::new(),
            resolved: Vec::new(),
        }
    }

    /// Resolve every import reachable from `spec`, returning the imported
    /// meta specs with dependencies before dependants.
    pub(super) fn resolve(mut self, spec: &FeatureSpec) -> Result<Vec<FeatureSpec>, NormalizeError> {
        let root = spec
            .file
            .as_deref()
            .map_or_else(|| Utf8PathBuf::from("<memory>"), canonical_or_self);
        self.chain.push(root);
        self.visit(spec)?;
        Ok(self.resolved)
    }

    fn visit(&mut self, spec: &FeatureSpec) -> Result<(), NormalizeError> {
        let importer = self.chain.last().cloned().unwrap_or_default();
        for tag in &spec.feature.tags {
            let Some(path) = tag.import_path() else {
                continue;
            };
            let target = validate_import(spec.base_dir(), path)?;
            if self.chain.contains(&target) || self.chain.len() > MAX_IMPORT_DEPTH {
                return Err(NormalizeError::RecursiveImport {
                    importer,
                    imported: target,
                });
            }
            if self.loaded.contains(&target) || self.seen.contains(&target) {
                tracing::debug!(meta = %target, "meta already loaded");
                continue;
            }
            let mut meta = self.loader.load(&target)?;
            meta.file.get_or_insert_with(|| target.clone());
            self.chain.push(target.clone());
            self.visit(&meta)?;
            self.chain.pop();
            self.seen.insert(target);
            self.resolved.push(meta);
        }
        Ok(())
    }
}

fn validate_import(base: &Utf8Path, path: &Utf8Path) -> Result<Utf8PathBuf, NormalizeError> {
    let joined = base.join(path);
    if joined.extension() != Some(META_EXTENSION) {
        return Err(NormalizeError::UnsupportedImport { path: joined });
    }
    if !joined.is_file() {
        return Err(NormalizeError::MissingImport { path: joined });
    }
    joined
        .canonicalize_utf8()
        .map_err(|source| NormalizeError::Read {
            path: joined,
            source,
        })
}

fn canonical_or_self(path: &Utf8Path) -> Utf8PathBuf {
    path.canonicalize_utf8().unwrap_or_else(|_| path.to_owned())
}

/// Remove `@Import` tags once their targets are resolved.
pub(super) fn strip_imports(tags: &[Tag]) -> Vec<Tag> {
    tags.iter()
        .filter(|tag| tag.import_path().is_none())
        .cloned()
        .collect()
}
