//! Test utilities shared by the integration tests.
//!
//! Provides terse builders for feature ASTs, an action double that records
//! what it was asked to perform, and helpers for writing fixture files.

pub mod action;
pub mod builders;

pub use action::RecordingAction;
pub use builders::{and, examples, feature, given, outline, scenario, stepdef, then, when};

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// Create a temporary directory with a UTF-8 path.
///
/// # Errors
///
/// Returns an error when the directory cannot be created or its path is not
/// valid UTF-8.
pub fn utf8_temp_dir() -> Result<(TempDir, Utf8PathBuf)> {
    let dir = TempDir::new().context("create temp dir")?;
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .map_err(|path| anyhow::anyhow!("temp dir is not UTF-8: {}", path.display()))?;
    Ok((dir, path))
}

/// Write `content` to `dir/name`, creating parent directories.
///
/// # Errors
///
/// Returns an error when the file cannot be written.
pub fn write_file(dir: &Utf8Path, name: &str, content: &str) -> Result<Utf8PathBuf> {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
    }
    fs::write(&path, content).with_context(|| format!("write {path}"))?;
    Ok(path)
}
