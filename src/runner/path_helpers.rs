//! Path resolution helpers for the runner module.
//!
//! Centralises feature discovery so the main runner module stays focused on
//! scheduling evaluations.

use camino::{Utf8Path, Utf8PathBuf};
use std::path::Path;
use walkdir::WalkDir;

use crate::ast::FEATURE_EXTENSION;

use super::RunnerError;

/// Convert a command-line path to UTF-8.
pub(super) fn utf8_path(path: &Path) -> Result<Utf8PathBuf, RunnerError> {
    Utf8PathBuf::from_path_buf(path.to_path_buf())
        .map_err(|non_utf8| RunnerError::NonUtf8Path { path: non_utf8 })
}

/// Expand files and directories into the ordered list of feature files.
///
/// Files named explicitly are kept whatever their extension; directories
/// are searched recursively for `.feature` files in file-name order.
pub(super) fn discover_features(paths: &[Utf8PathBuf]) -> Result<Vec<Utf8PathBuf>, RunnerError> {
    let mut features = Vec::new();
    for path in paths {
        if path.is_file() {
            features.push(path.clone());
        } else if path.is_dir() {
            features.extend(walk_features(path));
        } else {
            return Err(RunnerError::PathNotFound { path: path.clone() });
        }
    }
    if features.is_empty() {
        return Err(RunnerError::NoFeatures);
    }
    Ok(features)
}

fn walk_features(dir: &Utf8Path) -> impl Iterator<Item = Utf8PathBuf> {
    WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |walked| match walked {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(dir = %dir, error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| Utf8PathBuf::from_path_buf(entry.into_path()).ok())
        .filter(|path| path.extension() == Some(FEATURE_EXTENSION))
}

/// Attachment directory for one job, unique within the run.
pub(super) fn job_attachment_dir(root: &Utf8Path, index: usize, feature: &Utf8Path) -> Utf8PathBuf {
    let stem = feature.file_stem().unwrap_or("feature");
    root.join(format!("{:03}-{stem}", index + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    #[rstest]
    fn directories_yield_nested_features_in_name_order() {
        let tmp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path");
        fs::create_dir_all(root.join("nested")).expect("create nested dir");
        for name in ["b.feature", "a.feature", "notes.txt", "nested/c.feature"] {
            fs::write(root.join(name), "feature: {}").expect("write file");
        }

        let features = discover_features(std::slice::from_ref(&root)).expect("discover");
        let names: Vec<&str> = features
            .iter()
            .filter_map(|path| path.strip_prefix(&root).ok())
            .map(Utf8Path::as_str)
            .collect();
        assert_eq!(names, vec!["a.feature", "b.feature", "nested/c.feature"]);
    }

    #[rstest]
    fn empty_directories_have_no_features() {
        let tmp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path");
        let err = discover_features(&[root]).expect_err("no features");
        assert!(matches!(err, RunnerError::NoFeatures), "{err}");
    }

    #[rstest]
    #[case(0, "features/login.feature", "001-login")]
    #[case(11, "checkout.feature", "012-checkout")]
    fn job_directories_are_numbered(
        #[case] index: usize,
        #[case] feature: &str,
        #[case] expected: &str,
    ) {
        let dir = job_attachment_dir(Utf8Path::new("out"), index, Utf8Path::new(feature));
        assert_eq!(dir, Utf8Path::new("out").join(expected));
    }
}
