//! Property settings consulted when a name is unbound in every scope.
//!
//! Settings are read from YAML documents. Nested maps flatten to dotted
//! names and sequences to indexed names, so
//!
//! ```yaml
//! env:
//!   base_url: https://example.test
//!   users: [ada, grace]
//! ```
//!
//! yields `env.base_url`, `env.users.0` and `env.users.1`. Later documents
//! override earlier ones.

mod error;

use std::fs;

use camino::Utf8Path;
use indexmap::IndexMap;
use serde_json::Value;

pub use error::SettingsError;

/// Ordered property map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    props: IndexMap<String, String>,
}

impl Settings {
    /// Create empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from YAML text; `origin` labels errors.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] for invalid YAML and
    /// [`SettingsError::NotAMap`] when the root is not a mapping.
    pub fn from_yaml_str(yaml: &str, origin: &Utf8Path) -> Result<Self, SettingsError> {
        let doc: Value = serde_saphyr::from_str(yaml).map_err(|e| SettingsError::Parse {
            path: origin.to_owned(),
            message: e.to_string(),
        })?;
        let mut settings = Self::new();
        match doc {
            Value::Object(map) => {
                for (key, value) in map {
                    settings.flatten_into(key, value);
                }
                Ok(settings)
            }
            Value::Null => Ok(settings),
            _ => Err(SettingsError::NotAMap {
                path: origin.to_owned(),
            }),
        }
    }

    /// Load settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load(path: &Utf8Path) -> Result<Self, SettingsError> {
        let yaml = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_yaml_str(&yaml, path)
    }

    /// Load and merge several files; later files override earlier ones.
    ///
    /// # Errors
    ///
    /// Returns the first load failure.
    pub fn load_all<P: AsRef<Utf8Path>>(paths: &[P]) -> Result<Self, SettingsError> {
        let mut merged = Self::new();
        for path in paths {
            merged.merge(Self::load(path.as_ref())?);
            tracing::debug!(path = %path.as_ref(), "loaded settings");
        }
        Ok(merged)
    }

    /// Override this map with every entry of `other`.
    pub fn merge(&mut self, other: Self) {
        self.props.extend(other.props);
    }

    /// Set a single property.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.props.insert(name.into(), value.into());
    }

    /// Value of `name`, if set.
    #[must_use]
    pub fn get_opt(&self, name: &str) -> Option<&str> {
        self.props.get(name).map(String::as_str)
    }

    /// Value of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when `name` is not set.
    pub fn get(&self, name: &str) -> Result<&str, SettingsError> {
        self.get_opt(name).ok_or_else(|| SettingsError::Missing {
            name: name.to_owned(),
        })
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.props.len()
    }

    /// Whether no properties are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    fn flatten_into(&mut self, prefix: String, value: Value) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    self.flatten_into(format!("{prefix}.{key}"), child);
                }
            }
            Value::Array(items) => {
                for (index, child) in items.into_iter().enumerate() {
                    self.flatten_into(format!("{prefix}.{index}"), child);
                }
            }
            Value::String(text) => self.set(prefix, text),
            Value::Null => self.set(prefix, ""),
            other => self.set(prefix, other.to_string()),
        }
    }
}
