//! Tag annotations attached to features and scenarios.
//!
//! Tags are free-form names, but a handful carry structured arguments that
//! drive normalisation and evaluation. Recognised tags are validated eagerly:
//! `@Import` without a quoted path is an error rather than a custom tag.
//!
//! ```rust
//! use stepwise::ast::Tag;
//!
//! let tag = Tag::parse("@Import(\"common.meta\")").expect("valid tag");
//! assert_eq!(tag, Tag::Import("common.meta".into()));
//! assert_eq!(tag.to_string(), "@Import(\"common.meta\")");
//! ```

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use super::error::TagError;

/// A parsed tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Tag {
    /// `@Import("path.meta")`: load a meta file before the feature runs.
    Import(Utf8PathBuf),
    /// `@Examples("rows.csv")`: source outline examples from a CSV file.
    Examples(Utf8PathBuf),
    /// `@Data(file="rows.csv", record=2)`: provenance of a data-bound scenario.
    Data {
        /// CSV file the record came from.
        file: Utf8PathBuf,
        /// One-based record number within the file.
        record: usize,
    },
    /// `@StepDef`: the scenario is a callable template.
    StepDef,
    /// `@Meta("path.meta")`: provenance of a StepDef loaded from a meta file.
    Meta(Utf8PathBuf),
    /// `@Ignore`: the scenario is skipped.
    Ignore,
    /// Any other annotation.
    Custom {
        /// Tag name without the leading `@`.
        name: String,
        /// Raw parenthesised argument text, if any.
        value: Option<String>,
    },
}

impl Tag {
    /// Parse tag text, with or without the leading `@`.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::Malformed`] when the tag is empty or a recognised
    /// tag carries invalid arguments.
    pub fn parse(text: &str) -> Result<Self, TagError> {
        let raw = text.trim();
        let body = raw.strip_prefix('@').unwrap_or(raw);
        let malformed = |reason| TagError::Malformed {
            tag: raw.to_owned(),
            reason,
        };
        let (name, args) = match body.split_once('(') {
            Some((name, rest)) => {
                let args = rest
                    .strip_suffix(')')
                    .ok_or_else(|| malformed("missing closing parenthesis"))?;
                (name.trim(), Some(args.trim()))
            }
            None => (body, None),
        };
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(malformed("tag name must be a single non-empty word"));
        }
        match (name, args) {
            ("Import", args) => Ok(Self::Import(quoted_path(args).ok_or_else(|| {
                malformed("expected a single double-quoted path")
            })?)),
            ("Examples", args) => Ok(Self::Examples(quoted_path(args).ok_or_else(|| {
                malformed("expected a single double-quoted path")
            })?)),
            ("Meta", args) => Ok(Self::Meta(quoted_path(args).ok_or_else(|| {
                malformed("expected a single double-quoted path")
            })?)),
            ("Data", Some(args)) => {
                parse_data_args(args).ok_or_else(|| malformed("expected file=\"..\", record=N"))
            }
            ("Data", None) => Err(malformed("expected file=\"..\", record=N")),
            ("StepDef", None) => Ok(Self::StepDef),
            ("Ignore", None) => Ok(Self::Ignore),
            ("StepDef" | "Ignore", Some(_)) => Err(malformed("tag takes no arguments")),
            (other, value) => Ok(Self::Custom {
                name: other.to_owned(),
                value: value.map(str::to_owned),
            }),
        }
    }

    /// Path argument of an `@Import` tag.
    #[must_use]
    pub fn import_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Import(path) => Some(path),
            _ => None,
        }
    }

    /// Path argument of an `@Examples` tag.
    #[must_use]
    pub fn examples_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Examples(path) => Some(path),
            _ => None,
        }
    }
}

fn quoted(args: &str) -> Option<&str> {
    let inner = args.strip_prefix('"')?.strip_suffix('"')?;
    (!inner.is_empty() && !inner.contains('"')).then_some(inner)
}

fn quoted_path(args: Option<&str>) -> Option<Utf8PathBuf> {
    args.and_then(quoted).map(Utf8PathBuf::from)
}

fn parse_data_args(args: &str) -> Option<Tag> {
    let after_eq = args.strip_prefix("file")?.trim_start().strip_prefix('=')?;
    let quoted = after_eq.trim_start().strip_prefix('"')?;
    let (file, after_file) = quoted.split_once('"')?;
    let after_comma = after_file.trim_start().strip_prefix(',')?.trim_start();
    let record_value = after_comma
        .strip_prefix("record")?
        .trim_start()
        .strip_prefix('=')?;
    let record = record_value.trim().parse().ok()?;
    (!file.is_empty()).then(|| Tag::Data {
        file: Utf8PathBuf::from(file),
        record,
    })
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import(path) => write!(f, "@Import(\"{path}\")"),
            Self::Examples(path) => write!(f, "@Examples(\"{path}\")"),
            Self::Data { file, record } => write!(f, "@Data(file=\"{file}\", record={record})"),
            Self::StepDef => f.write_str("@StepDef"),
            Self::Meta(path) => write!(f, "@Meta(\"{path}\")"),
            Self::Ignore => f.write_str("@Ignore"),
            Self::Custom { name, value: None } => write!(f, "@{name}"),
            Self::Custom {
                name,
                value: Some(value),
            } => write!(f, "@{name}({value})"),
        }
    }
}

impl TryFrom<String> for Tag {
    type Error = TagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("@StepDef", Tag::StepDef)]
    #[case("Ignore", Tag::Ignore)]
    #[case("@Import(\"lib/common.meta\")", Tag::Import("lib/common.meta".into()))]
    #[case("@Examples( \"rows.csv\" )", Tag::Examples("rows.csv".into()))]
    #[case("@Meta(\"a.meta\")", Tag::Meta("a.meta".into()))]
    #[case(
        "@Data(file=\"rows.csv\", record=3)",
        Tag::Data { file: "rows.csv".into(), record: 3 }
    )]
    #[case("@wip", Tag::Custom { name: "wip".into(), value: None })]
    #[case("@Owner(team-a)", Tag::Custom { name: "Owner".into(), value: Some("team-a".into()) })]
    fn parses_tags(#[case] text: &str, #[case] expected: Tag) {
        assert_eq!(Tag::parse(text), Ok(expected));
    }

    #[rstest]
    #[case("@Import")]
    #[case("@Import(common.meta)")]
    #[case("@Import(\"common.meta\"")]
    #[case("@Examples(\"\")")]
    #[case("@Data(file=\"rows.csv\")")]
    #[case("@Data(record=1, file=\"rows.csv\")")]
    #[case("@StepDef(\"x\")")]
    #[case("@")]
    #[case("@two words")]
    fn rejects_malformed_tags(#[case] text: &str) {
        let err = Tag::parse(text).expect_err("tag should be rejected");
        assert!(matches!(err, TagError::Malformed { .. }), "{err}");
    }

    #[rstest]
    #[case("@Import(\"x.meta\")")]
    #[case("@Data(file=\"rows.csv\", record=7)")]
    #[case("@Owner(team-a)")]
    fn display_reproduces_canonical_text(#[case] text: &str) {
        let tag = Tag::parse(text).expect("valid tag");
        assert_eq!(tag.to_string(), text);
    }
}
