//! Attribute references embedded in step text.
//!
//! `$<name>` reads an attribute, preferring the innermost scope, and
//! `${name}` reads a setting. Each kind falls back to the other source when
//! its own does not bind the name. A reference with no closing bracket is
//! copied through unchanged, and `$$` stands for a literal `$`.

use crate::scope::ScopeError;

/// An attribute reference found in step text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// `$<name>`
    Attribute(&'a str),
    /// `${name}`
    Setting(&'a str),
}

impl<'a> Reference<'a> {
    /// Referenced name.
    #[must_use]
    pub const fn name(self) -> &'a str {
        match self {
            Self::Attribute(name) | Self::Setting(name) => name,
        }
    }
}

/// Escape every `$` in `text` so [`interpolate`] reproduces it verbatim.
#[must_use]
pub fn escape(text: &str) -> String {
    text.replace('$', "$$")
}

/// Replace every reference in `text` with the value `resolve` returns.
///
/// # Errors
///
/// Returns [`ScopeError::Unbound`] for the first reference `resolve` cannot
/// supply.
pub fn interpolate<F>(text: &str, mut resolve: F) -> Result<String, ScopeError>
where
    F: FnMut(Reference<'_>) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some((before, after)) = rest.split_once('$') {
        out.push_str(before);
        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }
        let Some((reference, tail)) = parse_reference(after) else {
            out.push('$');
            rest = after;
            continue;
        };
        let value = resolve(reference).ok_or_else(|| ScopeError::Unbound {
            name: reference.name().to_owned(),
        })?;
        out.push_str(&value);
        rest = tail;
    }
    out.push_str(rest);
    Ok(out)
}

fn parse_reference(after_dollar: &str) -> Option<(Reference<'_>, &str)> {
    if let Some(body) = after_dollar.strip_prefix('<') {
        split_name(body, '>').map(|(name, tail)| (Reference::Attribute(name), tail))
    } else if let Some(body) = after_dollar.strip_prefix('{') {
        split_name(body, '}').map(|(name, tail)| (Reference::Setting(name), tail))
    } else {
        None
    }
}

fn split_name(body: &str, close: char) -> Option<(&str, &str)> {
    let (name, tail) = body.split_once(close)?;
    let valid = !name.is_empty()
        && !name.contains(|c: char| c.is_whitespace() || matches!(c, '$' | '<' | '{'));
    valid.then_some((name, tail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn lookup(reference: Reference<'_>) -> Option<String> {
        match reference {
            Reference::Attribute("user") => Some("ada".into()),
            Reference::Setting("env.host") => Some("example.test".into()),
            _ => None,
        }
    }

    #[rstest]
    #[case("hello $<user>", "hello ada")]
    #[case("visit https://${env.host}/home", "visit https://example.test/home")]
    #[case("$<user>$<user>", "adaada")]
    #[case("costs $5", "costs $5")]
    #[case("open $<user", "open $<user")]
    #[case("empty $<> stays", "empty $<> stays")]
    #[case("trailing $", "trailing $")]
    #[case("literal $$<user> and $$$<user>", "literal $<user> and $ada")]
    fn replaces_references(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(interpolate(text, lookup).expect("interpolate"), expected);
    }

    #[rstest]
    #[case("say \"hi\" for $<user>")]
    #[case("costs $$5 or ${missing}")]
    fn escaped_text_survives_interpolation(#[case] text: &str) {
        let escaped = escape(text);
        assert_eq!(interpolate(&escaped, lookup).expect("interpolate"), text);
    }

    #[rstest]
    #[case("hello $<nobody>", "nobody")]
    #[case("hello ${missing}", "missing")]
    fn unbound_references_fail(#[case] text: &str, #[case] name: &str) {
        let err = interpolate(text, lookup).expect_err("unbound");
        assert_eq!(err, ScopeError::Unbound { name: name.into() });
    }
}
