//! Placeholder templates used as StepDef names and outline text.
//!
//! A template is literal text interspersed with `<name>` placeholders. The
//! name must be non-empty, must not start or end with whitespace, and must
//! not contain angle brackets; anything else between `<` and `>` is literal.

use itertools::Itertools;

use super::StepDefError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('<')
        && name.trim() == name
}

/// Split `template` into literal and placeholder segments. Literal segments
/// are never empty.
fn segments(template: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut literal_start = template;
    let mut rest = template;
    let mut literal_len = 0;
    while let Some((before, after)) = rest.split_once('<') {
        literal_len += before.len();
        match after.split_once('>') {
            Some((name, tail)) if is_placeholder_name(name) => {
                let (literal, _) = literal_start.split_at(literal_len);
                if !literal.is_empty() {
                    out.push(Segment::Literal(literal));
                }
                out.push(Segment::Placeholder(name));
                literal_start = tail;
                literal_len = 0;
                rest = tail;
            }
            _ => {
                literal_len += 1;
                rest = after;
            }
        }
    }
    if !literal_start.is_empty() {
        out.push(Segment::Literal(literal_start));
    }
    out
}

/// Placeholder names in declaration order.
///
/// ```rust
/// use stepwise::stepdef::placeholders;
///
/// assert_eq!(placeholders("I login as <user> with <password>"), vec!["user", "password"]);
/// assert!(placeholders("a < b and c > d").is_empty());
/// ```
#[must_use]
pub fn placeholders(template: &str) -> Vec<&str> {
    segments(template)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name),
            Segment::Literal(_) => None,
        })
        .collect()
}

/// Ensure every placeholder name in `template` is distinct.
///
/// # Errors
///
/// Returns [`StepDefError::DuplicatePlaceholder`] naming the first repeat.
pub fn check_placeholders(template: &str) -> Result<(), StepDefError> {
    match placeholders(template).into_iter().duplicates().next() {
        Some(name) => Err(StepDefError::DuplicatePlaceholder {
            template: template.to_owned(),
            placeholder: name.to_owned(),
        }),
        None => Ok(()),
    }
}

/// Replace each `<name>` placeholder with its bound value. Placeholders
/// without a binding are left verbatim.
///
/// ```rust
/// use stepwise::stepdef::substitute;
///
/// let params = [("user".to_owned(), "ada".to_owned())];
/// assert_eq!(substitute("hello <user>, <other>", &params), "hello ada, <other>");
/// ```
#[must_use]
pub fn substitute(template: &str, params: &[(String, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    for segment in segments(template) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(name) => {
                match params.iter().find(|(key, _)| key == name) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push('<');
                        out.push_str(name);
                        out.push('>');
                    }
                }
            }
        }
    }
    out
}

/// Match `expression` against a parameterised `template`.
///
/// Literal fragments are split off left to right and the spans between them
/// captured as placeholder values. A candidate only matches when
/// substituting the captures back into the template reproduces
/// `expression` exactly. Templates without placeholders never match here;
/// they are resolved by exact lookup.
///
/// # Errors
///
/// Returns [`StepDefError::DuplicatePlaceholder`] when the template repeats
/// a placeholder name.
///
/// ```rust
/// use stepwise::stepdef::match_template;
///
/// let params = match_template("I login as <user> with <password>", "I login as ada with secret")
///     .expect("valid template")
///     .expect("match");
/// assert_eq!(params, vec![
///     ("user".to_owned(), "ada".to_owned()),
///     ("password".to_owned(), "secret".to_owned()),
/// ]);
/// ```
pub fn match_template(
    template: &str,
    expression: &str,
) -> Result<Option<Vec<(String, String)>>, StepDefError> {
    check_placeholders(template)?;
    let segments = segments(template);
    let has_placeholder = segments
        .iter()
        .any(|s| matches!(s, Segment::Placeholder(_)));
    let literals_present = segments.iter().all(|s| match s {
        Segment::Literal(text) => expression.contains(text),
        Segment::Placeholder(_) => true,
    });
    if !has_placeholder || !literals_present {
        return Ok(None);
    }
    let Some(captured) = capture(&segments, expression) else {
        return Ok(None);
    };
    let params: Vec<(String, String)> = captured
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .collect();
    Ok((substitute(template, &params) == expression).then_some(params))
}

fn capture<'t, 'e>(segments: &[Segment<'t>], expression: &'e str) -> Option<Vec<(&'t str, &'e str)>> {
    let mut values = Vec::new();
    let mut pending: Option<&'t str> = None;
    let mut rest = expression;
    for segment in segments {
        match *segment {
            Segment::Literal(text) => {
                rest = match pending.take() {
                    None => rest.strip_prefix(text)?,
                    Some(name) => {
                        let (value, tail) = rest.split_once(text)?;
                        values.push((name, value));
                        tail
                    }
                };
            }
            Segment::Placeholder(name) => {
                if let Some(previous) = pending.replace(name) {
                    values.push((previous, ""));
                }
            }
        }
    }
    match pending {
        Some(name) => values.push((name, rest)),
        None if !rest.is_empty() => return None,
        None => {}
    }
    Some(values)
}
