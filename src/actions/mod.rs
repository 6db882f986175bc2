//! Literal step actions.
//!
//! Steps that no StepDef answers are handed to a [`StepAction`]. The crate
//! ships [`BuiltinActions`], a small ordered rule table for binding and
//! asserting attributes; embedders supply their own implementation for
//! anything richer.

mod error;

use crate::scope::{FEATURE_SCOPE, ScopeError, ScopeStack};
use crate::settings::Settings;

pub use error::ActionError;

/// Attribute access handed to an action while it runs.
#[derive(Debug)]
pub struct ActionEnv<'a> {
    scopes: &'a mut ScopeStack,
    settings: &'a Settings,
}

impl<'a> ActionEnv<'a> {
    /// Wrap the scope stack and settings of an evaluation context.
    pub const fn new(scopes: &'a mut ScopeStack, settings: &'a Settings) -> Self {
        Self { scopes, settings }
    }

    /// Look `name` up in the scopes, falling back to settings.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Unbound`] when neither binds the name.
    pub fn get(&self, name: &str) -> Result<&str, ScopeError> {
        self.scopes
            .get_opt(name)
            .or_else(|| self.settings.get_opt(name))
            .ok_or_else(|| ScopeError::Unbound {
                name: name.to_owned(),
            })
    }

    /// Bind `name` in the feature scope.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.scopes.set(FEATURE_SCOPE, name, value);
    }

    /// Mutable access to the full scope stack.
    pub const fn scopes(&mut self) -> &mut ScopeStack {
        self.scopes
    }
}

/// Performs the literal steps no StepDef handles.
///
/// Calls may block; the evaluator runs them one at a time.
pub trait StepAction: Send + Sync {
    /// Perform the action described by `expression`.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] when the action fails; the evaluator records
    /// the failure on the step and carries on.
    fn perform(&self, expression: &str, env: &mut ActionEnv<'_>) -> Result<(), ActionError>;
}

type Rule = fn(&str, &mut ActionEnv<'_>) -> Option<Result<(), ActionError>>;

/// Rules tried top to bottom; the first that recognises the text wins.
const RULES: [(&str, Rule); 3] = [
    ("should not be", should_not_be),
    ("should be", should_be),
    ("is", bind),
];

/// Built-in attribute rules: `<name> is "<value>"`,
/// `<name> should be "<value>"` and `<name> should not be "<value>"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinActions;

impl StepAction for BuiltinActions {
    fn perform(&self, expression: &str, env: &mut ActionEnv<'_>) -> Result<(), ActionError> {
        RULES
            .iter()
            .find_map(|(label, rule)| {
                rule(expression, env).inspect(|_| tracing::trace!(rule = label, "matched rule"))
            })
            .unwrap_or_else(|| {
                Err(ActionError::Undefined {
                    expression: expression.to_owned(),
                })
            })
    }
}

/// Split `name <infix> "value"` into its name and value.
///
/// The name runs up to the first ` <infix> "` and may contain spaces but not
/// quotes; the value is everything up to the closing quote, quotes included.
fn split_quoted<'e>(expression: &'e str, infix: &str) -> Option<(&'e str, &'e str)> {
    let body = expression.strip_suffix('"')?;
    let (raw_name, value) = body.split_once(&format!(" {infix} \""))?;
    let name = raw_name.trim();
    if name.is_empty() || name.contains('"') {
        return None;
    }
    Some((name, value))
}

fn bind(expression: &str, env: &mut ActionEnv<'_>) -> Option<Result<(), ActionError>> {
    let (name, value) = split_quoted(expression, "is")?;
    env.set(name, value);
    Some(Ok(()))
}

fn should_be(expression: &str, env: &mut ActionEnv<'_>) -> Option<Result<(), ActionError>> {
    let (name, expected) = split_quoted(expression, "should be")?;
    Some(env.get(name).map_err(ActionError::from).and_then(|actual| {
        if actual == expected {
            Ok(())
        } else {
            Err(ActionError::Assertion {
                name: name.to_owned(),
                expected: expected.to_owned(),
                actual: actual.to_owned(),
            })
        }
    }))
}

fn should_not_be(expression: &str, env: &mut ActionEnv<'_>) -> Option<Result<(), ActionError>> {
    let (name, unexpected) = split_quoted(expression, "should not be")?;
    let actual = env.get(name).ok();
    Some(if actual == Some(unexpected) {
        Err(ActionError::Assertion {
            name: name.to_owned(),
            expected: format!("not {unexpected}"),
            actual: unexpected.to_owned(),
        })
    } else {
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn scopes() -> ScopeStack {
        ScopeStack::new()
    }

    #[rstest]
    fn binds_then_asserts(mut scopes: ScopeStack) {
        let settings = Settings::new();
        let mut env = ActionEnv::new(&mut scopes, &settings);
        BuiltinActions
            .perform("user is \"ada\"", &mut env)
            .expect("bind");
        BuiltinActions
            .perform("user should be \"ada\"", &mut env)
            .expect("assert");
        BuiltinActions
            .perform("user should not be \"grace\"", &mut env)
            .expect("negated assert");
        assert_eq!(scopes.get("user").expect("bound"), "ada");
    }

    #[rstest]
    #[case("user should be \"grace\"")]
    #[case("user should not be \"ada\"")]
    fn failed_assertions_report_values(mut scopes: ScopeStack, #[case] expression: &str) {
        scopes.set(FEATURE_SCOPE, "user", "ada");
        let settings = Settings::new();
        let mut env = ActionEnv::new(&mut scopes, &settings);
        let err = BuiltinActions
            .perform(expression, &mut env)
            .expect_err("assertion fails");
        assert!(matches!(err, ActionError::Assertion { .. }), "{err}");
    }

    #[rstest]
    fn settings_back_unbound_names(mut scopes: ScopeStack) {
        let mut settings = Settings::new();
        settings.set("env", "test");
        let mut env = ActionEnv::new(&mut scopes, &settings);
        BuiltinActions
            .perform("env should be \"test\"", &mut env)
            .expect("setting lookup");
    }

    #[rstest]
    #[case("the moon is made of cheese")]
    #[case("is \"x\"")]
    #[case("I click the button")]
    fn unknown_text_is_undefined(mut scopes: ScopeStack, #[case] expression: &str) {
        let settings = Settings::new();
        let mut env = ActionEnv::new(&mut scopes, &settings);
        let err = BuiltinActions
            .perform(expression, &mut env)
            .expect_err("undefined");
        assert_eq!(
            err,
            ActionError::Undefined {
                expression: expression.to_owned()
            }
        );
    }

    #[rstest]
    #[case("first name is \"ada\"", "first name", "ada")]
    #[case("quote is \"say \"hi\"\"", "quote", "say \"hi\"")]
    #[case("empty is \"\"", "empty", "")]
    fn binds_spaced_names_and_quoted_values(
        mut scopes: ScopeStack,
        #[case] expression: &str,
        #[case] name: &str,
        #[case] value: &str,
    ) {
        let settings = Settings::new();
        let mut env = ActionEnv::new(&mut scopes, &settings);
        BuiltinActions.perform(expression, &mut env).expect("bind");
        let assertion = format!("{name} should be \"{value}\"");
        BuiltinActions
            .perform(&assertion, &mut env)
            .expect("assert");
        assert_eq!(scopes.get(name), Ok(value));
    }

    #[rstest]
    fn unbound_name_fails_positive_assertion(mut scopes: ScopeStack) {
        let settings = Settings::new();
        let mut env = ActionEnv::new(&mut scopes, &settings);
        let err = BuiltinActions
            .perform("user should be \"ada\"", &mut env)
            .expect_err("unbound");
        assert!(matches!(err, ActionError::Unbound(_)), "{err}");
    }
}
