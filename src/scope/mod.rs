//! Scoped attribute storage.
//!
//! Attributes live in a stack of named [`Scope`]s: transient scopes (such as
//! the parameter scope of a running StepDef) sit on top of a single feature
//! scope that is never removed. Scopes are append-only per name: setting an
//! existing name records a new binding and the most recent one wins on
//! lookup, while earlier values remain visible to diagnostics.
//!
//! ```rust
//! use stepwise::scope::{ScopeStack, FEATURE_SCOPE};
//!
//! let mut scopes = ScopeStack::new();
//! scopes.set(FEATURE_SCOPE, "user", "ada");
//! scopes.set(FEATURE_SCOPE, "user", "grace");
//! assert_eq!(scopes.get("user").expect("bound"), "grace");
//! assert_eq!(scopes.feature().scope().get_all("user"), vec!["ada", "grace"]);
//! ```

mod cache;
mod error;

use indexmap::IndexMap;
use serde_json::{Map, Value, json};

pub use cache::ObjectCache;
pub use error::ScopeError;

/// Name of the permanent feature scope.
pub const FEATURE_SCOPE: &str = "feature";
/// Name of the parameter scope pushed while a StepDef runs.
pub const STEPDEF_SCOPE: &str = "stepdef";

/// A named, ordered list of attribute bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    name: String,
    bindings: Vec<(String, String)>,
}

impl Scope {
    /// Create an empty scope.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: Vec::new(),
        }
    }

    /// Create a scope holding the given bindings in order.
    #[must_use]
    pub fn with_bindings<I, K, V>(name: impl Into<String>, bindings: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            bindings: bindings
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Scope name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All bindings in insertion order.
    #[must_use]
    pub fn bindings(&self) -> &[(String, String)] {
        &self.bindings
    }

    /// Append a new current binding for `name`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.bindings.push((name.into(), value.into()));
    }

    /// Current (most recently appended) value of `name`.
    #[must_use]
    pub fn get_opt(&self, name: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value bound to `name`, oldest first.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Latest-wins projection of the scope, keyed in first-bound order.
    #[must_use]
    pub fn visible(&self) -> IndexMap<&str, &str> {
        let mut view = IndexMap::new();
        for (key, value) in &self.bindings {
            view.insert(key.as_str(), value.as_str());
        }
        view
    }

    /// Copy of this scope keeping only bindings accepted by `predicate`.
    #[must_use]
    pub fn filter(&self, predicate: impl Fn(&str, &str) -> bool) -> Self {
        Self {
            name: self.name.clone(),
            bindings: self
                .bindings
                .iter()
                .filter(|(key, value)| predicate(key.as_str(), value.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Whether the scope holds no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn snapshot(&self) -> Map<String, Value> {
        let atts = self
            .bindings
            .iter()
            .map(|(key, value)| json!({ key: value }))
            .collect::<Vec<_>>();
        let mut map = Map::new();
        map.insert("scope".into(), Value::from(self.name.as_str()));
        map.insert("atts".into(), Value::Array(atts));
        map
    }
}

/// A value shadowed by a re-binding inside an open transient scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashEntry {
    /// Scope that re-bound the value.
    pub scope: String,
    /// Binding name.
    pub name: String,
    /// The value that was shadowed.
    pub value: String,
    depth: usize,
}

/// The permanent, outermost scope of an evaluation context.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureScope {
    scope: Scope,
    flash: Vec<FlashEntry>,
    objects: ObjectCache,
}

impl FeatureScope {
    fn new() -> Self {
        Self {
            scope: Scope::new(FEATURE_SCOPE),
            flash: Vec::new(),
            objects: ObjectCache::default(),
        }
    }

    /// Feature-level bindings.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Values shadowed inside currently open transient scopes.
    #[must_use]
    pub fn flash(&self) -> &[FlashEntry] {
        &self.flash
    }

    /// Bound non-textual objects.
    #[must_use]
    pub const fn objects(&self) -> &ObjectCache {
        &self.objects
    }

    fn reset(&mut self) {
        self.scope.bindings.clear();
        self.flash.clear();
        self.objects.reset();
    }
}

/// The lookup stack: transient scopes over the feature scope.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeStack {
    transient: Vec<Scope>,
    feature: FeatureScope,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    /// Create a stack holding only an empty feature scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transient: Vec::new(),
            feature: FeatureScope::new(),
        }
    }

    /// The feature scope.
    #[must_use]
    pub const fn feature(&self) -> &FeatureScope {
        &self.feature
    }

    /// Object cache held by the feature scope.
    #[must_use]
    pub const fn objects(&self) -> &ObjectCache {
        &self.feature.objects
    }

    /// Mutable object cache held by the feature scope.
    pub const fn objects_mut(&mut self) -> &mut ObjectCache {
        &mut self.feature.objects
    }

    /// The active scope: the top transient scope, else the feature scope.
    #[must_use]
    pub fn current(&self) -> &Scope {
        self.transient.last().unwrap_or(&self.feature.scope)
    }

    /// Open a transient scope on top of the stack.
    pub fn push(&mut self, scope: Scope) {
        tracing::debug!(scope = scope.name(), "opening scope");
        self.transient.push(scope);
    }

    /// Close the top transient scope. The feature scope is never removed.
    ///
    /// Values flashed while the scope was open are discarded, so lookups see
    /// the outer bindings again.
    pub fn pop(&mut self) -> Option<Scope> {
        let depth = self.transient.len();
        let scope = self.transient.pop()?;
        self.feature.flash.retain(|entry| entry.depth != depth);
        tracing::debug!(scope = scope.name(), "closed scope");
        Some(scope)
    }

    /// Close transient scopes until at most `depth` remain.
    ///
    /// Closes everything opened above `depth`, including scopes opened by
    /// [`ScopeStack::set`] after the caller's own push.
    pub fn truncate(&mut self, depth: usize) {
        while self.transient.len() > depth {
            self.pop();
        }
    }

    /// Number of open transient scopes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.transient.len()
    }

    /// Append a binding to the named scope.
    ///
    /// `FEATURE_SCOPE` targets the feature scope; any other name targets the
    /// nearest open scope of that name, opening one when none exists. When
    /// the target is the active transient scope and already binds `name` or
    /// a sub-key `name/...`, the shadowed values are recorded in the feature
    /// scope's flash list until the scope closes.
    pub fn set(&mut self, scope: &str, name: &str, value: impl Into<String>) {
        let bound: String = value.into();
        if scope == FEATURE_SCOPE {
            self.feature.scope.set(name, bound);
            return;
        }
        let depth = self.transient.len();
        let Some(index) = self.transient.iter().rposition(|s| s.name == scope) else {
            self.push(Scope::with_bindings(scope, [(name, bound)]));
            return;
        };
        let Some(target) = self.transient.get_mut(index) else {
            return;
        };
        if index + 1 == depth {
            let shadowed = target
                .visible()
                .into_iter()
                .filter(|(key, _)| is_key_or_subkey(key, name))
                .map(|(key, old)| FlashEntry {
                    scope: scope.to_owned(),
                    name: key.to_owned(),
                    value: old.to_owned(),
                    depth,
                })
                .collect::<Vec<_>>();
            self.feature.flash.extend(shadowed);
        }
        target.set(name, bound);
    }

    /// Scopes from most specific to least specific; the feature scope is
    /// always last.
    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.transient
            .iter()
            .rev()
            .chain(std::iter::once(&self.feature.scope))
    }

    /// Current value of `name` in the most specific scope binding it.
    #[must_use]
    pub fn get_opt(&self, name: &str) -> Option<&str> {
        self.scopes().find_map(|scope| scope.get_opt(name))
    }

    /// Current value of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Unbound`] when no scope binds `name`.
    pub fn get(&self, name: &str) -> Result<&str, ScopeError> {
        self.get_opt(name).ok_or_else(|| ScopeError::Unbound {
            name: name.to_owned(),
        })
    }

    /// One latest-wins view per scope, most specific first.
    #[must_use]
    pub fn visible(&self) -> Vec<(&str, IndexMap<&str, &str>)> {
        self.scopes()
            .map(|scope| (scope.name(), scope.visible()))
            .collect()
    }

    /// New stack holding only the bindings accepted by `predicate`.
    ///
    /// Every scope is kept, even when emptied, so scope order is preserved.
    /// Objects are not copied.
    #[must_use]
    pub fn filter(&self, predicate: impl Fn(&str, &str) -> bool) -> Self {
        Self {
            transient: self
                .transient
                .iter()
                .map(|scope| scope.filter(&predicate))
                .collect(),
            feature: FeatureScope {
                scope: self.feature.scope.filter(&predicate),
                flash: self
                    .feature
                    .flash
                    .iter()
                    .filter(|entry| predicate(entry.name.as_str(), entry.value.as_str()))
                    .cloned()
                    .collect(),
                objects: ObjectCache::default(),
            },
        }
    }

    /// Drop every transient scope and clear the feature scope in place.
    pub fn reset(&mut self) {
        self.transient.clear();
        self.feature.reset();
    }

    /// Ordered snapshot of all scopes for diagnostics and JSON export.
    ///
    /// ```rust
    /// use stepwise::scope::{ScopeStack, FEATURE_SCOPE};
    ///
    /// let mut scopes = ScopeStack::new();
    /// scopes.set(FEATURE_SCOPE, "a", "1");
    /// let json = scopes.snapshot().to_string();
    /// assert_eq!(json, r#"{"scopes":[{"scope":"feature","atts":[{"a":"1"}]}]}"#);
    /// ```
    #[must_use]
    pub fn snapshot(&self) -> Value {
        let mut scopes: Vec<Value> = self
            .transient
            .iter()
            .rev()
            .map(|scope| Value::Object(scope.snapshot()))
            .collect();
        let mut feature = self.feature.scope.snapshot();
        if !self.feature.flash.is_empty() {
            let flash = self
                .feature
                .flash
                .iter()
                .map(|entry| json!({ "scope": entry.scope, "name": entry.name, "value": entry.value }))
                .collect();
            feature.insert("flash".into(), Value::Array(flash));
        }
        scopes.push(Value::Object(feature));
        json!({ "scopes": scopes })
    }
}

fn is_key_or_subkey(key: &str, name: &str) -> bool {
    key.strip_prefix(name)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn scopes() -> ScopeStack {
        let mut scopes = ScopeStack::new();
        scopes.set(FEATURE_SCOPE, "user", "ada");
        scopes
    }

    #[rstest]
    fn empty_stack_lookup_fails() {
        let scopes = ScopeStack::new();
        assert_eq!(
            scopes.get("missing"),
            Err(ScopeError::Unbound {
                name: "missing".into()
            })
        );
    }

    #[rstest]
    fn most_specific_scope_wins(mut scopes: ScopeStack) {
        scopes.push(Scope::with_bindings(STEPDEF_SCOPE, [("user", "grace")]));
        assert_eq!(scopes.get("user"), Ok("grace"));
        scopes.pop();
        assert_eq!(scopes.get("user"), Ok("ada"));
    }

    #[rstest]
    fn feature_scope_is_never_popped(mut scopes: ScopeStack) {
        assert!(scopes.pop().is_none());
        assert_eq!(scopes.current().name(), FEATURE_SCOPE);
        assert_eq!(scopes.get("user"), Ok("ada"));
    }

    #[rstest]
    fn setting_unknown_scope_opens_it(mut scopes: ScopeStack) {
        scopes.set("page", "title", "Home");
        assert_eq!(scopes.current().name(), "page");
        assert_eq!(scopes.depth(), 1);
    }

    #[rstest]
    fn truncate_closes_scopes_opened_after_the_mark(mut scopes: ScopeStack) {
        let mark = scopes.depth();
        scopes.push(Scope::with_bindings(STEPDEF_SCOPE, [("name", "ada")]));
        scopes.set("page", "title", "Home");
        scopes.set("page", "title", "About");
        assert_eq!(scopes.depth(), 2);

        scopes.truncate(mark);
        assert_eq!(scopes.depth(), mark);
        assert!(scopes.get_opt("name").is_none());
        assert!(scopes.feature().flash().is_empty());
        assert_eq!(scopes.get("user"), Ok("ada"));
    }

    #[rstest]
    fn rebinding_in_active_scope_flashes_shadowed_values(mut scopes: ScopeStack) {
        scopes.set("page", "form", "login");
        scopes.set("page", "form/field", "name");
        scopes.set("page", "form", "signup");

        let flashed: Vec<(&str, &str)> = scopes
            .feature()
            .flash()
            .iter()
            .map(|entry| (entry.name.as_str(), entry.value.as_str()))
            .collect();
        assert_eq!(flashed, vec![("form", "login"), ("form/field", "name")]);
        assert_eq!(scopes.get("form"), Ok("signup"));

        scopes.pop();
        assert!(scopes.feature().flash().is_empty());
        assert!(scopes.get_opt("form").is_none());
    }

    #[rstest]
    fn subkey_match_requires_separator() {
        assert!(is_key_or_subkey("form", "form"));
        assert!(is_key_or_subkey("form/field", "form"));
        assert!(!is_key_or_subkey("former", "form"));
    }

    #[rstest]
    fn filter_preserves_scopes_without_mutating_source(mut scopes: ScopeStack) {
        scopes.push(Scope::with_bindings("page", [("title", "Home"), ("user", "x")]));
        let filtered = scopes.filter(|name, _| name == "title");

        let names: Vec<&str> = filtered.scopes().map(Scope::name).collect();
        assert_eq!(names, vec!["page", FEATURE_SCOPE]);
        assert!(filtered.feature().scope().is_empty());
        assert_eq!(filtered.get("title"), Ok("Home"));
        assert_eq!(scopes.get("user"), Ok("x"));
    }

    #[rstest]
    fn reset_clears_everything_but_keeps_feature_scope(mut scopes: ScopeStack) {
        scopes.push(Scope::new("page"));
        scopes.objects_mut().bind("table", serde_json::json!([]));
        scopes.reset();
        assert_eq!(scopes.depth(), 0);
        assert!(scopes.feature().scope().is_empty());
        assert!(scopes.objects().is_empty());
        assert_eq!(scopes.current().name(), FEATURE_SCOPE);
    }

    #[rstest]
    fn snapshot_preserves_scope_and_insertion_order(mut scopes: ScopeStack) {
        scopes.set(FEATURE_SCOPE, "user", "grace");
        scopes.push(Scope::with_bindings(STEPDEF_SCOPE, [("b", "2"), ("a", "1")]));
        let expected = serde_json::json!({
            "scopes": [
                { "scope": "stepdef", "atts": [ { "b": "2" }, { "a": "1" } ] },
                { "scope": "feature", "atts": [ { "user": "ada" }, { "user": "grace" } ] }
            ]
        });
        assert_eq!(scopes.snapshot(), expected);
    }
}
