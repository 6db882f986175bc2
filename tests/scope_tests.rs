//! Tests for the scoped attribute stack.

use rstest::{fixture, rstest};
use stepwise::scope::{FEATURE_SCOPE, STEPDEF_SCOPE, Scope, ScopeError, ScopeStack};

#[fixture]
fn scopes() -> ScopeStack {
    ScopeStack::new()
}

#[rstest]
fn repeated_sets_keep_every_value(mut scopes: ScopeStack) {
    scopes.set(FEATURE_SCOPE, "user", "ada");
    scopes.set(FEATURE_SCOPE, "user", "grace");
    assert_eq!(scopes.get("user"), Ok("grace"));
    assert_eq!(scopes.feature().scope().get_all("user"), vec!["ada", "grace"]);
}

#[rstest]
fn empty_stack_lookups_fail(scopes: ScopeStack) {
    assert_eq!(
        scopes.get("anything"),
        Err(ScopeError::Unbound {
            name: "anything".into()
        })
    );
    assert!(scopes.get_opt("anything").is_none());
}

#[rstest]
fn inner_scopes_shadow_until_popped(mut scopes: ScopeStack) {
    scopes.set(FEATURE_SCOPE, "name", "outer");
    scopes.push(Scope::with_bindings(STEPDEF_SCOPE, [("name", "inner")]));
    assert_eq!(scopes.get("name"), Ok("inner"));
    scopes.pop();
    assert_eq!(scopes.get("name"), Ok("outer"));
}

#[rstest]
fn feature_scope_is_never_popped(mut scopes: ScopeStack) {
    scopes.set(FEATURE_SCOPE, "kept", "yes");
    assert!(scopes.pop().is_none());
    assert_eq!(scopes.get("kept"), Ok("yes"));
}

#[rstest]
fn reset_clears_everything_but_keeps_the_feature_scope(mut scopes: ScopeStack) {
    scopes.set(FEATURE_SCOPE, "a", "1");
    scopes.set("vars", "b", "2");
    scopes.objects_mut().bind("table", serde_json::Value::Bool(true));
    scopes.reset();
    assert_eq!(scopes.depth(), 0);
    assert!(scopes.get_opt("a").is_none());
    assert!(scopes.get_opt("b").is_none());
    assert!(scopes.objects().is_empty());
    assert_eq!(scopes.current().name(), FEATURE_SCOPE);
}

#[rstest]
fn filter_preserves_scope_order_without_mutating(mut scopes: ScopeStack) {
    scopes.set(FEATURE_SCOPE, "user/name", "ada");
    scopes.set(FEATURE_SCOPE, "other", "x");
    scopes.set("vars", "user/role", "admin");
    let filtered = scopes.filter(|name, _| name.starts_with("user/"));
    let names: Vec<&str> = filtered.scopes().map(Scope::name).collect();
    assert_eq!(names, vec!["vars", FEATURE_SCOPE]);
    assert!(filtered.get_opt("other").is_none());
    assert_eq!(scopes.get("other"), Ok("x"));
}

#[rstest]
fn snapshot_keeps_scope_and_insertion_order(mut scopes: ScopeStack) {
    scopes.set(FEATURE_SCOPE, "b", "1");
    scopes.set(FEATURE_SCOPE, "a", "2");
    scopes.set("vars", "c", "3");
    assert_eq!(
        scopes.snapshot().to_string(),
        r#"{"scopes":[{"scope":"vars","atts":[{"c":"3"}]},{"scope":"feature","atts":[{"b":"1"},{"a":"2"}]}]}"#
    );
}

#[rstest]
fn shadowed_values_flash_until_the_scope_closes(mut scopes: ScopeStack) {
    scopes.set("vars", "user", "ada");
    scopes.set("vars", "user", "grace");
    assert_eq!(scopes.feature().flash().len(), 1);
    scopes.pop();
    assert!(scopes.feature().flash().is_empty());
}
