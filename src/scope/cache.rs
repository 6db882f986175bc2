//! Stacked storage for non-textual values bound in the feature scope.

use indexmap::IndexMap;
use serde_json::Value;

/// Maps names to stacks of bound objects, most recent on top.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectCache {
    entries: IndexMap<String, Vec<Value>>,
}

impl ObjectCache {
    /// Push `value` on top of the stack for `name`.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.entries.entry(name.into()).or_default().push(value);
    }

    /// Most recently bound object for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).and_then(|stack| stack.last())
    }

    /// Pop the top binding for `name`, dropping the name once its stack is
    /// empty.
    pub fn clear(&mut self, name: &str) -> Option<Value> {
        let stack = self.entries.get_mut(name)?;
        let popped = stack.pop();
        if stack.is_empty() {
            self.entries.shift_remove(name);
        }
        popped
    }

    /// Bound names in first-bound order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Whether nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn reset(&mut self) {
        self.entries.clear();
    }
}
