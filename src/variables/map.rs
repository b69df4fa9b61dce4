//! Ordered variable scope.

use super::{VarError, Variable};
use indexmap::IndexMap;
use std::sync::Arc;

/// A mapping from variable name to [`Variable`], in insertion order.
///
/// Values are held behind `Arc`, so cloning a map copies only the top-level
/// table: the new map shares its leaf values with the original until one of
/// the two rebinds a name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableMap {
    entries: IndexMap<String, Arc<Variable>>,
}

impl VariableMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.entries.get(name).map(Arc::as_ref)
    }

    /// Binds `name`, replacing any previous value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Variable>) {
        self.entries.insert(name.into(), Arc::new(value.into()));
    }

    pub(crate) fn set_shared(&mut self, name: String, value: Arc<Variable>) {
        self.entries.insert(name, value);
    }

    pub(crate) fn get_shared(&self, name: &str) -> Option<&Arc<Variable>> {
        self.entries.get(name)
    }

    /// Removes `name` and returns its value, keeping the order of the rest.
    pub fn delete(&mut self, name: &str) -> Option<Variable> {
        self.entries
            .shift_remove(name)
            .map(|v| Arc::try_unwrap(v).unwrap_or_else(|shared| (*shared).clone()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Resolves a path whose first segment is a variable name.
    ///
    /// # Examples
    ///
    /// ```
    /// use aloe::variables::{Variable, VariableMap};
    /// use serde_json::json;
    ///
    /// let mut vars = VariableMap::new();
    /// vars.set("user", Variable::from_json(json!({"id": 42})));
    /// assert_eq!(vars.select(&["user", "id"]).unwrap(), Variable::from(42));
    /// ```
    pub fn select<S: AsRef<str>>(&self, path: &[S]) -> Result<Variable, VarError> {
        let Some((name, rest)) = path.split_first() else {
            return Err(VarError::UndefinedVariable(String::new()));
        };
        let name = name.as_ref();
        self.get(name)
            .ok_or_else(|| VarError::UndefinedVariable(name.to_string()))?
            .select(rest)
    }

    /// Renders every binding to its canonical string form.
    pub fn to_strings(&self) -> IndexMap<String, String> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<Variable>> FromIterator<(K, V)> for VariableMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = VariableMap::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}
