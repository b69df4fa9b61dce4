//! Merge policies for combining variable scopes.

use super::{VarError, Variable, VariableMap};
use std::collections::HashSet;
use std::sync::Arc;

/// How a source binding is combined with an existing binding of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Same-named values collapse into an array, in merge order.
    Combine,
    /// The later value replaces the earlier one.
    Overwrite,
    /// Objects and arrays are overwritten element by element; anything else
    /// is replaced. A null on either side keeps the other side.
    DeepOverwrite,
    /// Rebinding an existing name is an error.
    Conflict,
}

impl VariableMap {
    /// Merges every source into this map, in argument order.
    ///
    /// Under [`MergePolicy::Conflict`] the whole merge is checked up front,
    /// so on error this map is left untouched.
    pub fn merge(&mut self, policy: MergePolicy, sources: &[&VariableMap]) -> Result<(), VarError> {
        if policy == MergePolicy::Conflict {
            if let Some(name) = self.first_conflict(sources) {
                return Err(VarError::Conflict(name));
            }
        }

        for source in sources {
            for (name, value) in source.iter() {
                match policy {
                    MergePolicy::Conflict | MergePolicy::Overwrite => {
                        if let Some(shared) = source.get_shared(name) {
                            self.set_shared(name.to_string(), Arc::clone(shared));
                        }
                    }
                    MergePolicy::DeepOverwrite => {
                        let merged = match self.get(name) {
                            Some(existing) => deep_overwrite(existing, value),
                            None => value.clone(),
                        };
                        self.set(name, merged);
                    }
                    MergePolicy::Combine => self.combine(name, value.clone()),
                }
            }
        }
        Ok(())
    }

    /// Copies this map, then merges the sources into the copy.
    ///
    /// # Examples
    ///
    /// ```
    /// use aloe::variables::{MergePolicy, VariableMap};
    ///
    /// let parent: VariableMap = [("host", "localhost")].into_iter().collect();
    /// let exports: VariableMap = [("token", "abc")].into_iter().collect();
    ///
    /// let child = parent.merged(MergePolicy::Conflict, &[&exports]).unwrap();
    /// assert_eq!(child.len(), 2);
    /// assert_eq!(parent.len(), 1);
    /// ```
    pub fn merged(&self, policy: MergePolicy, sources: &[&VariableMap]) -> Result<VariableMap, VarError> {
        let mut copy = self.clone();
        copy.merge(policy, sources)?;
        Ok(copy)
    }

    /// Returns true if merging `sources` under [`MergePolicy::Conflict`] would fail.
    pub fn is_conflict(&self, sources: &[&VariableMap]) -> bool {
        self.first_conflict(sources).is_some()
    }

    fn first_conflict(&self, sources: &[&VariableMap]) -> Option<String> {
        let mut seen = HashSet::new();
        for source in sources {
            for name in source.keys() {
                if self.contains(name) || !seen.insert(name) {
                    return Some(name.to_string());
                }
            }
        }
        None
    }

    fn combine(&mut self, name: &str, value: Variable) {
        let Some(mut existing) = self.get(name).cloned() else {
            self.set(name, Variable::Array(vec![value]));
            return;
        };
        match &mut existing {
            Variable::Array(items) => items.push(value),
            other => {
                let previous = std::mem::take(other);
                *other = Variable::Array(vec![previous, value]);
            }
        }
        self.set(name, existing);
    }
}

fn deep_overwrite(dst: &Variable, src: &Variable) -> Variable {
    match (dst, src) {
        (_, Variable::Null) => dst.clone(),
        (Variable::Null, _) => src.clone(),
        (Variable::Object(dst_fields), Variable::Object(src_fields)) => {
            let mut fields = dst_fields.clone();
            for (key, value) in src_fields {
                let merged = match fields.get(key) {
                    Some(existing) => deep_overwrite(existing, value),
                    None => value.clone(),
                };
                fields.insert(key.clone(), merged);
            }
            Variable::Object(fields)
        }
        (Variable::Array(dst_items), Variable::Array(src_items)) => {
            let mut items = dst_items.clone();
            for (i, value) in src_items.iter().enumerate() {
                match items.get_mut(i) {
                    Some(existing) => *existing = deep_overwrite(existing, value),
                    None => items.push(value.clone()),
                }
            }
            Variable::Array(items)
        }
        _ => src.clone(),
    }
}
