//! Label-based case selection.

use crate::config::RunnerConfig;
use std::collections::HashSet;

/// Decides which cases run from their labels.
///
/// A non-empty focus set runs only cases carrying at least one focused
/// label, and the skip set is ignored. Otherwise cases carrying any skipped
/// label are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelFilter {
    focus: HashSet<String>,
    skip: HashSet<String>,
}

impl LabelFilter {
    pub fn new<F, S>(focus: F, skip: S) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            focus: focus.into_iter().map(Into::into).collect(),
            skip: skip.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(config.focus_labels(), config.skip_labels())
    }

    pub fn selects<S: AsRef<str>>(&self, labels: &[S]) -> bool {
        if !self.focus.is_empty() {
            return labels.iter().any(|l| self.focus.contains(l.as_ref()));
        }
        !labels.iter().any(|l| self.skip.contains(l.as_ref()))
    }
}
