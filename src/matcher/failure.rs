//! Nested match diagnostics.

use std::fmt;

/// One node of a mismatch report.
///
/// Leaves carry a message. Inner nodes carry the path segment (`.field` or
/// `[index]`) under which their children failed, so a whole report renders as
/// an indented tree:
///
/// ```text
/// .items
///   [1]
///     .id
///       expected 2, actual: 3
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFailure {
    pub segment: String,
    pub message: Option<String>,
    pub children: Vec<MatchFailure>,
}

impl MatchFailure {
    /// Creates a leaf failure.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            segment: String::new(),
            message: Some(message.into()),
            children: Vec::new(),
        }
    }

    /// Groups failures under a path segment.
    pub fn nested(segment: impl Into<String>, children: Vec<MatchFailure>) -> Self {
        Self {
            segment: segment.into(),
            message: None,
            children,
        }
    }

    /// Counts the leaf failures in this subtree.
    pub fn leaf_count(&self) -> usize {
        if self.children.is_empty() {
            1
        } else {
            self.children.iter().map(MatchFailure::leaf_count).sum()
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        let child_depth = match (self.segment.is_empty(), &self.message) {
            (true, Some(message)) => {
                writeln!(f, "{}{}", indent, message)?;
                depth + 1
            }
            (true, None) => depth,
            (false, Some(message)) => {
                writeln!(f, "{}{}: {}", indent, self.segment, message)?;
                depth + 1
            }
            (false, None) => {
                writeln!(f, "{}{}", indent, self.segment)?;
                depth + 1
            }
        };
        for child in &self.children {
            child.write_indented(f, child_depth)?;
        }
        Ok(())
    }
}

impl fmt::Display for MatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// Renders a list of failures one after another.
pub fn render_failures(failures: &[MatchFailure]) -> String {
    failures.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_nested_tree() {
        let failure = MatchFailure::nested(
            ".items",
            vec![MatchFailure::nested(
                "[1]",
                vec![
                    MatchFailure::nested(".id", vec![MatchFailure::new("expected 2, actual: 3")]),
                    MatchFailure::nested(".name", vec![MatchFailure::new("missing")]),
                ],
            )],
        );
        assert_eq!(
            failure.to_string(),
            ".items\n  [1]\n    .id\n      expected 2, actual: 3\n    .name\n      missing\n"
        );
        assert_eq!(failure.leaf_count(), 2);
    }

    #[test]
    fn test_render_flat_list() {
        let failures = vec![MatchFailure::new("first"), MatchFailure::new("second")];
        assert_eq!(render_failures(&failures), "first\nsecond\n");
    }
}
