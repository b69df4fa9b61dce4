//! Structural matcher over JSON values.
//!
//! A pattern is written in the same JSON shape as the data it checks:
//!
//! - scalars match by equality (numbers numerically)
//! - arrays match element by element and must have the same length
//! - objects match only the keys they name; extra keys in the data are fine
//! - objects whose keys are all `$` operators (`$exists`, `$regexp`,
//!   `$match`, `$len`) describe a single value and combine with AND
//!
//! Matching never stops at the first mismatch. Every failure is collected
//! into a tree of [`MatchFailure`] nodes keyed by `.field` and `[index]`.

mod compile;
pub mod error;
pub mod failure;

pub use error::MatcherError;
pub use failure::{render_failures, MatchFailure};

use regex::Regex;
use serde_json::{Number, Value};

/// Matcher for one named field of an object.
#[derive(Debug, Clone)]
pub struct FieldMatcher {
    pub key: String,
    /// Whether the field has to be present.
    pub exists: bool,
    pub matcher: Matcher,
}

/// A compiled pattern.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// String or boolean equality.
    Equal(Value),
    /// Numeric equality. Integers compare exactly.
    Number(Number),
    /// The value must be null.
    Null,
    Regexp(Regex),
    /// Length of a string, array or object.
    Len(usize),
    /// Positional array match with a strict length.
    Elements(Vec<Matcher>),
    /// Partial object match.
    Fields(Vec<FieldMatcher>),
    /// Conjunction of special operators. Empty means "anything".
    All(Vec<Matcher>),
}

/// Integers compare as `i64`/`u64`, anything with a fraction as `f64`.
fn numbers_equal(expected: &Number, actual: &Number) -> bool {
    if expected.is_f64() || actual.is_f64() {
        return expected.as_f64() == actual.as_f64();
    }
    match (expected.as_i64(), actual.as_i64()) {
        (Some(x), Some(y)) => x == y,
        _ => expected.as_u64().is_some() && expected.as_u64() == actual.as_u64(),
    }
}

fn describe(value: &Value) -> String {
    value.to_string()
}

impl Matcher {
    /// Compiles a decoded JSON pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use aloe::matcher::Matcher;
    /// use serde_json::json;
    ///
    /// let m = Matcher::from_pattern(&json!({"status": {"$regexp": "^ok"}})).unwrap();
    /// assert!(m.matches(&json!({"status": "okay", "extra": 1})).is_ok());
    /// assert!(m.matches(&json!({"status": "error"})).is_err());
    /// ```
    pub fn from_pattern(pattern: &Value) -> Result<Self, MatcherError> {
        compile::compile(pattern)
    }

    /// Parses pattern text as JSON and compiles it.
    pub fn parse(pattern: &str) -> Result<Self, MatcherError> {
        let value: Value =
            serde_json::from_str(pattern).map_err(|e| MatcherError::InvalidJson(e.to_string()))?;
        Self::from_pattern(&value)
    }

    /// Checks `actual`, returning every mismatch found.
    pub fn matches(&self, actual: &Value) -> Result<(), Vec<MatchFailure>> {
        let failures = self.check(actual);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }

    fn check(&self, actual: &Value) -> Vec<MatchFailure> {
        match self {
            Matcher::Equal(expected) => {
                if expected == actual {
                    Vec::new()
                } else {
                    vec![MatchFailure::new(format!(
                        "expected {}, actual: {}",
                        describe(expected),
                        describe(actual)
                    ))]
                }
            }
            Matcher::Number(expected) => match actual {
                Value::Number(n) if numbers_equal(expected, n) => Vec::new(),
                _ => vec![MatchFailure::new(format!(
                    "expected number {}, actual: {}",
                    expected,
                    describe(actual)
                ))],
            },
            Matcher::Null => {
                if actual.is_null() {
                    Vec::new()
                } else {
                    vec![MatchFailure::new(format!(
                        "expected null, actual: {}",
                        describe(actual)
                    ))]
                }
            }
            Matcher::Regexp(re) => match actual.as_str() {
                Some(s) if re.is_match(s) => Vec::new(),
                Some(s) => vec![MatchFailure::new(format!(
                    "expected {:?} to match regexp {:?}",
                    s,
                    re.as_str()
                ))],
                None => vec![MatchFailure::new(format!(
                    "regexp {:?} needs a string, actual: {}",
                    re.as_str(),
                    describe(actual)
                ))],
            },
            Matcher::Len(expected) => {
                let len = match actual {
                    Value::String(s) => Some(s.chars().count()),
                    Value::Array(items) => Some(items.len()),
                    Value::Object(fields) => Some(fields.len()),
                    _ => None,
                };
                match len {
                    Some(n) if n == *expected => Vec::new(),
                    Some(n) => vec![MatchFailure::new(format!(
                        "unexpected length, expected: {}, actual: {}",
                        expected, n
                    ))],
                    None => vec![MatchFailure::new(format!(
                        "can't take length of {}",
                        describe(actual)
                    ))],
                }
            }
            Matcher::Elements(matchers) => {
                let Some(items) = actual.as_array() else {
                    return vec![MatchFailure::new(format!(
                        "expected array, actual: {}",
                        describe(actual)
                    ))];
                };
                if items.len() != matchers.len() {
                    return vec![MatchFailure::new(format!(
                        "unexpected slice length, expected: {}, actual: {}",
                        matchers.len(),
                        items.len()
                    ))];
                }
                matchers
                    .iter()
                    .zip(items)
                    .enumerate()
                    .filter_map(|(i, (m, item))| {
                        let failures = m.check(item);
                        (!failures.is_empty())
                            .then(|| MatchFailure::nested(format!("[{}]", i), failures))
                    })
                    .collect()
            }
            Matcher::Fields(fields) => {
                let Some(object) = actual.as_object() else {
                    return vec![MatchFailure::new(format!(
                        "expected object, actual: {}",
                        describe(actual)
                    ))];
                };
                let mut failures = Vec::new();
                for field in fields {
                    let segment = format!(".{}", field.key);
                    let value = object.get(&field.key);
                    if value.is_some() != field.exists {
                        failures.push(MatchFailure::nested(
                            segment,
                            vec![MatchFailure::new(format!(
                                "field existence err, expected: {}, actual: {}",
                                field.exists,
                                value.is_some()
                            ))],
                        ));
                        continue;
                    }
                    if let Some(value) = value {
                        let nested = field.matcher.check(value);
                        if !nested.is_empty() {
                            failures.push(MatchFailure::nested(segment, nested));
                        }
                    }
                }
                failures
            }
            Matcher::All(matchers) => matchers.iter().flat_map(|m| m.check(actual)).collect(),
        }
    }
}
