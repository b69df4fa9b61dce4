//! Compiles a JSON pattern into a [`Matcher`] tree.

use super::{FieldMatcher, Matcher, MatcherError};
use regex::Regex;
use serde_json::{Map, Value};

const EXISTS: &str = "$exists";
const REGEXP: &str = "$regexp";
const MATCH: &str = "$match";
const LEN: &str = "$len";

/// A compiled pattern node plus the existence it demands of its field.
struct Compiled {
    matcher: Matcher,
    exists: bool,
}

pub(super) fn compile(pattern: &Value) -> Result<Matcher, MatcherError> {
    compile_value(pattern, "$")
}

/// Compiles a node that isn't an object field, so it can't demand absence.
fn compile_value(pattern: &Value, path: &str) -> Result<Matcher, MatcherError> {
    let compiled = compile_node(pattern, path)?;
    if !compiled.exists {
        return Err(MatcherError::ExistsFalseOutsideField(path.to_string()));
    }
    Ok(compiled.matcher)
}

fn compile_node(pattern: &Value, path: &str) -> Result<Compiled, MatcherError> {
    let matcher = match pattern {
        Value::Null => Matcher::Null,
        Value::Bool(_) | Value::String(_) => Matcher::Equal(pattern.clone()),
        Value::Number(n) => Matcher::Number(n.clone()),
        Value::Array(items) => Matcher::Elements(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| compile_value(item, &format!("{}[{}]", path, i)))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(fields) => return compile_object(fields, path),
    };
    Ok(Compiled {
        matcher,
        exists: true,
    })
}

fn compile_object(fields: &Map<String, Value>, path: &str) -> Result<Compiled, MatcherError> {
    let special = fields.keys().filter(|k| k.starts_with('$')).count();
    if special == 0 {
        let mut matchers = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            let compiled = compile_node(value, &format!("{}.{}", path, key))?;
            matchers.push(FieldMatcher {
                key: key.clone(),
                exists: compiled.exists,
                matcher: compiled.matcher,
            });
        }
        return Ok(Compiled {
            matcher: Matcher::Fields(matchers),
            exists: true,
        });
    }
    if special != fields.len() {
        return Err(MatcherError::MixedKeys(path.to_string()));
    }
    compile_special(fields, path)
}

fn compile_special(fields: &Map<String, Value>, path: &str) -> Result<Compiled, MatcherError> {
    let mut exists = true;
    let mut matchers = Vec::new();

    for (key, value) in fields {
        match key.as_str() {
            EXISTS => {
                exists = value
                    .as_bool()
                    .ok_or_else(|| MatcherError::InvalidExists(path.to_string()))?;
            }
            REGEXP => {
                let pattern = value.as_str().ok_or_else(|| MatcherError::InvalidRegexp {
                    path: path.to_string(),
                    message: "expected a string".to_string(),
                })?;
                let re = Regex::new(pattern).map_err(|e| MatcherError::InvalidRegexp {
                    path: path.to_string(),
                    message: e.to_string(),
                })?;
                matchers.push(Matcher::Regexp(re));
            }
            MATCH => matchers.push(compile_value(value, path)?),
            LEN => {
                let len = value
                    .as_u64()
                    .ok_or_else(|| MatcherError::InvalidLen(path.to_string()))?;
                matchers.push(Matcher::Len(len as usize));
            }
            other => {
                return Err(MatcherError::UnknownOperator {
                    key: other.to_string(),
                    path: path.to_string(),
                })
            }
        }
    }

    if !exists && fields.len() > 1 {
        return Err(MatcherError::ExistsFalseWithOperators(path.to_string()));
    }

    Ok(Compiled {
        matcher: Matcher::All(matchers),
        exists,
    })
}
