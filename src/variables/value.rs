//! The typed, JSON-shaped variable value.
//!
//! A [`Variable`] is a tagged union over the six JSON kinds. Scalars are
//! leaves; arrays and objects can be walked with [`Variable::select`] using a
//! path such as `items.[0].id`. Typed accessors (`as_str`, `as_i64`, ...)
//! return an error on a kind mismatch instead of coercing.

use super::VarError;
use indexmap::IndexMap;
use serde_json::{Number, Value};
use std::fmt;

/// Path segment returning the element or key count of the current value.
pub const LENGTH_SELECTOR: &str = "#";

/// The kind of a [`Variable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableType {
    String,
    Number,
    Boolean,
    Null,
    Array,
    Object,
}

impl VariableType {
    /// Returns the lowercase name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::String => "string",
            VariableType::Number => "number",
            VariableType::Boolean => "boolean",
            VariableType::Null => "null",
            VariableType::Array => "array",
            VariableType::Object => "object",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A JSON-shaped value bound to a name in a [`VariableMap`](super::VariableMap).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Variable {
    String(String),
    Number(Number),
    Boolean(bool),
    #[default]
    Null,
    Array(Vec<Variable>),
    Object(IndexMap<String, Variable>),
}

impl Variable {
    /// Returns the kind of this value.
    pub fn kind(&self) -> VariableType {
        match self {
            Variable::String(_) => VariableType::String,
            Variable::Number(_) => VariableType::Number,
            Variable::Boolean(_) => VariableType::Boolean,
            Variable::Null => VariableType::Null,
            Variable::Array(_) => VariableType::Array,
            Variable::Object(_) => VariableType::Object,
        }
    }

    /// Converts a decoded JSON value into a variable, keeping key order.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Variable::Null,
            Value::Bool(b) => Variable::Boolean(b),
            Value::Number(n) => Variable::Number(n),
            Value::String(s) => Variable::String(s),
            Value::Array(items) => Variable::Array(items.into_iter().map(Variable::from_json).collect()),
            Value::Object(fields) => Variable::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Variable::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts this variable back into a JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            Variable::Null => Value::Null,
            Variable::Boolean(b) => Value::Bool(*b),
            Variable::Number(n) => Value::Number(n.clone()),
            Variable::String(s) => Value::String(s.clone()),
            Variable::Array(items) => Value::Array(items.iter().map(Variable::to_json).collect()),
            Variable::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Variable::Null)
    }

    fn mismatch(&self, expected: &'static str) -> VarError {
        VarError::TypeMismatch {
            expected,
            found: self.kind().as_str(),
        }
    }

    /// Returns the string payload, or an error for any other kind.
    pub fn as_str(&self) -> Result<&str, VarError> {
        match self {
            Variable::String(s) => Ok(s),
            _ => Err(self.mismatch("string")),
        }
    }

    /// Returns the integer payload.
    ///
    /// Floating point numbers are rejected rather than truncated.
    pub fn as_i64(&self) -> Result<i64, VarError> {
        match self {
            Variable::Number(n) => n.as_i64().ok_or(VarError::TypeMismatch {
                expected: "integer",
                found: "number",
            }),
            _ => Err(self.mismatch("integer")),
        }
    }

    pub fn as_f64(&self) -> Result<f64, VarError> {
        match self {
            Variable::Number(n) => n.as_f64().ok_or(self.mismatch("number")),
            _ => Err(self.mismatch("number")),
        }
    }

    pub fn as_bool(&self) -> Result<bool, VarError> {
        match self {
            Variable::Boolean(b) => Ok(*b),
            _ => Err(self.mismatch("boolean")),
        }
    }

    pub fn as_array(&self) -> Result<&[Variable], VarError> {
        match self {
            Variable::Array(items) => Ok(items),
            _ => Err(self.mismatch("array")),
        }
    }

    pub fn as_object(&self) -> Result<&IndexMap<String, Variable>, VarError> {
        match self {
            Variable::Object(fields) => Ok(fields),
            _ => Err(self.mismatch("object")),
        }
    }

    /// Returns the element count of an array or the key count of an object.
    pub fn len(&self) -> Result<usize, VarError> {
        match self {
            Variable::Array(items) => Ok(items.len()),
            Variable::Object(fields) => Ok(fields.len()),
            other => Err(VarError::NotMeasurable(other.kind().as_str())),
        }
    }

    /// Walks a path through nested objects and arrays.
    ///
    /// Object segments are keys. Array segments are integer indexes written
    /// either bare (`0`) or bracketed (`[0]`). The `#` segment yields the
    /// length of the current value as a number. An empty path returns a copy
    /// of the value itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use aloe::variables::Variable;
    /// use serde_json::json;
    ///
    /// let v = Variable::from_json(json!({"items": [{"id": 7}, {"id": 8}]}));
    /// assert_eq!(v.select(&["items", "[1]", "id"]).unwrap(), Variable::from(8));
    /// assert_eq!(v.select(&["items", "#"]).unwrap(), Variable::from(2));
    /// ```
    pub fn select<S: AsRef<str>>(&self, path: &[S]) -> Result<Variable, VarError> {
        let Some((head, rest)) = path.split_first() else {
            return Ok(self.clone());
        };
        let segment = head.as_ref();

        if segment == LENGTH_SELECTOR {
            let len = self.len()?;
            return Variable::from(len as u64).select(rest);
        }

        match self {
            Variable::Object(fields) => fields
                .get(segment)
                .ok_or_else(|| VarError::MissingKey {
                    key: segment.to_string(),
                })?
                .select(rest),
            Variable::Array(items) => {
                let index = parse_index(segment)?;
                items
                    .get(index)
                    .ok_or(VarError::IndexOutOfRange {
                        index,
                        len: items.len(),
                    })?
                    .select(rest)
            }
            other => Err(VarError::NotTraversable {
                segment: segment.to_string(),
                kind: other.kind().as_str(),
            }),
        }
    }
}

/// Parses an array segment written as `3` or `[3]`.
fn parse_index(segment: &str) -> Result<usize, VarError> {
    let inner = segment
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(segment);
    inner.trim().parse::<usize>().map_err(|_| VarError::InvalidIndex {
        segment: segment.to_string(),
    })
}

/// Splits a dotted path such as `user.roles[0].name` into selector segments.
///
/// Both `.` and `,` separate segments, and an index glued to a key
/// (`roles[0]`) is split off as its own `[0]` segment.
pub fn parse_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    for part in path.split(['.', ',']).map(str::trim).filter(|p| !p.is_empty()) {
        match part.find('[') {
            Some(pos) if pos > 0 => {
                segments.push(part[..pos].to_string());
                let mut rest = &part[pos..];
                while let Some(end) = rest.find(']') {
                    segments.push(rest[..=end].to_string());
                    rest = &rest[end + 1..];
                }
                if !rest.is_empty() {
                    segments.push(rest.to_string());
                }
            }
            _ => segments.push(part.to_string()),
        }
    }
    segments
}

impl fmt::Display for Variable {
    /// Canonical string form used for template substitution.
    ///
    /// Strings render raw (unquoted); composite values render as compact JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::String(s) => f.write_str(s),
            Variable::Number(n) => write!(f, "{}", n),
            Variable::Boolean(b) => write!(f, "{}", b),
            Variable::Null => f.write_str("null"),
            composite => write!(f, "{}", composite.to_json()),
        }
    }
}

impl From<Value> for Variable {
    fn from(value: Value) -> Self {
        Variable::from_json(value)
    }
}

impl From<&str> for Variable {
    fn from(value: &str) -> Self {
        Variable::String(value.to_string())
    }
}

impl From<String> for Variable {
    fn from(value: String) -> Self {
        Variable::String(value)
    }
}

impl From<bool> for Variable {
    fn from(value: bool) -> Self {
        Variable::Boolean(value)
    }
}

impl From<i64> for Variable {
    fn from(value: i64) -> Self {
        Variable::Number(value.into())
    }
}

impl From<i32> for Variable {
    fn from(value: i32) -> Self {
        Variable::Number(value.into())
    }
}

impl From<u64> for Variable {
    fn from(value: u64) -> Self {
        Variable::Number(value.into())
    }
}

impl From<u16> for Variable {
    fn from(value: u16) -> Self {
        Variable::Number(value.into())
    }
}

impl From<f64> for Variable {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
            .map(Variable::Number)
            .unwrap_or(Variable::Null)
    }
}

impl From<Vec<Variable>> for Variable {
    fn from(value: Vec<Variable>) -> Self {
        Variable::Array(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Variable {
        Variable::from_json(json!({
            "name": "aloe",
            "count": 3,
            "ratio": 0.5,
            "active": true,
            "owner": null,
            "tags": ["a", "b"],
            "nested": {"items": [{"id": 1}, {"id": 2}]}
        }))
    }

    #[test]
    fn test_kind() {
        let v = sample();
        assert_eq!(v.kind(), VariableType::Object);
        assert_eq!(v.select(&["tags"]).unwrap().kind(), VariableType::Array);
        assert_eq!(v.select(&["owner"]).unwrap().kind(), VariableType::Null);
    }

    #[test]
    fn test_select_nested_path() {
        let v = sample();
        assert_eq!(
            v.select(&["nested", "items", "[1]", "id"]).unwrap(),
            Variable::from(2)
        );
        assert_eq!(
            v.select(&["nested", "items", "0", "id"]).unwrap(),
            Variable::from(1)
        );
    }

    #[test]
    fn test_select_length_selector() {
        let v = sample();
        assert_eq!(v.select(&["tags", "#"]).unwrap(), Variable::from(2u64));
        assert_eq!(v.select(&["#"]).unwrap(), Variable::from(7u64));
    }

    #[test]
    fn test_select_errors() {
        let v = sample();
        assert_eq!(
            v.select(&["missing"]),
            Err(VarError::MissingKey {
                key: "missing".to_string()
            })
        );
        assert_eq!(
            v.select(&["tags", "[5]"]),
            Err(VarError::IndexOutOfRange { index: 5, len: 2 })
        );
        assert_eq!(
            v.select(&["tags", "first"]),
            Err(VarError::InvalidIndex {
                segment: "first".to_string()
            })
        );
        assert!(matches!(
            v.select(&["name", "x"]),
            Err(VarError::NotTraversable { kind: "string", .. })
        ));
        assert!(matches!(
            v.select(&["owner", "x"]),
            Err(VarError::NotTraversable { kind: "null", .. })
        ));
    }

    #[test]
    fn test_select_empty_path_returns_self() {
        let v = Variable::from("x");
        let empty: [&str; 0] = [];
        assert_eq!(v.select(&empty).unwrap(), v);
    }

    #[test]
    fn test_typed_accessors() {
        let v = sample();
        assert_eq!(v.select(&["name"]).unwrap().as_str().unwrap(), "aloe");
        assert_eq!(v.select(&["count"]).unwrap().as_i64().unwrap(), 3);
        assert_eq!(v.select(&["ratio"]).unwrap().as_f64().unwrap(), 0.5);
        assert!(v.select(&["active"]).unwrap().as_bool().unwrap());
        assert_eq!(v.select(&["tags"]).unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_typed_accessor_mismatch() {
        let v = sample();
        assert_eq!(
            v.select(&["name"]).unwrap().as_i64(),
            Err(VarError::TypeMismatch {
                expected: "integer",
                found: "string"
            })
        );
        assert!(v.select(&["ratio"]).unwrap().as_i64().is_err());
        assert!(v.select(&["count"]).unwrap().as_bool().is_err());
    }

    #[test]
    fn test_len_only_for_composites() {
        assert_eq!(sample().len().unwrap(), 7);
        assert_eq!(
            Variable::from("abc").len(),
            Err(VarError::NotMeasurable("string"))
        );
    }

    #[test]
    fn test_display_canonical_form() {
        assert_eq!(Variable::from("plain").to_string(), "plain");
        assert_eq!(Variable::from(42).to_string(), "42");
        assert_eq!(Variable::from(true).to_string(), "true");
        assert_eq!(Variable::Null.to_string(), "null");
        assert_eq!(
            Variable::from_json(json!({"a": [1, "x"]})).to_string(),
            r#"{"a":[1,"x"]}"#
        );
    }

    #[test]
    fn test_parse_path() {
        assert_eq!(parse_path("a.b.[0]"), vec!["a", "b", "[0]"]);
        assert_eq!(parse_path("user.roles[0].name"), vec!["user", "roles", "[0]", "name"]);
        assert_eq!(parse_path("items,#"), vec!["items", "#"]);
        assert!(parse_path("").is_empty());
    }
}
