//! Template engine.
//!
//! Templates are strings with `%{...}` scripts. A script is either a
//! variable reference with an optional dotted path (`%{user.roles.[0]}`) or
//! a function call (`%{random(`[a-z]{5}`)}`). `%%` renders a literal `%`.
//!
//! Templates are parsed once, when constructed or deserialized, so syntax
//! errors surface while loading test data rather than mid-run.

pub mod error;
pub mod functions;
pub mod lexer;

pub use error::TemplateError;
pub use functions::{Argument, FunctionRegistry, TemplateFunction};
pub use lexer::{tokenize, Lexer, Token};

use crate::variables::{parse_path, VariableMap};
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

static BUILTIN_FUNCTIONS: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::with_builtins);

/// Returns the shared registry of built-in functions.
pub fn builtin_functions() -> &'static FunctionRegistry {
    &BUILTIN_FUNCTIONS
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ArgRef {
    Literal(String),
    Variable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Variable(String),
    Call { name: String, args: Vec<ArgRef> },
}

/// A parsed template.
#[derive(Clone)]
pub struct Template {
    raw: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parses a template.
    ///
    /// # Examples
    ///
    /// ```
    /// use aloe::template::Template;
    /// use aloe::variables::VariableMap;
    ///
    /// let mut vars = VariableMap::new();
    /// vars.set("id", 42);
    ///
    /// let template = Template::parse("/users/%{id}").unwrap();
    /// assert_eq!(template.render(&vars).unwrap(), "/users/42");
    /// ```
    pub fn parse(raw: impl Into<String>) -> Result<Self, TemplateError> {
        let raw = raw.into();
        let mut segments = Vec::new();
        for token in tokenize(&raw)? {
            match token {
                Token::Text(text) => segments.push(Segment::Text(text)),
                Token::VariableName(name) => segments.push(Segment::Variable(name)),
                Token::FuncName(name) => segments.push(Segment::Call {
                    name,
                    args: Vec::new(),
                }),
                Token::Arg(literal) => push_arg(&mut segments, ArgRef::Literal(literal)),
                Token::ArgVariable(name) => push_arg(&mut segments, ArgRef::Variable(name)),
            }
        }
        Ok(Self { raw, segments })
    }

    /// Wraps literal text, escaping any `%` so it renders unchanged.
    pub fn literal(text: &str) -> Self {
        Self {
            raw: text.replace('%', "%%"),
            segments: vec![Segment::Text(text.to_string())],
        }
    }

    /// Returns the source text of the template.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Renders against `vars` with the built-in functions.
    pub fn render(&self, vars: &VariableMap) -> Result<String, TemplateError> {
        self.render_with(vars, builtin_functions())
    }

    /// Renders against `vars`, resolving calls through `functions`.
    ///
    /// A plain reference to an undefined variable is an error. Function
    /// arguments that don't resolve are passed as absent and left for the
    /// function to judge.
    pub fn render_with(
        &self,
        vars: &VariableMap,
        functions: &FunctionRegistry,
    ) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Variable(name) => {
                    let value = vars
                        .select(&parse_path(name))
                        .map_err(|source| TemplateError::Variable {
                            name: name.clone(),
                            source,
                        })?;
                    out.push_str(&value.to_string());
                }
                Segment::Call { name, args } => {
                    let args: Vec<Argument> = args
                        .iter()
                        .map(|arg| match arg {
                            ArgRef::Literal(text) => Argument::Literal(text.clone()),
                            ArgRef::Variable(path) => Argument::Variable {
                                name: path.clone(),
                                value: vars.select(&parse_path(path)).ok(),
                            },
                        })
                        .collect();
                    out.push_str(&functions.call(name, &args)?);
                }
            }
        }
        Ok(out)
    }
}

fn push_arg(segments: &mut [Segment], arg: ArgRef) {
    if let Some(Segment::Call { args, .. }) = segments.last_mut() {
        args.push(arg);
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::literal("")
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Template {}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Template({:?})", self.raw)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::parse(s)
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Template source as written in a data file. Scalars other than strings
/// are accepted in their text form, and mappings or sequences are encoded
/// as JSON so a response body pattern can be written as plain YAML.
#[derive(Deserialize)]
#[serde(untagged)]
enum TemplateSource {
    Text(String),
    Structured(serde_json::Value),
}

impl<'de> Deserialize<'de> for Template {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = match TemplateSource::deserialize(deserializer)? {
            TemplateSource::Text(text) => text,
            TemplateSource::Structured(serde_json::Value::Null) => String::new(),
            TemplateSource::Structured(value) => value.to_string(),
        };
        Template::parse(raw).map_err(serde::de::Error::custom)
    }
}
