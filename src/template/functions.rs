//! Template functions.
//!
//! Functions are looked up by name in a [`FunctionRegistry`]. The built-in
//! set is `random`, `exist`, `select`, `len`, `uuid` and `timestamp`;
//! embedders can register more at startup.

use super::TemplateError;
use crate::variables::{parse_path, Variable};
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Default upper bound for unbounded repetitions in `random` patterns.
pub const DEFAULT_RANDOM_LIMIT: u32 = 10;

/// An evaluated function argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// A literal written in the template.
    Literal(String),
    /// A variable reference. `value` is `None` when the path doesn't resolve.
    Variable {
        name: String,
        value: Option<Variable>,
    },
}

impl Argument {
    /// Returns the value this argument denotes. Literals become strings.
    pub fn value(&self) -> Option<Variable> {
        match self {
            Argument::Literal(text) => Some(Variable::String(text.clone())),
            Argument::Variable { value, .. } => value.clone(),
        }
    }

    /// Returns the text form: the literal itself or the variable's
    /// canonical string.
    pub fn text(&self) -> Option<String> {
        match self {
            Argument::Literal(text) => Some(text.clone()),
            Argument::Variable { value, .. } => value.as_ref().map(Variable::to_string),
        }
    }
}

/// A function callable from a template as `%{name(args...)}`.
pub trait TemplateFunction: Send + Sync {
    fn call(&self, args: &[Argument]) -> Result<String, TemplateError>;
}

impl<F> TemplateFunction for F
where
    F: Fn(&[Argument]) -> Result<String, TemplateError> + Send + Sync,
{
    fn call(&self, args: &[Argument]) -> Result<String, TemplateError> {
        self(args)
    }
}

/// Name-to-function table consulted while rendering.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn TemplateFunction>>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, fn(&[Argument]) -> Result<String, TemplateError>); 6] = [
            ("random", random),
            ("exist", exist),
            ("select", select),
            ("len", len),
            ("uuid", new_uuid),
            ("timestamp", timestamp),
        ];
        for (name, function) in builtins {
            registry
                .functions
                .insert(name.to_string(), Arc::new(function));
        }
        registry
    }

    /// Adds a function. Names must be unique.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        function: impl TemplateFunction + 'static,
    ) -> Result<(), TemplateError> {
        let name = name.into();
        if self.functions.contains_key(&name) {
            return Err(TemplateError::DuplicateFunction(name));
        }
        self.functions.insert(name, Arc::new(function));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Invokes the function registered as `name`.
    pub fn call(&self, name: &str, args: &[Argument]) -> Result<String, TemplateError> {
        self.functions
            .get(name)
            .ok_or_else(|| TemplateError::UnknownFunction(name.to_string()))?
            .call(args)
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}

fn check_arity(name: &str, args: &[Argument], min: usize, max: usize) -> Result<(), TemplateError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            format!("{}", min)
        } else {
            format!("{} to {}", min, max)
        };
        return Err(TemplateError::function(
            name,
            format!("expected {} arguments, got {}", expected, args.len()),
        ));
    }
    Ok(())
}

/// `random(pattern[, limit])`: a random string matching `pattern`.
fn random(args: &[Argument]) -> Result<String, TemplateError> {
    check_arity("random", args, 1, 2)?;
    let pattern = args[0]
        .text()
        .ok_or_else(|| TemplateError::function("random", "pattern is not defined"))?;
    let limit = match args.get(1).and_then(Argument::text) {
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| TemplateError::function("random", format!("invalid limit {:?}", raw)))?,
        None => DEFAULT_RANDOM_LIMIT,
    };

    let generator = rand_regex::Regex::compile(&pattern, limit)
        .map_err(|e| TemplateError::function("random", e.to_string()))?;
    Ok(rand::thread_rng().sample::<String, _>(&generator))
}

/// `exist(var[, selector])`: `"true"` if the value is present and not null.
fn exist(args: &[Argument]) -> Result<String, TemplateError> {
    check_arity("exist", args, 1, 2)?;
    let mut value = args[0].value();
    if let Some(selector) = args.get(1).and_then(Argument::text) {
        value = value.and_then(|v| v.select(&parse_path(&selector)).ok());
    }
    Ok(value.is_some_and(|v| !v.is_null()).to_string())
}

/// `select(var, selector)`: the value at a sub-path, or `""` if absent.
fn select(args: &[Argument]) -> Result<String, TemplateError> {
    check_arity("select", args, 2, 2)?;
    let selected = match (args[0].value(), args[1].text()) {
        (Some(value), Some(selector)) => value.select(&parse_path(&selector)).ok(),
        _ => None,
    };
    Ok(selected.map(|v| v.to_string()).unwrap_or_default())
}

/// `len(var)`: element or key count of an array or object.
fn len(args: &[Argument]) -> Result<String, TemplateError> {
    check_arity("len", args, 1, 1)?;
    let value = match &args[0] {
        Argument::Variable { name, value: None } => {
            return Err(TemplateError::function("len", format!("undefined variable {}", name)))
        }
        other => other.value().unwrap_or_default(),
    };
    value
        .len()
        .map(|n| n.to_string())
        .map_err(|e| TemplateError::function("len", e.to_string()))
}

fn new_uuid(args: &[Argument]) -> Result<String, TemplateError> {
    check_arity("uuid", args, 0, 0)?;
    Ok(uuid::Uuid::new_v4().to_string())
}

/// `timestamp()`: current Unix time in seconds.
fn timestamp(args: &[Argument]) -> Result<String, TemplateError> {
    check_arity("timestamp", args, 0, 0)?;
    Ok(chrono::Utc::now().timestamp().to_string())
}
