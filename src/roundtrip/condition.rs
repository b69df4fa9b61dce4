//! Evaluation of `when` conditions.
//!
//! Expressions are evaluated with `rhai`. Every identifier in the expression
//! is bound to a string: the rendered `args` entry of that name, else the
//! scope variable's string form, else `""`. `int()` and `bool()` convert
//! those strings for arithmetic and logic.

use super::error::RoundTripError;
use super::render::When;
use crate::variables::VariableMap;
use once_cell::sync::Lazy;
use regex::Regex;
use rhai::{Dynamic, Engine, EvalAltResult, ImmutableString, Scope};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|[A-Za-z_][A-Za-z0-9_]*"#).expect("identifier pattern is valid")
});

const RESERVED: &[&str] = &[
    "true", "false", "int", "bool", "if", "else", "let", "const", "fn", "in", "return", "this",
];

static ENGINE: Lazy<Engine> = Lazy::new(|| {
    let mut engine = Engine::new();
    engine.register_fn("int", parse_int);
    engine.register_fn("int", |n: i64| n);
    engine.register_fn("bool", parse_bool);
    engine.register_fn("bool", |b: bool| b);
    engine
});

fn parse_int(s: ImmutableString) -> Result<i64, Box<EvalAltResult>> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| format!("can't convert {:?} to int", s.as_str()).into())
}

fn parse_bool(s: ImmutableString) -> Result<bool, Box<EvalAltResult>> {
    match s.as_str() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        other => Err(format!("can't convert {:?} to bool", other).into()),
    }
}

/// Returns the identifiers referenced by `expr`, skipping string literals.
fn identifiers(expr: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for m in IDENTIFIER.find_iter(expr) {
        let name = m.as_str();
        if name.starts_with('"') || RESERVED.contains(&name) || names.contains(&name) {
            continue;
        }
        names.push(name);
    }
    names
}

/// Evaluates `when` against `vars`. A non-boolean result is an error.
pub fn evaluate(when: &When, vars: &VariableMap) -> Result<bool, RoundTripError> {
    let mut scope = Scope::new();
    let mut bound = Vec::new();
    for name in identifiers(&when.expr) {
        let value = match when.args.get(name) {
            Some(arg) => arg.clone(),
            None => vars.get(name).map(ToString::to_string).unwrap_or_default(),
        };
        bound.push(format!("{}={:?}", name, value));
        scope.push(name.to_string(), value);
    }

    let condition_error = |message: String| RoundTripError::Condition {
        expr: when.expr.clone(),
        message,
    };

    let result: Dynamic = ENGINE
        .eval_expression_with_scope(&mut scope, &when.expr)
        .map_err(|e| {
            log::info!(
                "failed by condition `{}`, args: [{}]",
                when.expr,
                bound.join(", ")
            );
            condition_error(e.to_string())
        })?;

    let matched = result.as_bool().map_err(|kind| {
        condition_error(format!("when condition must evaluate to a bool, got {}", kind))
    })?;
    if !matched {
        log::info!("skip by condition `{}`, args: [{}]", when.expr, bound.join(", "));
    }
    Ok(matched)
}
