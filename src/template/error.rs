//! Template parsing and rendering errors.

use crate::variables::VarError;
use thiserror::Error;

/// Errors raised while lexing, parsing or rendering a template.
///
/// Offsets are character positions in the raw template text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A `%{` script was never closed.
    #[error("unclosed script at offset {0}, missing '}}'")]
    UnclosedScript(usize),

    /// A bare `%` was followed by something other than `%` or `{`.
    #[error("unrecognized token at offset {0}, only %% and %{{ is allowed")]
    UnrecognizedToken(usize),

    /// A function argument list was never closed.
    #[error("unclosed argument list at offset {0}, missing ')'")]
    UnclosedArguments(usize),

    /// A backtick-quoted argument was never closed.
    #[error("unclosed quote ` at offset {0}")]
    UnclosedQuote(usize),

    /// A variable, function or argument name is empty.
    #[error("empty name at offset {0}")]
    EmptyName(usize),

    /// A character that can't appear at this point of a script.
    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    /// A plain variable reference could not be resolved.
    #[error("can't render variable {name}: {source}")]
    Variable {
        name: String,
        #[source]
        source: VarError,
    },

    #[error("unknown function {0}")]
    UnknownFunction(String),

    #[error("function {0} is already registered")]
    DuplicateFunction(String),

    /// A function rejected its arguments or failed to evaluate.
    #[error("function {name}: {message}")]
    Function { name: String, message: String },
}

impl TemplateError {
    pub(crate) fn function(name: &str, message: impl Into<String>) -> Self {
        TemplateError::Function {
            name: name.to_string(),
            message: message.into(),
        }
    }
}
