//! Round-trip error types.

use crate::executor::RequestError;
use crate::matcher::{render_failures, MatchFailure, MatcherError};
use crate::template::TemplateError;
use std::fmt;
use thiserror::Error;

/// Errors raised while rendering, sending or checking a round trip.
#[derive(Debug, Error)]
pub enum RoundTripError {
    #[error("can't render {field}: {source}")]
    Render {
        field: String,
        #[source]
        source: TemplateError,
    },

    /// The rendered round trip is unusable (no host, bad method, ...).
    #[error("{0}")]
    Invalid(String),

    #[error("parse json error: {0}")]
    Pattern(#[from] MatcherError),

    #[error("condition `{expr}` can't be evaluated: {message}")]
    Condition { expr: String, message: String },

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("{0}")]
    Mismatch(Box<Mismatch>),

    #[error("variables produced by {description:?} conflict: {message}")]
    Merge {
        description: String,
        message: String,
    },
}

impl RoundTripError {
    pub(crate) fn render(field: impl Into<String>, source: TemplateError) -> Self {
        RoundTripError::Render {
            field: field.into(),
            source,
        }
    }

    /// Returns true when the round trip ran but the response didn't match.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, RoundTripError::Mismatch(_))
    }
}

/// A response that failed its expectations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub description: String,
    /// The attempted request, `METHOD scheme://host/path`.
    pub request: String,
    pub failures: Vec<MatchFailure>,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.description.is_empty() {
            writeln!(f, "{}", self.description)?;
        }
        writeln!(f, "{}", self.request)?;
        writeln!(f, "to match response: {{")?;
        for line in render_failures(&self.failures).lines() {
            writeln!(f, "  {}", line)?;
        }
        write!(f, "}}")
    }
}
