//! Pattern configuration errors.

use thiserror::Error;

/// Errors raised while compiling a response pattern into a matcher.
///
/// These are configuration mistakes in the pattern itself. A response that
/// fails to match is reported as a [`MatchFailure`](super::MatchFailure).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatcherError {
    /// The pattern text is not valid JSON.
    #[error("invalid pattern JSON: {0}")]
    InvalidJson(String),

    /// An object mixes `$` operators with plain field keys.
    #[error("mixed special matcher and fields at {0}")]
    MixedKeys(String),

    #[error("unknown special matcher {key} at {path}")]
    UnknownOperator { key: String, path: String },

    #[error("$exists must be a boolean at {0}")]
    InvalidExists(String),

    /// `$exists: false` was combined with another operator.
    #[error("$exists: false can't be combined with other special matchers at {0}")]
    ExistsFalseWithOperators(String),

    /// `$exists: false` on the root, an array element or a `$match` target.
    #[error("$exists: false is only allowed on object fields, found at {0}")]
    ExistsFalseOutsideField(String),

    #[error("$regexp at {path} is invalid: {message}")]
    InvalidRegexp { path: String, message: String },

    #[error("$len must be a non-negative integer at {0}")]
    InvalidLen(String),
}
