//! Error types for the variable model.

use thiserror::Error;

/// Errors raised while selecting, converting or merging variables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VarError {
    /// A name is already bound in the destination scope.
    #[error("variable {0} has been defined")]
    Conflict(String),

    /// A referenced variable is not bound in scope.
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    /// An object has no key matching the selector segment.
    #[error("can't find key {key:?} in object")]
    MissingKey { key: String },

    /// An array selector segment is not an integer index.
    #[error("invalid array index {segment:?}")]
    InvalidIndex { segment: String },

    /// An array index lies outside the array.
    #[error("index {index} out of range, array length is {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A selector tries to descend into a scalar value.
    #[error("can't select {segment:?} from a {kind} value")]
    NotTraversable { segment: String, kind: &'static str },

    /// A typed accessor was used on a value of another kind.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The value has no length (only arrays and objects do).
    #[error("{0} value is not measurable")]
    NotMeasurable(&'static str),
}
