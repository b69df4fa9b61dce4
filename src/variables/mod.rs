//! Variable model.
//!
//! Test scopes bind names to typed, JSON-shaped [`Variable`] values held in
//! an ordered [`VariableMap`]. Maps are combined with one of four
//! [`MergePolicy`] values when a round trip or a context produces new
//! bindings.

pub mod error;
pub mod map;
pub mod merge;
pub mod value;

pub use error::VarError;
pub use map::VariableMap;
pub use merge::MergePolicy;
pub use value::{parse_path, Variable, VariableType, LENGTH_SELECTOR};
