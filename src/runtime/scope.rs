//! Scope chain.
//!
//! Every context hands its children an immutable chain of variable frames,
//! newest first. Frames are shared between sibling cases, so activating one
//! case can never leak bindings into another.

use crate::variables::{VarError, Variable, VariableMap};
use std::sync::Arc;

#[derive(Debug)]
struct Frame {
    vars: VariableMap,
    parent: Option<Arc<Frame>>,
}

/// An immutable linked list of variable frames.
///
/// No name is bound in more than one frame: [`ScopeChain::push`] refuses a
/// frame that would shadow an outer binding.
#[derive(Debug, Clone, Default)]
pub struct ScopeChain {
    head: Option<Arc<Frame>>,
}

impl ScopeChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a chain holding a single frame.
    pub fn root(vars: VariableMap) -> Self {
        Self {
            head: Some(Arc::new(Frame { vars, parent: None })),
        }
    }

    /// Returns a new chain with `vars` on top. Fails if any name in `vars` is
    /// already bound somewhere in the chain.
    pub fn push(&self, vars: VariableMap) -> Result<ScopeChain, VarError> {
        if let Some(name) = vars.keys().find(|name| self.contains(name)) {
            return Err(VarError::Conflict(name.to_string()));
        }
        Ok(Self {
            head: Some(Arc::new(Frame {
                vars,
                parent: self.head.clone(),
            })),
        })
    }

    /// Looks a name up, newest frame first.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.frames().find_map(|vars| vars.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of frames.
    pub fn depth(&self) -> usize {
        self.frames().count()
    }

    /// Iterates frames, newest first.
    pub fn frames(&self) -> Frames<'_> {
        Frames {
            next: self.head.as_deref(),
        }
    }

    /// Flattens the chain into one map, outermost bindings first.
    pub fn materialize(&self) -> VariableMap {
        let frames: Vec<&VariableMap> = self.frames().collect();
        let mut vars = VariableMap::new();
        for frame in frames.into_iter().rev() {
            for (name, value) in frame.iter() {
                vars.set(name, value.clone());
            }
        }
        vars
    }
}

/// Iterator over the frames of a [`ScopeChain`].
pub struct Frames<'a> {
    next: Option<&'a Frame>,
}

impl<'a> Iterator for Frames<'a> {
    type Item = &'a VariableMap;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.next?;
        self.next = frame.parent.as_deref();
        Some(&frame.vars)
    }
}
