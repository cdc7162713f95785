//! Diagnostic paths from a tree root to a node.
//!
//! Every engine failure carries the path at which it occurred: the sequence
//! of field names, container indices, and map keys leading from the root to
//! the failing node. Paths are diagnostics only; they never influence
//! traversal.

use std::fmt;

use crate::tree::Symbol;

/// One step of a [`NodePath`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    /// Descend into a named field.
    Field(Symbol),
    /// Descend into a sequence or set element.
    Index(usize),
    /// Descend into a map value.
    Key(String),
}

/// Path from the root to a node, rendered like `expr.args[2].entries["k"]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodePath {
    segments: Vec<PathSegment>,
}

impl NodePath {
    /// The empty path, designating the root itself.
    pub fn root() -> Self {
        NodePath::default()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// Drop segments beyond `len`, restoring an earlier position.
    pub fn truncate(&mut self, len: usize) {
        self.segments.truncate(len);
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "<root>");
        }
        let mut first = true;
        for segment in &self.segments {
            match segment {
                PathSegment::Field(name) => {
                    if !first {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", name)?;
                }
                PathSegment::Index(i) => write!(f, "[{}]", i)?,
                PathSegment::Key(k) => write!(f, "[{:?}]", k)?,
            }
            first = false;
        }
        Ok(())
    }
}
