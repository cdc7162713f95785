//! Rules: per-variant logic dispatched by variant tag.
//!
//! A rule bundles handlers for the variants it cares about. Two flavors
//! exist, one per axis of what a pass can compute:
//!
//! - [`RewriteRule`]: node in, node of the same IR out (or the
//!   [`Rewrite::Unchanged`] marker).
//! - [`ConversionRule`]: node plus already-converted child results in, value
//!   of any type out.
//!
//! Both come in two dispatch forms. The trait form is an exhaustive match
//! over the variant tag, written by hand. The table forms ([`RewriteSet`],
//! [`ConversionSet`]) register boxed handlers keyed by tag, with the same
//! defaults the traits document: identity for rewrites, unhandled for
//! conversions.
//!
//! Rules may carry mutable state across handler invocations; the walk takes
//! `&mut` access for the duration of one pass application and never shares a
//! rule across passes.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::RuleError;
use crate::tree::{Leaf, Symbol, TreeNode};

// ============================================================================
// Rewrite
// ============================================================================

/// Outcome of a rewrite handler at one node.
#[derive(Clone, Debug, PartialEq)]
pub enum Rewrite<N> {
    /// Keep the node the walk assembled at this position.
    Unchanged,
    /// Substitute a new node at this position. The walk does not re-visit
    /// the replacement's children within the same pass; re-traversal is the
    /// caller's job via [`crate::FixedPoint`].
    Replace(N),
}

impl<N> Rewrite<N> {
    pub fn is_changed(&self) -> bool {
        !matches!(self, Rewrite::Unchanged)
    }
}

/// A rule that rewrites nodes within one IR.
///
/// Under Post order the handler sees the node already rebuilt from walked
/// children; under Pre order it sees the original node and its replacement's
/// children are what the walk then traverses. A variant the rule does not
/// care about answers `Ok(Rewrite::Unchanged)`.
pub trait RewriteRule<N: TreeNode> {
    fn rewrite(&mut self, node: &N) -> Result<Rewrite<N>, RuleError>;

    /// Human-readable name for diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Table-form rewrite rule: handlers keyed by variant tag.
///
/// Variants without a registered handler are left unchanged. Handlers are
/// `FnMut`, so a table can accumulate state across invocations within a pass.
pub struct RewriteSet<N> {
    handlers: HashMap<Symbol, Box<dyn FnMut(&N) -> Result<Rewrite<N>, RuleError>>>,
}

impl<N: TreeNode> RewriteSet<N> {
    pub fn new() -> Self {
        RewriteSet {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a variant tag. Re-registering a tag replaces
    /// the previous handler.
    pub fn on<F>(mut self, tag: impl Into<Symbol>, handler: F) -> Self
    where
        F: FnMut(&N) -> Result<Rewrite<N>, RuleError> + 'static,
    {
        self.handlers.insert(tag.into(), Box::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<N: TreeNode> Default for RewriteSet<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: TreeNode> RewriteRule<N> for RewriteSet<N> {
    fn rewrite(&mut self, node: &N) -> Result<Rewrite<N>, RuleError> {
        match self.handlers.get_mut(&node.variant()) {
            Some(handler) => handler(node),
            None => Ok(Rewrite::Unchanged),
        }
    }

    fn name(&self) -> &'static str {
        "RewriteSet"
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// One converted field slot: the original container shape with converted
/// results in every node position. Leaf fields pass through verbatim.
#[derive(Clone, Debug, PartialEq)]
pub enum ChildValue<R> {
    Node(R),
    Seq(Vec<R>),
    Set(Vec<R>),
    Map(IndexMap<String, R>),
    Leaf(Leaf),
}

impl<R> ChildValue<R> {
    /// The converted result of a plain node field.
    pub fn as_node(&self) -> Option<&R> {
        match self {
            ChildValue::Node(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            ChildValue::Leaf(l) => Some(l),
            _ => None,
        }
    }

    /// Iterate every converted result in this slot, in container order.
    pub fn iter(&self) -> std::vec::IntoIter<&R> {
        let refs: Vec<&R> = match self {
            ChildValue::Node(r) => vec![r],
            ChildValue::Seq(xs) | ChildValue::Set(xs) => xs.iter().collect(),
            ChildValue::Map(m) => m.values().collect(),
            ChildValue::Leaf(_) => Vec::new(),
        };
        refs.into_iter()
    }
}

/// Converted child results of one node, keyed like its fields.
///
/// Same keys as [`TreeNode::fields`], same order, with container shapes
/// preserved: a field holding a sequence of nodes arrives as a sequence of
/// their results.
#[derive(Clone, Debug, PartialEq)]
pub struct ChildValues<R> {
    entries: IndexMap<Symbol, ChildValue<R>>,
}

impl<R> ChildValues<R> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        ChildValues {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    pub(crate) fn insert(&mut self, name: Symbol, value: ChildValue<R>) {
        self.entries.insert(name, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ChildValue<R>> {
        self.entries.get(&Symbol::new(name))
    }

    /// Shorthand for the common case: the result of a plain node field.
    pub fn node(&self, name: &str) -> Option<&R> {
        self.get(name).and_then(ChildValue::as_node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &ChildValue<R>)> {
        self.entries.iter()
    }
}

/// A rule that converts nodes to values of an arbitrary result type.
///
/// Only legal under Post order: children must be converted before their
/// parent, so `children` is complete when a handler runs. Every reachable
/// variant must be handled; answering [`RuleError::Unhandled`] surfaces as
/// [`crate::PassError::UnhandledVariant`] with the node's position.
pub trait ConversionRule<N: TreeNode> {
    type Output;

    fn convert(
        &mut self,
        node: &N,
        children: &ChildValues<Self::Output>,
    ) -> Result<Self::Output, RuleError>;

    /// Human-readable name for diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Handler signature stored by [`ConversionSet`].
type ConversionHandler<N, R> = Box<dyn FnMut(&N, &ChildValues<R>) -> Result<R, RuleError>>;

/// Table-form conversion rule: handlers keyed by variant tag.
///
/// Unlike rewrites there is no identity default; a reachable variant without
/// a handler fails the pass.
pub struct ConversionSet<N, R> {
    handlers: HashMap<Symbol, ConversionHandler<N, R>>,
}

impl<N: TreeNode, R> ConversionSet<N, R> {
    pub fn new() -> Self {
        ConversionSet {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a variant tag. Re-registering a tag replaces
    /// the previous handler.
    pub fn on<F>(mut self, tag: impl Into<Symbol>, handler: F) -> Self
    where
        F: FnMut(&N, &ChildValues<R>) -> Result<R, RuleError> + 'static,
    {
        self.handlers.insert(tag.into(), Box::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<N: TreeNode, R> Default for ConversionSet<N, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: TreeNode, R> ConversionRule<N> for ConversionSet<N, R> {
    type Output = R;

    fn convert(&mut self, node: &N, children: &ChildValues<R>) -> Result<R, RuleError> {
        match self.handlers.get_mut(&node.variant()) {
            Some(handler) => handler(node, children),
            None => Err(RuleError::Unhandled),
        }
    }

    fn name(&self) -> &'static str {
        "ConversionSet"
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// A read-only visitor over a tree: observes nodes, never rewrites.
pub trait AnalysisRule<N: TreeNode> {
    fn visit(&mut self, node: &N);

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Adapts an [`AnalysisRule`] into a [`RewriteRule`] that always answers
/// [`Rewrite::Unchanged`], so every walk strategy (In and Level included)
/// accepts it.
///
/// Retrieve the analysis afterwards through the walk that owns it:
///
/// ```ignore
/// let mut walk = Walk::level(Analysis::new(CountNodes::default()));
/// walk.run(tree)?;
/// let n = walk.rule().get().count;
/// ```
pub struct Analysis<A> {
    inner: A,
}

impl<A> Analysis<A> {
    pub fn new(inner: A) -> Self {
        Analysis { inner }
    }

    pub fn get(&self) -> &A {
        &self.inner
    }

    pub fn into_inner(self) -> A {
        self.inner
    }
}

impl<N: TreeNode, A: AnalysisRule<N>> RewriteRule<N> for Analysis<A> {
    fn rewrite(&mut self, node: &N) -> Result<Rewrite<N>, RuleError> {
        self.inner.visit(node);
        Ok(Rewrite::Unchanged)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
