//! Node protocol and field value model.
//!
//! The core treats user IR nodes as opaque records: a variant tag, plus an
//! ordered mapping from field names to field values. A field value is a
//! child node, a container of child nodes, or a leaf. [`TreeNode`] is the
//! complete capability surface the walks consume; everything else about a
//! node family stays on the user's side.

use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;
use lasso::{Rodeo, Spur};
use parking_lot::RwLock;

use crate::error::ValidationError;
use crate::NodeVec;

// ============================================================================
// Interned symbols
// ============================================================================

/// Global string interner for variant tags and field names.
static INTERNER: LazyLock<RwLock<Rodeo>> = LazyLock::new(|| RwLock::new(Rodeo::default()));

/// Interned name: a variant tag or a field name.
///
/// Backed by lasso with 4-byte keys, so symbols are `Copy` and compare in
/// O(1). Symbols are the dispatch keys of the whole crate: a rule handler is
/// looked up by the symbol returned from [`TreeNode::variant`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Spur);

impl Symbol {
    /// Intern a string and return its symbol.
    pub fn new(text: &str) -> Self {
        Symbol(INTERNER.write().get_or_intern(text))
    }

    /// Access the symbol's text without copying.
    ///
    /// Private: calling any other `Symbol` method from inside the closure
    /// deadlocks on the interner lock.
    fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        let interner = INTERNER.read();
        f(interner.resolve(&self.0))
    }
}

impl From<&str> for Symbol {
    fn from(text: &str) -> Self {
        Symbol::new(text)
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.with_str(|s| s == other)
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.with_str(|s| s == *other)
    }
}

impl PartialEq<Symbol> for str {
    fn eq(&self, other: &Symbol) -> bool {
        other.with_str(|s| s == self)
    }
}

impl PartialEq<Symbol> for &str {
    fn eq(&self, other: &Symbol) -> bool {
        other.with_str(|s| s == *self)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|s| write!(f, "{}", s))
    }
}

// ============================================================================
// Leaves
// ============================================================================

/// A non-node field value, opaque to the walks.
///
/// Leaves pass through every rewrite untouched and appear verbatim in
/// conversion child results. `Float` uses `f64` semantics for equality, so a
/// `NaN` leaf never compares equal; fixed points over such trees will not
/// converge.
#[derive(Clone, Debug, PartialEq)]
pub enum Leaf {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leaf::Unit => write!(f, "()"),
            Leaf::Bool(v) => write!(f, "{}", v),
            Leaf::Int(v) => write!(f, "{}", v),
            Leaf::Float(v) => write!(f, "{}", v),
            Leaf::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for Leaf {
    fn from(v: bool) -> Self {
        Leaf::Bool(v)
    }
}

impl From<i64> for Leaf {
    fn from(v: i64) -> Self {
        Leaf::Int(v)
    }
}

impl From<f64> for Leaf {
    fn from(v: f64) -> Self {
        Leaf::Float(v)
    }
}

impl From<&str> for Leaf {
    fn from(v: &str) -> Self {
        Leaf::Str(v.to_owned())
    }
}

impl From<String> for Leaf {
    fn from(v: String) -> Self {
        Leaf::Str(v)
    }
}

// ============================================================================
// Field values
// ============================================================================

/// One field of a node: a child node, a container of child nodes, or a leaf.
///
/// Containers are recognized by shape, not by host type:
/// - `Seq` is an ordered sequence; walks visit elements in order and rebuilds
///   preserve it.
/// - `Set` is unordered at the model level; the element order carried here is
///   the canonical iteration order maintained by the node family's
///   [`TreeNode::rebuild`]. The walks traverse and reassemble it verbatim.
/// - `Map` keys are preserved verbatim; only the values are walked.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue<N> {
    Node(N),
    Seq(NodeVec<N>),
    Set(NodeVec<N>),
    Map(IndexMap<String, N>),
    Leaf(Leaf),
}

impl<N> FieldValue<N> {
    /// Number of child nodes contained in this field.
    pub fn child_count(&self) -> usize {
        match self {
            FieldValue::Node(_) => 1,
            FieldValue::Seq(xs) | FieldValue::Set(xs) => xs.len(),
            FieldValue::Map(m) => m.len(),
            FieldValue::Leaf(_) => 0,
        }
    }

    /// True when this field holds no child nodes.
    pub fn is_leaf(&self) -> bool {
        matches!(self, FieldValue::Leaf(_))
    }
}

// ============================================================================
// Fields
// ============================================================================

/// Ordered mapping from field names to field values.
///
/// Insertion order is declaration order; enumeration is deterministic and is
/// the sibling order every walk follows.
#[derive(Clone, Debug, PartialEq)]
pub struct Fields<N> {
    entries: IndexMap<Symbol, FieldValue<N>>,
}

impl<N> Fields<N> {
    pub fn new() -> Self {
        Fields {
            entries: IndexMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Fields {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a field, keeping declaration order.
    pub fn insert(&mut self, name: impl Into<Symbol>, value: FieldValue<N>) {
        self.entries.insert(name.into(), value);
    }

    /// Builder form of [`insert`](Self::insert), for `fields()` impls.
    pub fn with(mut self, name: impl Into<Symbol>, value: FieldValue<N>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue<N>> {
        self.entries.get(&Symbol::new(name))
    }

    /// Remove and return a field, keeping the order of the rest.
    ///
    /// The workhorse of `rebuild` implementations: take each expected field,
    /// then reject leftovers.
    pub fn take(&mut self, name: &str) -> Option<FieldValue<N>> {
        self.entries.shift_remove(&Symbol::new(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&Symbol::new(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &FieldValue<N>)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.keys()
    }
}

impl<N> Default for Fields<N> {
    fn default() -> Self {
        Fields::new()
    }
}

impl<N> IntoIterator for Fields<N> {
    type Item = (Symbol, FieldValue<N>);
    type IntoIter = indexmap::map::IntoIter<Symbol, FieldValue<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<N> FromIterator<(Symbol, FieldValue<N>)> for Fields<N> {
    fn from_iter<I: IntoIterator<Item = (Symbol, FieldValue<N>)>>(iter: I) -> Self {
        Fields {
            entries: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Node protocol
// ============================================================================

/// Capability surface every user IR node must satisfy.
///
/// The walks treat nodes as opaque values except through this trait:
/// enumerate immediate fields, rebuild a node of the same variant from an
/// updated field mapping, retrieve the variant tag, and compare structurally.
/// `PartialEq` is what [`crate::FixedPoint`] tests convergence with, so it
/// must be content-based, never identity-based.
pub trait TreeNode: Clone + PartialEq + fmt::Debug + Sized {
    /// Stable identifier of the concrete variant; the dispatch key.
    ///
    /// Renaming a variant is a breaking change to every rule keyed on it.
    fn variant(&self) -> Symbol;

    /// Project the node's immediate fields, in declaration order.
    fn fields(&self) -> Fields<Self>;

    /// Reconstruct a node of the same variant from an updated field mapping.
    ///
    /// `fields` carries the same keys as [`fields`](Self::fields) returned.
    /// Implementations validate shape (key set, node-vs-leaf, leaf type) and
    /// reject mismatches with [`ValidationError`]. Round-trip law:
    /// `n.rebuild(n.fields()) == n`.
    fn rebuild(&self, fields: Fields<Self>) -> Result<Self, ValidationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_ir::{bag, bin, entry, list, lit, neg, table, text, Expr};

    #[test]
    fn symbol_interning_is_stable() {
        let a = Symbol::new("Add");
        let b = Symbol::new("Add");
        assert_eq!(a, b);
        assert_eq!(a, "Add");
        assert_ne!(a, Symbol::new("Mul"));
        assert_eq!(a.to_string(), "Add");
    }

    #[test]
    fn fields_preserve_declaration_order() {
        let fields = lit(1).fields();
        assert_eq!(fields.len(), 1);

        let fields = bin(lit(1), lit(2)).fields();
        let names: Vec<String> = fields.keys().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["left", "right"]);
    }

    #[test]
    fn take_removes_and_preserves_rest() {
        let mut fields = bin(lit(1), lit(2)).fields();
        let left = fields.take("left");
        assert!(matches!(left, Some(FieldValue::Node(_))));
        assert!(!fields.contains("left"));
        assert!(fields.contains("right"));
        assert!(fields.take("left").is_none());
    }

    #[test]
    fn rebuild_round_trips() {
        let exprs = [lit(3), neg(lit(3)), bin(lit(1), neg(lit(2)))];
        for e in exprs {
            assert_eq!(e.rebuild(e.fields()).unwrap(), e);
        }

        let docs = [
            text("a"),
            list(vec![text("a"), text("b")]),
            bag(vec![text("b"), text("a")]),
            table(vec![entry("k", text("v"))]),
        ];
        for d in docs {
            assert_eq!(d.rebuild(d.fields()).unwrap(), d);
        }
    }

    #[test]
    fn rebuild_rejects_wrong_shape() {
        let e = lit(1);
        // A node where a leaf is expected.
        let bad = Fields::new().with("value", FieldValue::Node(lit(2)));
        assert!(e.rebuild(bad).is_err());
        // Missing field.
        assert!(e.rebuild(Fields::new()).is_err());
    }

    #[test]
    fn rebuild_is_same_variant_only() {
        let e = neg(lit(1));
        let err = e.rebuild(Fields::new()).unwrap_err();
        assert_eq!(err.variant, Symbol::new("Neg"));
    }

    #[test]
    fn child_count_by_shape() {
        let d = list(vec![text("a"), text("b"), text("c")]);
        let fields = d.fields();
        let (_, value) = fields.iter().next().unwrap();
        assert_eq!(value.child_count(), 3);
        assert!(!value.is_leaf());

        let t = text("a");
        let fields = t.fields();
        let (_, value) = fields.iter().next().unwrap();
        assert_eq!(value.child_count(), 0);
        assert!(value.is_leaf());
    }

    #[test]
    fn leaf_display_is_host_default() {
        assert_eq!(Leaf::Int(42).to_string(), "42");
        assert_eq!(Leaf::Bool(true).to_string(), "true");
        assert_eq!(Leaf::Str("hi".into()).to_string(), "hi");
        assert_eq!(Leaf::Unit.to_string(), "()");
        assert_eq!(Expr::Lit(0).variant(), "Lit");
    }
}
