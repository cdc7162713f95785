//! Trellis IR: pass, walk, and rule infrastructure for tree-shaped IRs.
//!
//! This crate is the reusable substrate for compilers and interpreters that
//! operate on tree-shaped intermediate representations. Users define their
//! own node families by implementing [`TreeNode`]; the crate supplies the
//! traversal strategies ([`Walk`], [`Fold`]), the variant-tag dispatch
//! machinery ([`RewriteRule`], [`ConversionRule`]), and the combinators that
//! glue passes into larger passes ([`Chain`], [`FixedPoint`]).
//!
//! # Example
//!
//! ```
//! use trellis_ir::{
//!     FieldValue, Fields, Leaf, Pass, Rewrite, RewriteSet, Symbol, TreeNode,
//!     ValidationError, Walk,
//! };
//!
//! #[derive(Clone, Debug, PartialEq)]
//! enum Expr {
//!     Num(i64),
//!     Neg(Box<Expr>),
//! }
//!
//! impl TreeNode for Expr {
//!     fn variant(&self) -> Symbol {
//!         Symbol::new(match self {
//!             Expr::Num(_) => "Num",
//!             Expr::Neg(_) => "Neg",
//!         })
//!     }
//!
//!     fn fields(&self) -> Fields<Self> {
//!         match self {
//!             Expr::Num(v) => Fields::new().with("value", FieldValue::Leaf(Leaf::Int(*v))),
//!             Expr::Neg(e) => Fields::new().with("expr", FieldValue::Node((**e).clone())),
//!         }
//!     }
//!
//!     fn rebuild(&self, mut fields: Fields<Self>) -> Result<Self, ValidationError> {
//!         match self {
//!             Expr::Num(_) => match fields.take("value") {
//!                 Some(FieldValue::Leaf(Leaf::Int(v))) => Ok(Expr::Num(v)),
//!                 _ => Err(ValidationError::missing_field(self.variant(), "value")),
//!             },
//!             Expr::Neg(_) => match fields.take("expr") {
//!                 Some(FieldValue::Node(e)) => Ok(Expr::Neg(Box::new(e))),
//!                 _ => Err(ValidationError::missing_field(self.variant(), "expr")),
//!             },
//!         }
//!     }
//! }
//!
//! // Fold double negation: Neg(Neg(e)) -> e.
//! let rule = RewriteSet::new().on("Neg", |node: &Expr| {
//!     if let Expr::Neg(inner) = node {
//!         if let Expr::Neg(e) = &**inner {
//!             return Ok(Rewrite::Replace((**e).clone()));
//!         }
//!     }
//!     Ok(Rewrite::Unchanged)
//! });
//!
//! let tree = Expr::Neg(Box::new(Expr::Neg(Box::new(Expr::Num(7)))));
//! let out = Walk::post(rule).run(tree).unwrap();
//! assert_eq!(out, Expr::Num(7));
//! ```

// === Node protocol and value model ===
pub mod tree;

// === Pass infrastructure ===
pub mod error;
pub mod pass;
pub mod path;
pub mod rewriter;
pub mod rule;
pub mod walk;

// === Reference consumers ===
pub mod canonical;
pub mod printer;

#[cfg(test)]
pub(crate) mod test_ir;

pub use canonical::{canonicalize, canonicalize_bounded};
pub use error::{PassError, RuleError, ValidationError};
pub use pass::{Pass, Then};
pub use path::{NodePath, PathSegment};
pub use printer::{pretty, PrettyPrint};
pub use rewriter::{Chain, Filter, FixedPoint};
pub use rule::{
    Analysis, AnalysisRule, ChildValue, ChildValues, ConversionRule, ConversionSet, Rewrite,
    RewriteRule, RewriteSet,
};
pub use tree::{FieldValue, Fields, Leaf, Symbol, TreeNode};
pub use walk::{Fold, Strategy, Walk};

/// Small vector for child node lists and container elements.
pub type NodeVec<N> = smallvec::SmallVec<[N; 2]>;
pub use smallvec::smallvec as nodevec;
