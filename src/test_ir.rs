//! Small node families used by the unit tests.
//!
//! `Expr` exercises plain node fields and leaves; `Doc` exercises the three
//! container shapes. Integration tests define their own calculator IR under
//! `tests/common`.

use indexmap::IndexMap;

use crate::error::ValidationError;
use crate::tree::{FieldValue, Fields, Leaf, Symbol, TreeNode};

// ============================================================================
// Expr: scalar children
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Lit(i64),
    Neg(Box<Expr>),
    Bin(Box<Expr>, Box<Expr>),
}

pub fn lit(v: i64) -> Expr {
    Expr::Lit(v)
}

pub fn neg(e: Expr) -> Expr {
    Expr::Neg(Box::new(e))
}

pub fn bin(l: Expr, r: Expr) -> Expr {
    Expr::Bin(Box::new(l), Box::new(r))
}

/// Reject any fields left over after a rebuild consumed what it expected.
fn ensure_consumed<N>(variant: Symbol, fields: &Fields<N>) -> Result<(), ValidationError> {
    match fields.keys().next() {
        Some(extra) => Err(ValidationError::unexpected_field(variant, extra)),
        None => Ok(()),
    }
}

impl TreeNode for Expr {
    fn variant(&self) -> Symbol {
        Symbol::new(match self {
            Expr::Lit(_) => "Lit",
            Expr::Neg(_) => "Neg",
            Expr::Bin(_, _) => "Bin",
        })
    }

    fn fields(&self) -> Fields<Self> {
        match self {
            Expr::Lit(v) => Fields::new().with("value", FieldValue::Leaf(Leaf::Int(*v))),
            Expr::Neg(e) => Fields::new().with("expr", FieldValue::Node((**e).clone())),
            Expr::Bin(l, r) => Fields::new()
                .with("left", FieldValue::Node((**l).clone()))
                .with("right", FieldValue::Node((**r).clone())),
        }
    }

    fn rebuild(&self, mut fields: Fields<Self>) -> Result<Self, ValidationError> {
        let variant = self.variant();
        let node = match self {
            Expr::Lit(_) => match fields.take("value") {
                Some(FieldValue::Leaf(Leaf::Int(v))) => Expr::Lit(v),
                _ => return Err(ValidationError::missing_field(variant, "value")),
            },
            Expr::Neg(_) => match fields.take("expr") {
                Some(FieldValue::Node(e)) => neg(e),
                _ => return Err(ValidationError::missing_field(variant, "expr")),
            },
            Expr::Bin(_, _) => {
                let l = match fields.take("left") {
                    Some(FieldValue::Node(e)) => e,
                    _ => return Err(ValidationError::missing_field(variant, "left")),
                };
                let r = match fields.take("right") {
                    Some(FieldValue::Node(e)) => e,
                    _ => return Err(ValidationError::missing_field(variant, "right")),
                };
                bin(l, r)
            }
        };
        ensure_consumed(variant, &fields)?;
        Ok(node)
    }
}

// ============================================================================
// Doc: container children
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum Doc {
    Text(String),
    List(Vec<Doc>),
    /// Unordered collection; kept in canonical (sorted) order.
    Bag(Vec<Doc>),
    Table(Vec<(String, Doc)>),
}

pub fn text(s: &str) -> Doc {
    Doc::Text(s.to_owned())
}

pub fn list(items: Vec<Doc>) -> Doc {
    Doc::List(items)
}

pub fn bag(items: Vec<Doc>) -> Doc {
    Doc::Bag(canonical_bag(items))
}

pub fn table(entries: Vec<(String, Doc)>) -> Doc {
    Doc::Table(entries)
}

pub fn entry(key: &str, value: Doc) -> (String, Doc) {
    (key.to_owned(), value)
}

fn canonical_bag(mut items: Vec<Doc>) -> Vec<Doc> {
    items.sort_by_key(|d| format!("{:?}", d));
    items.dedup();
    items
}

impl TreeNode for Doc {
    fn variant(&self) -> Symbol {
        Symbol::new(match self {
            Doc::Text(_) => "Text",
            Doc::List(_) => "List",
            Doc::Bag(_) => "Bag",
            Doc::Table(_) => "Table",
        })
    }

    fn fields(&self) -> Fields<Self> {
        match self {
            Doc::Text(s) => Fields::new().with("text", FieldValue::Leaf(Leaf::Str(s.clone()))),
            Doc::List(xs) => {
                Fields::new().with("items", FieldValue::Seq(xs.iter().cloned().collect()))
            }
            Doc::Bag(xs) => {
                Fields::new().with("items", FieldValue::Set(xs.iter().cloned().collect()))
            }
            Doc::Table(es) => Fields::new().with(
                "entries",
                FieldValue::Map(es.iter().cloned().collect::<IndexMap<String, Doc>>()),
            ),
        }
    }

    fn rebuild(&self, mut fields: Fields<Self>) -> Result<Self, ValidationError> {
        let variant = self.variant();
        let node = match self {
            Doc::Text(_) => match fields.take("text") {
                Some(FieldValue::Leaf(Leaf::Str(s))) => Doc::Text(s),
                _ => return Err(ValidationError::missing_field(variant, "text")),
            },
            Doc::List(_) => match fields.take("items") {
                Some(FieldValue::Seq(xs)) => Doc::List(xs.into_vec()),
                _ => return Err(ValidationError::missing_field(variant, "items")),
            },
            Doc::Bag(_) => match fields.take("items") {
                // Rebuild canonicalizes set order.
                Some(FieldValue::Set(xs)) => Doc::Bag(canonical_bag(xs.into_vec())),
                _ => return Err(ValidationError::missing_field(variant, "items")),
            },
            Doc::Table(_) => match fields.take("entries") {
                Some(FieldValue::Map(m)) => Doc::Table(m.into_iter().collect()),
                _ => return Err(ValidationError::missing_field(variant, "entries")),
            },
        };
        ensure_consumed(variant, &fields)?;
        Ok(node)
    }
}
