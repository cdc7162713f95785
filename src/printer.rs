//! Generic pretty-printer: a reference conversion rule.
//!
//! Converts any node family to a deterministic, human-readable string
//! without per-variant handlers: every node renders as
//! `Tag(field=child, ...)`, sequences as `[a, b, c]`, sets as `{a, b, c}`,
//! maps as `{k: v, ...}`, and leaves by their `Display` form. Tests and
//! diagnostics use it as a stable textual snapshot of a tree.

use std::fmt::Write;

use crate::error::{PassError, RuleError};
use crate::pass::Pass;
use crate::rule::{ChildValue, ChildValues, ConversionRule};
use crate::tree::TreeNode;
use crate::walk::Fold;

/// Conversion rule rendering every variant generically.
pub struct PrettyPrint;

impl<N: TreeNode> ConversionRule<N> for PrettyPrint {
    type Output = String;

    fn convert(&mut self, node: &N, children: &ChildValues<String>) -> Result<String, RuleError> {
        let mut out = String::new();
        let _ = write!(out, "{}(", node.variant());
        for (i, (name, value)) in children.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{}=", name);
            render_value(&mut out, value);
        }
        out.push(')');
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "PrettyPrint"
    }
}

fn render_value(out: &mut String, value: &ChildValue<String>) {
    match value {
        ChildValue::Node(s) => out.push_str(s),
        ChildValue::Seq(xs) => render_delimited(out, xs, '[', ']'),
        ChildValue::Set(xs) => render_delimited(out, xs, '{', '}'),
        ChildValue::Map(m) => {
            out.push('{');
            for (i, (k, v)) in m.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{}: {}", k, v);
            }
            out.push('}');
        }
        ChildValue::Leaf(l) => {
            let _ = write!(out, "{}", l);
        }
    }
}

fn render_delimited(out: &mut String, items: &[String], open: char, close: char) {
    out.push(open);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(item);
    }
    out.push(close);
}

/// Render a tree with [`PrettyPrint`] under a Post walk.
pub fn pretty<N: TreeNode>(root: &N) -> Result<String, PassError> {
    Fold::new(PrettyPrint).run(root.clone())
}
