//! The pass contract: a uniform callable from a root to a result.
//!
//! Any walk applied to any rule is a pass by virtue of implementing this
//! trait, and the combinators in [`crate::rewriter`] are written purely in
//! terms of it. Rewrite passes produce a node of the same IR; conversion
//! passes produce whatever their terminal handler returned.

use crate::error::PassError;
use crate::tree::TreeNode;

/// A pass over trees rooted in nodes of type `N`.
///
/// `run` takes `&mut self` because rules may carry state across handler
/// invocations; a pass value is therefore exclusive to one application at a
/// time, which is the whole concurrency story of this crate.
pub trait Pass<N: TreeNode> {
    type Output;

    fn run(&mut self, root: N) -> Result<Self::Output, PassError>;

    /// Human-readable name for diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Feed this pass's output into `next`.
    ///
    /// This is the type-changing form of sequential composition; for a
    /// homogeneous pipeline of same-IR passes use [`crate::Chain`]. The
    /// intermediate type must itself be a tree, the final output need not
    /// be, so a rewrite pipeline can terminate in a conversion.
    fn then<Q>(self, next: Q) -> Then<Self, Q>
    where
        Self: Sized,
        Self::Output: TreeNode,
        Q: Pass<Self::Output>,
    {
        Then {
            first: self,
            second: next,
        }
    }
}

/// Two passes composed sequentially; see [`Pass::then`].
pub struct Then<P, Q> {
    first: P,
    second: Q,
}

impl<N, P, Q> Pass<N> for Then<P, Q>
where
    N: TreeNode,
    P: Pass<N>,
    P::Output: TreeNode,
    Q: Pass<P::Output>,
{
    type Output = Q::Output;

    fn run(&mut self, root: N) -> Result<Self::Output, PassError> {
        let mid = self.first.run(root)?;
        self.second.run(mid)
    }

    fn name(&self) -> &'static str {
        "Then"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleError;
    use crate::rule::{ChildValues, ConversionRule, Rewrite, RewriteSet};
    use crate::test_ir::{bin, lit, Expr};
    use crate::walk::{Fold, Walk};

    struct Sum;
    impl ConversionRule<Expr> for Sum {
        type Output = i64;
        fn convert(&mut self, node: &Expr, children: &ChildValues<i64>) -> Result<i64, RuleError> {
            match node {
                Expr::Lit(v) => Ok(*v),
                _ => Ok(children.iter().flat_map(|(_, cv)| cv.iter()).sum()),
            }
        }
    }

    #[test]
    fn then_chains_a_rewrite_into_a_conversion() {
        let increment = RewriteSet::new().on("Lit", |node: &Expr| {
            let Expr::Lit(v) = node else {
                return Ok(Rewrite::Unchanged);
            };
            Ok(Rewrite::Replace(lit(v + 1)))
        });

        let mut pass = Walk::post(increment).then(Fold::new(Sum));
        let out = pass.run(bin(lit(1), bin(lit(2), lit(3)))).unwrap();
        // Each literal incremented before summing: 2 + 3 + 4.
        assert_eq!(out, 9);
    }

    #[test]
    fn then_aborts_on_first_failure() {
        struct Fail;
        impl crate::rule::RewriteRule<Expr> for Fail {
            fn rewrite(&mut self, _node: &Expr) -> Result<Rewrite<Expr>, RuleError> {
                Err(RuleError::msg("boom"))
            }
        }

        let mut pass = Walk::post(Fail).then(Fold::new(Sum));
        assert!(pass.run(lit(1)).is_err());
    }
}
