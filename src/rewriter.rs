//! Pass combinators: composing passes into larger passes.
//!
//! [`Chain`] applies passes sequentially, [`FixedPoint`] iterates one pass
//! until the tree stops changing, and [`Filter`] gates a pass behind a
//! predicate on the root. All three are passes themselves, so they nest
//! freely.

use tracing::debug;

use crate::error::PassError;
use crate::pass::Pass;
use crate::tree::TreeNode;

// ============================================================================
// Chain
// ============================================================================

/// Sequential composition: `Chain(p1, .., pn)` runs `pn(..p2(p1(root))..)`.
///
/// All passes share the node type, so any prefix's output is acceptable as
/// the next pass's input by construction. The first failure aborts the
/// remaining passes. For a pipeline whose final stage changes type, end with
/// [`Pass::then`] instead.
pub struct Chain<N: TreeNode> {
    passes: Vec<Box<dyn Pass<N, Output = N>>>,
}

impl<N: TreeNode> Chain<N> {
    pub fn new() -> Self {
        Chain { passes: Vec::new() }
    }

    /// Append a pass to the end of the chain.
    pub fn add_pass<P>(mut self, pass: P) -> Self
    where
        P: Pass<N, Output = N> + 'static,
    {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl<N: TreeNode> Default for Chain<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: TreeNode> Pass<N> for Chain<N> {
    type Output = N;

    fn run(&mut self, root: N) -> Result<N, PassError> {
        let mut current = root;
        for pass in &mut self.passes {
            debug!(pass = pass.name(), "chain step");
            current = pass.run(current)?;
        }
        Ok(current)
    }

    fn name(&self) -> &'static str {
        "Chain"
    }
}

// ============================================================================
// FixedPoint
// ============================================================================

/// Iterates a pass until the tree converges structurally.
///
/// Convergence is `prev == next` under the node type's `PartialEq`, which
/// must be content-based. [`FixedPoint::new`] imposes no step cap: if the
/// inner pass never stabilizes, the combinator diverges by contract.
/// [`FixedPoint::bounded`] is the caller-side cap, failing with
/// [`PassError::DivergentFixedPoint`] once `limit` applications have run
/// without converging.
pub struct FixedPoint<P> {
    pass: P,
    limit: Option<usize>,
}

impl<P> FixedPoint<P> {
    pub fn new(pass: P) -> Self {
        FixedPoint { pass, limit: None }
    }

    pub fn bounded(pass: P, limit: usize) -> Self {
        FixedPoint {
            pass,
            limit: Some(limit),
        }
    }

    pub fn pass(&self) -> &P {
        &self.pass
    }

    pub fn into_pass(self) -> P {
        self.pass
    }
}

impl<N, P> Pass<N> for FixedPoint<P>
where
    N: TreeNode,
    P: Pass<N, Output = N>,
{
    type Output = N;

    fn run(&mut self, root: N) -> Result<N, PassError> {
        let mut current = root;
        let mut applied = 0usize;
        loop {
            let next = self.pass.run(current.clone())?;
            if next == current {
                debug!(iterations = applied, "fixed point converged");
                return Ok(next);
            }
            current = next;
            applied += 1;
            if let Some(limit) = self.limit {
                if applied >= limit {
                    return Err(PassError::DivergentFixedPoint { limit });
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "FixedPoint"
    }
}

// ============================================================================
// Filter
// ============================================================================

/// Applies the inner pass only when the predicate holds for the root;
/// otherwise the root passes through unchanged.
pub struct Filter<P, F> {
    pass: P,
    predicate: F,
}

impl<P, F> Filter<P, F> {
    pub fn new(predicate: F, pass: P) -> Self {
        Filter { pass, predicate }
    }
}

impl<N, P, F> Pass<N> for Filter<P, F>
where
    N: TreeNode,
    P: Pass<N, Output = N>,
    F: FnMut(&N) -> bool,
{
    type Output = N;

    fn run(&mut self, root: N) -> Result<N, PassError> {
        if (self.predicate)(&root) {
            self.pass.run(root)
        } else {
            Ok(root)
        }
    }

    fn name(&self) -> &'static str {
        "Filter"
    }
}
