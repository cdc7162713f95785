//! Canonicalization helper: the standard normalization shape.
//!
//! Rewrite-to-normal-form passes are almost always the same composition: a
//! post-order walk of a rewrite rule, iterated to a fixed point so that
//! replacements introduced late get revisited by later iterations. This
//! module packages that shape; it is the reference consumer of the rewrite
//! contracts.

use crate::rewriter::FixedPoint;
use crate::walk::Walk;

/// `FixedPoint(Walk::post(rule))`: iterate a post-order rewrite until the
/// tree stops changing.
///
/// Termination is the rule's obligation: pair it with a confluent,
/// size-reducing (or otherwise well-founded) rewrite system.
pub fn canonicalize<R>(rule: R) -> FixedPoint<Walk<R>> {
    FixedPoint::new(Walk::post(rule))
}

/// [`canonicalize`] with an iteration cap, failing with
/// [`crate::PassError::DivergentFixedPoint`] instead of looping forever on a
/// non-confluent rule.
pub fn canonicalize_bounded<R>(rule: R, limit: usize) -> FixedPoint<Walk<R>> {
    FixedPoint::bounded(Walk::post(rule), limit)
}
