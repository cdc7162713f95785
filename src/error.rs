//! Error types surfaced by the pass engine.
//!
//! No error is recovered inside the core: any failure aborts the current
//! pass, and [`crate::Chain`] aborts its remaining passes. Engine errors
//! carry the variant tag and the [`NodePath`] of the failing node where the
//! engine knows them.

use thiserror::Error;

use crate::path::NodePath;
use crate::tree::Symbol;
use crate::walk::Strategy;

/// Failure raised by [`TreeNode::rebuild`](crate::TreeNode::rebuild) when a
/// field mapping does not fit the variant's shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot rebuild `{variant}`: {message}")]
pub struct ValidationError {
    /// Variant whose rebuild was rejected.
    pub variant: Symbol,
    /// What was wrong with the field mapping.
    pub message: String,
}

impl ValidationError {
    pub fn new(variant: Symbol, message: impl Into<String>) -> Self {
        ValidationError {
            variant,
            message: message.into(),
        }
    }

    /// A required field is absent or has the wrong shape.
    pub fn missing_field(variant: Symbol, field: &str) -> Self {
        Self::new(variant, format!("missing or ill-shaped field `{}`", field))
    }

    /// The mapping carries a field the variant does not declare.
    pub fn unexpected_field(variant: Symbol, field: &Symbol) -> Self {
        Self::new(variant, format!("unexpected field `{}`", field))
    }
}

/// Failure returned by a rule handler.
///
/// `Unhandled` is special-cased by the engine: a conversion dispatch that
/// answers `Unhandled` surfaces as [`PassError::UnhandledVariant`] with the
/// node's position attached. Everything else becomes
/// [`PassError::RuleFailure`].
#[derive(Debug, Error)]
pub enum RuleError {
    /// The rule has no handler for this variant.
    #[error("no handler for this variant")]
    Unhandled,

    /// Free-form handler failure.
    #[error("{0}")]
    Message(String),

    /// A handler failure wrapping a domain error.
    #[error(transparent)]
    Custom(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl RuleError {
    pub fn msg(message: impl Into<String>) -> Self {
        RuleError::Message(message.into())
    }

    pub fn custom(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        RuleError::Custom(Box::new(error))
    }
}

impl From<String> for RuleError {
    fn from(message: String) -> Self {
        RuleError::Message(message)
    }
}

impl From<&str> for RuleError {
    fn from(message: &str) -> Self {
        RuleError::Message(message.to_owned())
    }
}

/// Failure of a pass application.
#[derive(Debug, Error)]
pub enum PassError {
    /// A conversion rule has no handler for a reachable variant.
    #[error("no conversion handler for `{variant}` at {path}")]
    UnhandledVariant { variant: Symbol, path: NodePath },

    /// The walk strategy cannot apply the rule it was paired with: a rewrite
    /// returned a replacement under a read-only strategy (In, Level), or a
    /// conversion was driven by anything other than Post.
    #[error("{strategy} walk cannot apply this rule to `{variant}` at {path}")]
    InvalidWalkForRule {
        strategy: Strategy,
        variant: Symbol,
        path: NodePath,
    },

    /// `rebuild` rejected the node assembled from walked children or a
    /// handler's output.
    #[error("rebuild failed at {path}")]
    Validation {
        path: NodePath,
        #[source]
        source: ValidationError,
    },

    /// A handler failed; the engine wraps it with the variant tag and the
    /// path from the root for diagnostics.
    #[error("rule `{rule}` failed on `{variant}` at {path}")]
    RuleFailure {
        rule: String,
        variant: Symbol,
        path: NodePath,
        #[source]
        source: RuleError,
    },

    /// A bounded fixed point exhausted its step cap before converging. Only
    /// [`crate::FixedPoint::bounded`] produces this; the engine itself does
    /// not detect divergence.
    #[error("fixed point did not converge within {limit} iterations")]
    DivergentFixedPoint { limit: usize },
}
