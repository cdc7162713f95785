//! Walks: traversal strategies that pair with rules to form passes.
//!
//! A walk visits every node of the input tree exactly once and integrates
//! the rule's output back into a tree (rewrites) or folds it upward
//! (conversions). The four strategies differ only in when the rule runs at a
//! node relative to its children:
//!
//! | Strategy | Rule at node N with children c1..ck | Rewrite   | Conversion |
//! |----------|-------------------------------------|-----------|------------|
//! | Pre      | N before any ci                     | yes       | no         |
//! | Post     | N after all ci                      | yes       | yes        |
//! | In       | c1, then N, then c2..ck             | read-only | no         |
//! | Level    | breadth-first dequeue order         | read-only | no         |
//!
//! Rewrites run through [`Walk`]; conversions through [`Fold`], which only
//! accepts Post (children must be converted before their parent). Illegal
//! pairings fail with [`PassError::InvalidWalkForRule`].
//!
//! The depth-first engines use an explicit frame stack rather than
//! recursion, so pathologically tall trees cannot overflow the call stack.

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, trace};

use crate::error::{PassError, RuleError};
use crate::pass::Pass;
use crate::path::{NodePath, PathSegment};
use crate::rule::{ChildValue, ChildValues, ConversionRule, Rewrite, RewriteRule};
use crate::tree::{FieldValue, Fields, Symbol, TreeNode};

/// Traversal order of a walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    Pre,
    Post,
    In,
    Level,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Pre => "Pre",
            Strategy::Post => "Post",
            Strategy::In => "In",
            Strategy::Level => "Level",
        })
    }
}

// ============================================================================
// Rewrite walks
// ============================================================================

/// A traversal strategy paired with a rewrite rule.
///
/// Applying the walk to a root (via [`Pass::run`]) visits each node once in
/// the strategy's order and substitutes handler replacements into a new
/// tree. Under In and Level the tree shape must not change; a non-identity
/// replacement fails the pass.
///
/// The walk owns its rule; rule state accumulated during runs stays
/// readable through [`rule`](Self::rule) afterwards.
pub struct Walk<R> {
    strategy: Strategy,
    reverse: bool,
    rule: R,
}

impl<R> Walk<R> {
    pub fn new(strategy: Strategy, rule: R) -> Self {
        Walk {
            strategy,
            reverse: false,
            rule,
        }
    }

    pub fn pre(rule: R) -> Self {
        Self::new(Strategy::Pre, rule)
    }

    pub fn post(rule: R) -> Self {
        Self::new(Strategy::Post, rule)
    }

    /// In-order walk (`in` being reserved, the constructor is `in_order`).
    pub fn in_order(rule: R) -> Self {
        Self::new(Strategy::In, rule)
    }

    pub fn level(rule: R) -> Self {
        Self::new(Strategy::Level, rule)
    }

    /// Reverse the order in which each node's children are visited.
    pub fn reversed(mut self) -> Self {
        self.reverse = !self.reverse;
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }

    pub fn rule_mut(&mut self) -> &mut R {
        &mut self.rule
    }

    pub fn into_rule(self) -> R {
        self.rule
    }
}

impl<N, R> Pass<N> for Walk<R>
where
    N: TreeNode,
    R: RewriteRule<N>,
{
    type Output = N;

    fn run(&mut self, root: N) -> Result<N, PassError> {
        debug!(
            strategy = %self.strategy,
            reverse = self.reverse,
            rule = self.rule.name(),
            "walk"
        );
        match self.strategy {
            Strategy::Pre => run_depth(&mut self.rule, root, Order::Pre, self.reverse),
            Strategy::Post => run_depth(&mut self.rule, root, Order::Post, self.reverse),
            Strategy::In => run_in(&mut self.rule, root, self.reverse),
            Strategy::Level => run_level(&mut self.rule, root, self.reverse),
        }
    }
}

// ============================================================================
// Conversion walks
// ============================================================================

/// A conversion rule driven bottom-up: children are converted before their
/// parent, and the parent handler receives their results.
///
/// Post is the only order under which conversion is meaningful, so
/// [`Fold::new`] fixes it. [`Fold::with_strategy`] exists for callers that
/// select strategies dynamically; anything but [`Strategy::Post`] fails with
/// [`PassError::InvalidWalkForRule`] before visiting a node.
pub struct Fold<R> {
    strategy: Strategy,
    reverse: bool,
    rule: R,
}

impl<R> Fold<R> {
    pub fn new(rule: R) -> Self {
        Fold {
            strategy: Strategy::Post,
            reverse: false,
            rule,
        }
    }

    pub fn with_strategy(strategy: Strategy, rule: R) -> Self {
        Fold {
            strategy,
            reverse: false,
            rule,
        }
    }

    /// Reverse the order in which each node's children are converted.
    /// Results still land in their original structural positions.
    pub fn reversed(mut self) -> Self {
        self.reverse = !self.reverse;
        self
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }

    pub fn rule_mut(&mut self) -> &mut R {
        &mut self.rule
    }

    pub fn into_rule(self) -> R {
        self.rule
    }
}

impl<N, R> Pass<N> for Fold<R>
where
    N: TreeNode,
    R: ConversionRule<N>,
{
    type Output = R::Output;

    fn run(&mut self, root: N) -> Result<R::Output, PassError> {
        if self.strategy != Strategy::Post {
            return Err(PassError::InvalidWalkForRule {
                strategy: self.strategy,
                variant: root.variant(),
                path: NodePath::root(),
            });
        }
        debug!(reverse = self.reverse, rule = self.rule.name(), "fold");
        run_fold(&mut self.rule, root, self.reverse)
    }
}

// ============================================================================
// Child flattening
// ============================================================================

/// Position of one child node within its parent's fields.
#[derive(Clone, Debug)]
struct ChildSlot {
    field: Symbol,
    pos: SlotPos,
}

#[derive(Clone, Debug)]
enum SlotPos {
    /// The field is the node itself.
    Sole,
    /// Sequence or set element.
    Index(usize),
    /// Map value.
    Key(String),
}

fn push_slot(path: &mut NodePath, slot: &ChildSlot) {
    path.push(PathSegment::Field(slot.field));
    match &slot.pos {
        SlotPos::Sole => {}
        SlotPos::Index(i) => path.push(PathSegment::Index(*i)),
        SlotPos::Key(k) => path.push(PathSegment::Key(k.clone())),
    }
}

/// Flatten a node's fields into its child nodes, in structural order:
/// fields in declaration order, container elements in container order.
fn flatten_children<N: TreeNode>(fields: &Fields<N>) -> Vec<(ChildSlot, N)> {
    let mut children = Vec::new();
    for (name, value) in fields.iter() {
        match value {
            FieldValue::Node(n) => children.push((
                ChildSlot {
                    field: *name,
                    pos: SlotPos::Sole,
                },
                n.clone(),
            )),
            FieldValue::Seq(xs) | FieldValue::Set(xs) => {
                for (i, n) in xs.iter().enumerate() {
                    children.push((
                        ChildSlot {
                            field: *name,
                            pos: SlotPos::Index(i),
                        },
                        n.clone(),
                    ));
                }
            }
            FieldValue::Map(m) => {
                for (k, n) in m.iter() {
                    children.push((
                        ChildSlot {
                            field: *name,
                            pos: SlotPos::Key(k.clone()),
                        },
                        n.clone(),
                    ));
                }
            }
            FieldValue::Leaf(_) => {}
        }
    }
    children
}

/// Index of the next child to visit, honoring the direction flag.
fn order_index(visited: usize, len: usize, reverse: bool) -> usize {
    if reverse {
        len - 1 - visited
    } else {
        visited
    }
}

// ============================================================================
// Rule invocation
// ============================================================================

fn invoke_rewrite<N, R>(rule: &mut R, node: &N, path: &NodePath) -> Result<Rewrite<N>, PassError>
where
    N: TreeNode,
    R: RewriteRule<N>,
{
    trace!(variant = %node.variant(), path = %path, "rewrite");
    rule.rewrite(node).map_err(|source| PassError::RuleFailure {
        rule: rule.name().to_owned(),
        variant: node.variant(),
        path: path.clone(),
        source,
    })
}

/// Invoke a rewrite rule where the tree shape must not change.
fn invoke_read_only<N, R>(
    rule: &mut R,
    node: &N,
    strategy: Strategy,
    path: &NodePath,
) -> Result<(), PassError>
where
    N: TreeNode,
    R: RewriteRule<N>,
{
    match invoke_rewrite(rule, node, path)? {
        Rewrite::Unchanged => Ok(()),
        Rewrite::Replace(_) => Err(PassError::InvalidWalkForRule {
            strategy,
            variant: node.variant(),
            path: path.clone(),
        }),
    }
}

// ============================================================================
// Depth-first rewrite engine (Pre, Post)
// ============================================================================

#[derive(Clone, Copy)]
enum Order {
    Pre,
    Post,
}

enum Step {
    Descend(usize),
    Close,
}

struct Frame<N: TreeNode> {
    node: N,
    fields: Fields<N>,
    children: Vec<(ChildSlot, N)>,
    results: Vec<Option<N>>,
    visited: usize,
    /// `(index into parent's results, path length before descending)`;
    /// `None` for the root frame.
    parent_slot: Option<(usize, usize)>,
}

fn open_frame<N, R>(
    rule: &mut R,
    node: N,
    order: Order,
    path: &NodePath,
    parent_slot: Option<(usize, usize)>,
) -> Result<Frame<N>, PassError>
where
    N: TreeNode,
    R: RewriteRule<N>,
{
    // Pre applies the rule on entry: the children traversed below are the
    // children of the replacement. Post applies it on exit instead.
    let node = match order {
        Order::Pre => match invoke_rewrite(rule, &node, path)? {
            Rewrite::Unchanged => node,
            Rewrite::Replace(replacement) => replacement,
        },
        Order::Post => node,
    };
    let fields = node.fields();
    let children = flatten_children(&fields);
    let results = (0..children.len()).map(|_| None).collect();
    Ok(Frame {
        node,
        fields,
        children,
        results,
        visited: 0,
        parent_slot,
    })
}

/// Substitute walked children back into their structural positions and
/// rebuild the node.
fn rebuild_node<N: TreeNode>(
    original: &N,
    fields: Fields<N>,
    results: Vec<Option<N>>,
    path: &NodePath,
) -> Result<N, PassError> {
    let mut results = results.into_iter();
    let mut next = || {
        results
            .next()
            .flatten()
            .expect("walk produced a result for every child slot")
    };
    let mut new_fields = Fields::with_capacity(fields.len());
    for (name, value) in fields {
        let new_value = match value {
            FieldValue::Node(_) => FieldValue::Node(next()),
            FieldValue::Seq(xs) => FieldValue::Seq(xs.iter().map(|_| next()).collect()),
            FieldValue::Set(xs) => FieldValue::Set(xs.iter().map(|_| next()).collect()),
            FieldValue::Map(m) => {
                FieldValue::Map(m.keys().cloned().map(|k| (k, next())).collect())
            }
            leaf @ FieldValue::Leaf(_) => leaf,
        };
        new_fields.insert(name, new_value);
    }
    original
        .rebuild(new_fields)
        .map_err(|source| PassError::Validation {
            path: path.clone(),
            source,
        })
}

fn run_depth<N, R>(rule: &mut R, root: N, order: Order, reverse: bool) -> Result<N, PassError>
where
    N: TreeNode,
    R: RewriteRule<N>,
{
    let mut path = NodePath::root();
    let mut stack = vec![open_frame(rule, root, order, &path, None)?];

    loop {
        let step = {
            let top = stack.last().expect("walk stack never empties mid-run");
            if top.visited < top.children.len() {
                Step::Descend(order_index(top.visited, top.children.len(), reverse))
            } else {
                Step::Close
            }
        };
        match step {
            Step::Descend(idx) => {
                let (slot, child) = stack.last().expect("frame present").children[idx].clone();
                let depth_before = path.len();
                push_slot(&mut path, &slot);
                let frame = open_frame(rule, child, order, &path, Some((idx, depth_before)))?;
                stack.push(frame);
            }
            Step::Close => {
                let frame = stack.pop().expect("frame present");
                let assembled = if frame.children.is_empty() {
                    frame.node
                } else {
                    rebuild_node(&frame.node, frame.fields, frame.results, &path)?
                };
                let out = match order {
                    Order::Post => match invoke_rewrite(rule, &assembled, &path)? {
                        Rewrite::Unchanged => assembled,
                        Rewrite::Replace(replacement) => replacement,
                    },
                    Order::Pre => assembled,
                };
                match frame.parent_slot {
                    None => return Ok(out),
                    Some((idx, depth_before)) => {
                        path.truncate(depth_before);
                        let parent = stack.last_mut().expect("parent frame present");
                        parent.results[idx] = Some(out);
                        parent.visited += 1;
                    }
                }
            }
        }
    }
}

// ============================================================================
// In-order engine (read-only)
// ============================================================================

struct InFrame<N: TreeNode> {
    node: N,
    children: Vec<(ChildSlot, N)>,
    visited: usize,
    self_done: bool,
    /// Path length to restore when this frame closes; `None` for the root.
    restore: Option<usize>,
}

fn open_in_frame<N: TreeNode>(node: N, restore: Option<usize>) -> InFrame<N> {
    let fields = node.fields();
    let children = flatten_children(&fields);
    InFrame {
        node,
        children,
        visited: 0,
        self_done: false,
        restore,
    }
}

fn run_in<N, R>(rule: &mut R, root: N, reverse: bool) -> Result<N, PassError>
where
    N: TreeNode,
    R: RewriteRule<N>,
{
    enum InStep {
        Visit,
        Descend(usize),
        Close,
    }

    let mut path = NodePath::root();
    let mut stack = vec![open_in_frame(root, None)];

    loop {
        let step = {
            let top = stack.last().expect("walk stack never empties mid-run");
            // The node itself is visited after its first child subtree
            // (immediately, when it has no children).
            let self_turn = usize::from(!top.children.is_empty());
            if !top.self_done && top.visited == self_turn {
                InStep::Visit
            } else if top.visited < top.children.len() {
                InStep::Descend(order_index(top.visited, top.children.len(), reverse))
            } else {
                InStep::Close
            }
        };
        match step {
            InStep::Visit => {
                let top = stack.last_mut().expect("frame present");
                top.self_done = true;
                invoke_read_only(rule, &top.node, Strategy::In, &path)?;
            }
            InStep::Descend(idx) => {
                let (slot, child) = stack.last().expect("frame present").children[idx].clone();
                let depth_before = path.len();
                push_slot(&mut path, &slot);
                stack.push(open_in_frame(child, Some(depth_before)));
            }
            InStep::Close => {
                let frame = stack.pop().expect("frame present");
                match frame.restore {
                    None => return Ok(frame.node),
                    Some(depth_before) => {
                        path.truncate(depth_before);
                        stack.last_mut().expect("parent frame present").visited += 1;
                    }
                }
            }
        }
    }
}

// ============================================================================
// Level engine (read-only)
// ============================================================================

fn run_level<N, R>(rule: &mut R, root: N, reverse: bool) -> Result<N, PassError>
where
    N: TreeNode,
    R: RewriteRule<N>,
{
    let mut queue: VecDeque<(NodePath, N)> = VecDeque::new();
    queue.push_back((NodePath::root(), root.clone()));

    while let Some((path, node)) = queue.pop_front() {
        invoke_read_only(rule, &node, Strategy::Level, &path)?;
        let fields = node.fields();
        let mut children = flatten_children(&fields);
        // Enqueueing each node's children reversed reverses every level's
        // order as a whole, since parents are already dequeued reversed.
        if reverse {
            children.reverse();
        }
        for (slot, child) in children {
            let mut child_path = path.clone();
            push_slot(&mut child_path, &slot);
            queue.push_back((child_path, child));
        }
    }
    Ok(root)
}

// ============================================================================
// Conversion engine (Post only)
// ============================================================================

struct FoldFrame<N: TreeNode, R> {
    node: N,
    fields: Fields<N>,
    children: Vec<(ChildSlot, N)>,
    results: Vec<Option<R>>,
    visited: usize,
    parent_slot: Option<(usize, usize)>,
}

fn open_fold_frame<N: TreeNode, R>(node: N, parent_slot: Option<(usize, usize)>) -> FoldFrame<N, R> {
    let fields = node.fields();
    let children = flatten_children(&fields);
    let results = (0..children.len()).map(|_| None).collect();
    FoldFrame {
        node,
        fields,
        children,
        results,
        visited: 0,
        parent_slot,
    }
}

/// Reassemble converted child results into the node's field shapes.
fn assemble_children<N: TreeNode, R>(
    fields: &Fields<N>,
    results: Vec<Option<R>>,
) -> ChildValues<R> {
    let mut results = results.into_iter();
    let mut next = || {
        results
            .next()
            .flatten()
            .expect("walk produced a result for every child slot")
    };
    let mut out = ChildValues::with_capacity(fields.len());
    for (name, value) in fields.iter() {
        let cv = match value {
            FieldValue::Node(_) => ChildValue::Node(next()),
            FieldValue::Seq(xs) => ChildValue::Seq(xs.iter().map(|_| next()).collect()),
            FieldValue::Set(xs) => ChildValue::Set(xs.iter().map(|_| next()).collect()),
            FieldValue::Map(m) => {
                ChildValue::Map(m.keys().cloned().map(|k| (k, next())).collect())
            }
            FieldValue::Leaf(l) => ChildValue::Leaf(l.clone()),
        };
        out.insert(*name, cv);
    }
    out
}

fn run_fold<N, C>(rule: &mut C, root: N, reverse: bool) -> Result<C::Output, PassError>
where
    N: TreeNode,
    C: ConversionRule<N>,
{
    let mut path = NodePath::root();
    let mut stack: Vec<FoldFrame<N, C::Output>> = vec![open_fold_frame(root, None)];

    loop {
        let step = {
            let top = stack.last().expect("walk stack never empties mid-run");
            if top.visited < top.children.len() {
                Step::Descend(order_index(top.visited, top.children.len(), reverse))
            } else {
                Step::Close
            }
        };
        match step {
            Step::Descend(idx) => {
                let (slot, child) = stack.last().expect("frame present").children[idx].clone();
                let depth_before = path.len();
                push_slot(&mut path, &slot);
                stack.push(open_fold_frame(child, Some((idx, depth_before))));
            }
            Step::Close => {
                let frame = stack.pop().expect("frame present");
                let children_values = assemble_children(&frame.fields, frame.results);
                trace!(variant = %frame.node.variant(), path = %path, "convert");
                let out = rule
                    .convert(&frame.node, &children_values)
                    .map_err(|error| match error {
                        RuleError::Unhandled => PassError::UnhandledVariant {
                            variant: frame.node.variant(),
                            path: path.clone(),
                        },
                        source => PassError::RuleFailure {
                            rule: rule.name().to_owned(),
                            variant: frame.node.variant(),
                            path: path.clone(),
                            source,
                        },
                    })?;
                match frame.parent_slot {
                    None => return Ok(out),
                    Some((idx, depth_before)) => {
                        path.truncate(depth_before);
                        let parent = stack.last_mut().expect("parent frame present");
                        parent.results[idx] = Some(out);
                        parent.visited += 1;
                    }
                }
            }
        }
    }
}
