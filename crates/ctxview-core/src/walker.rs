//! Visibility traversal over a trace tree.
//!
//! The walker decides what a renderer should draw, in order, without
//! drawing anything. It keeps an explicit stack so arbitrarily deep traces
//! never hit a recursion limit, and it never descends below a closed node.

use crate::expansion::ExpansionState;
use crate::types::ContextNode;

/// One visible node as produced by [`Walker`].
#[derive(Debug, Clone, PartialEq)]
pub struct Visit<'a> {
    pub node: &'a ContextNode,
    pub depth: usize,
    pub is_open: bool,
    /// Children that pass the kind filter. Empty when the node is closed.
    pub visible_children: Vec<&'a ContextNode>,
}

/// A child is shown when it has no kind or its kind is allow-listed.
pub fn is_child_visible(child: &ContextNode, state: &ExpansionState) -> bool {
    match &child.kind {
        None => true,
        Some(kind) => state.is_kind_visible(kind),
    }
}

/// Lazy pre-order iterator over the visible part of one or more trees.
#[derive(Debug)]
pub struct Walker<'a, 's> {
    stack: Vec<(&'a ContextNode, usize)>,
    state: &'s ExpansionState,
}

impl<'a> Iterator for Walker<'a, '_> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        let is_open = self.state.is_expanded(&node.uid);
        let visible_children: Vec<&'a ContextNode> = if is_open {
            node.children
                .iter()
                .filter(|child| is_child_visible(child, self.state))
                .collect()
        } else {
            Vec::new()
        };
        self.stack
            .extend(visible_children.iter().rev().map(|child| (*child, depth + 1)));
        Some(Visit {
            node,
            depth,
            is_open,
            visible_children,
        })
    }
}

/// Walk one tree. The root is always yielded, whatever its kind.
pub fn walk<'a, 's>(root: &'a ContextNode, state: &'s ExpansionState) -> Walker<'a, 's> {
    Walker {
        stack: vec![(root, 0)],
        state,
    }
}

/// Walk several roots in order, each at depth 0.
pub fn walk_forest<'a, 's>(roots: &'a [ContextNode], state: &'s ExpansionState) -> Walker<'a, 's> {
    Walker {
        stack: roots.iter().rev().map(|root| (root, 0)).collect(),
        state,
    }
}
