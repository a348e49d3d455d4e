//! Persistent (copy-on-write) decision tree.
//!
//! This module provides:
//! - [`Tree`]: immutable tree value; every edit returns a new tree
//! - [`Child`]: what hangs off one side of a node
//! - [`TreeError`]: precondition violations raised by edits and accessors
//! - [`TreeValidationError`]: structural validation errors
//!
//! # Design
//!
//! The tree stores one child map per side, keyed by [`NodeId`]. A side is a
//! [`Child`] enum, so "internal node or leaf, never both" holds by
//! construction; "never neither" is checked by [`Tree::validate`]. The maps
//! live behind `Arc` and are cloned on write, so older tree values stay valid
//! and share storage with newer ones until one of them is edited.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use super::leaf::{Label, Leaf, LeafId};
use super::node::{Node, NodeId};

// ============================================================================
// Child / Side
// ============================================================================

/// One side of a split node.
#[derive(Debug, Clone)]
pub enum Child<L> {
    /// The side continues into another split.
    Node(Node),
    /// The side terminates.
    Leaf(Leaf<L>),
}

impl<L> Child<L> {
    #[inline]
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Child::Node(node) => Some(node),
            Child::Leaf(_) => None,
        }
    }

    #[inline]
    pub fn as_leaf(&self) -> Option<&Leaf<L>> {
        match self {
            Child::Node(_) => None,
            Child::Leaf(leaf) => Some(leaf),
        }
    }
}

/// Which side of a node a child hangs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Precondition violations on tree edits and accessors.
///
/// These signal a bug in the caller, not a runtime condition to recover from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("tree already has root node {0}")]
    RootAlreadySet(NodeId),

    #[error("node {0} is not part of the tree")]
    UnknownNode(NodeId),

    #[error("leaf {leaf} is not a child of node {parent}")]
    LeafNotChild { parent: NodeId, leaf: LeafId },

    #[error("{side} child of node {node} is a node, not a leaf")]
    NotALeaf { node: NodeId, side: Side },

    #[error("cannot graft an empty subtree")]
    EmptySubtree,
}

/// Structural validation errors for [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeValidationError {
    /// A reachable node has no child registered on one side.
    MissingChild { node: NodeId, side: Side },
    /// A node was reached again while its own subtree was being walked.
    CycleDetected { node: NodeId },
    /// A node was reached by more than one path.
    DuplicateVisit { node: NodeId },
    /// The same leaf hangs from more than one position.
    DuplicateLeaf { leaf: LeafId },
    /// A node has child mappings but is unreachable from the root.
    UnreachableNode { node: NodeId },
}

impl fmt::Display for TreeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingChild { node, side } => {
                write!(f, "node {} has no {} child", node, side)
            }
            Self::CycleDetected { node } => write!(f, "cycle detected at node {}", node),
            Self::DuplicateVisit { node } => {
                write!(f, "node {} is reachable by more than one path", node)
            }
            Self::DuplicateLeaf { leaf } => {
                write!(f, "leaf {} appears at more than one position", leaf)
            }
            Self::UnreachableNode { node } => {
                write!(f, "node {} is not reachable from the root", node)
            }
        }
    }
}

impl std::error::Error for TreeValidationError {}

// ============================================================================
// LeafEntry
// ============================================================================

/// A leaf together with its position in the tree.
#[derive(Debug, Clone, Copy)]
pub struct LeafEntry<'a, L> {
    pub parent: Node,
    pub side: Side,
    pub leaf: &'a Leaf<L>,
}

// ============================================================================
// Tree
// ============================================================================

/// Pending step of [`Tree::walk`].
enum Visit<'a, L> {
    Node(Node, usize),
    Leaf(LeafEntry<'a, L>),
}

type ChildMap<L> = Arc<HashMap<NodeId, Child<L>>>;

/// Persistent binary decision tree.
///
/// The empty tree has no root and no mappings. The only way to add a root is
/// [`Tree::add_node`]; afterwards the tree only grows by replacing leaves,
/// either with another leaf or with a whole subtree, so it stays finite and
/// acyclic.
#[derive(Debug, Clone)]
pub struct Tree<L> {
    root: Option<Node>,
    left: ChildMap<L>,
    right: ChildMap<L>,
}

impl<L> Default for Tree<L> {
    fn default() -> Self {
        Self {
            root: None,
            left: Arc::new(HashMap::new()),
            right: Arc::new(HashMap::new()),
        }
    }
}

impl<L: Label> Tree<L> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    // =========================================================================
    // Edits
    // =========================================================================

    /// Set the root of an empty tree, with a leaf on each side.
    pub fn add_node(&self, node: Node, left: Leaf<L>, right: Leaf<L>) -> Result<Self, TreeError> {
        if let Some(root) = &self.root {
            return Err(TreeError::RootAlreadySet(root.id()));
        }

        let mut next = self.clone();
        next.root = Some(node);
        Arc::make_mut(&mut next.left).insert(node.id(), Child::Leaf(left));
        Arc::make_mut(&mut next.right).insert(node.id(), Child::Leaf(right));
        Ok(next)
    }

    /// Replace `old` under `parent` with `new`, keeping the side.
    pub fn replace_leaf(&self, parent: &Node, old: &Leaf<L>, new: Leaf<L>) -> Result<Self, TreeError> {
        let side = self.require_side_of(parent, old)?;
        let mut next = self.clone();
        next.side_map_mut(side).insert(parent.id(), Child::Leaf(new));
        Ok(next)
    }

    /// Replace `old` under `parent` with `subtree`, merging its mappings.
    pub fn replace_leaf_with_subtree(
        &self,
        parent: &Node,
        old: &Leaf<L>,
        subtree: &Tree<L>,
    ) -> Result<Self, TreeError> {
        let side = self.require_side_of(parent, old)?;
        let sub_root = subtree.root.ok_or(TreeError::EmptySubtree)?;

        let mut next = self.clone();
        next.side_map_mut(side)
            .insert(parent.id(), Child::Node(sub_root));

        let left = Arc::make_mut(&mut next.left);
        left.extend(subtree.left.iter().map(|(id, child)| (*id, child.clone())));
        let right = Arc::make_mut(&mut next.right);
        right.extend(subtree.right.iter().map(|(id, child)| (*id, child.clone())));
        Ok(next)
    }

    fn side_map_mut(&mut self, side: Side) -> &mut HashMap<NodeId, Child<L>> {
        match side {
            Side::Left => Arc::make_mut(&mut self.left),
            Side::Right => Arc::make_mut(&mut self.right),
        }
    }

    fn require_side_of(&self, parent: &Node, leaf: &Leaf<L>) -> Result<Side, TreeError> {
        if !self.left.contains_key(&parent.id()) {
            return Err(TreeError::UnknownNode(parent.id()));
        }
        self.side_of(parent, leaf).ok_or(TreeError::LeafNotChild {
            parent: parent.id(),
            leaf: leaf.id(),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The child on one side of `node`.
    pub fn child(&self, node: &Node, side: Side) -> Result<&Child<L>, TreeError> {
        let map = match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        };
        map.get(&node.id()).ok_or(TreeError::UnknownNode(node.id()))
    }

    /// Left child node, or `None` if the left side is a leaf (or `node` is unknown).
    pub fn left_node(&self, node: &Node) -> Option<&Node> {
        self.child(node, Side::Left).ok().and_then(Child::as_node)
    }

    /// Right child node, or `None` if the right side is a leaf (or `node` is unknown).
    pub fn right_node(&self, node: &Node) -> Option<&Node> {
        self.child(node, Side::Right).ok().and_then(Child::as_node)
    }

    /// Left child leaf; errors if the left side is a node.
    pub fn left_leaf(&self, node: &Node) -> Result<&Leaf<L>, TreeError> {
        self.leaf_on(node, Side::Left)
    }

    /// Right child leaf; errors if the right side is a node.
    pub fn right_leaf(&self, node: &Node) -> Result<&Leaf<L>, TreeError> {
        self.leaf_on(node, Side::Right)
    }

    fn leaf_on(&self, node: &Node, side: Side) -> Result<&Leaf<L>, TreeError> {
        self.child(node, side)?.as_leaf().ok_or(TreeError::NotALeaf {
            node: node.id(),
            side,
        })
    }

    /// Which side of `parent` holds `leaf`, if any.
    pub fn side_of(&self, parent: &Node, leaf: &Leaf<L>) -> Option<Side> {
        let holds = |map: &ChildMap<L>| {
            matches!(map.get(&parent.id()), Some(Child::Leaf(l)) if l == leaf)
        };
        if holds(&self.left) {
            Some(Side::Left)
        } else if holds(&self.right) {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// The parent node and side currently holding `leaf`.
    pub fn parent_of(&self, leaf: &Leaf<L>) -> Option<(Node, Side)> {
        self.leaves()
            .into_iter()
            .find(|entry| entry.leaf == leaf)
            .map(|entry| (entry.parent, entry.side))
    }

    /// Returns true if `leaf` is currently registered in the tree.
    pub fn contains_leaf(&self, leaf: &Leaf<L>) -> bool {
        let is_it = |child: &Child<L>| matches!(child, Child::Leaf(l) if l == leaf);
        self.left.values().any(is_it) || self.right.values().any(is_it)
    }

    // =========================================================================
    // Enumeration
    // =========================================================================

    /// All nodes reachable from the root, in pre-order (left before right).
    pub fn nodes(&self) -> Vec<Node> {
        let mut out = Vec::with_capacity(self.left.len());
        self.walk(|node, _| out.push(*node), |_| {});
        out
    }

    /// All leaves reachable from the root with their parent, left to right.
    pub fn leaves(&self) -> Vec<LeafEntry<'_, L>> {
        let mut out = Vec::with_capacity(self.left.len() + 1);
        self.walk(|_, _| {}, |entry| out.push(entry));
        out
    }

    /// Number of split nodes reachable from the root.
    pub fn n_nodes(&self) -> usize {
        self.nodes().len()
    }

    /// Number of leaves reachable from the root.
    pub fn n_leaves(&self) -> usize {
        self.leaves().len()
    }

    /// Number of split levels on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        self.walk(|_, depth| max_depth = max_depth.max(depth + 1), |_| {});
        max_depth
    }

    /// Iterative pre-order walk; `on_node` receives the node depth (root = 0).
    fn walk<'a>(
        &'a self,
        mut on_node: impl FnMut(&Node, usize),
        mut on_leaf: impl FnMut(LeafEntry<'a, L>),
    ) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack: Vec<Visit<'a, L>> = vec![Visit::Node(root, 0)];

        while let Some(visit) = stack.pop() {
            let (node, depth) = match visit {
                Visit::Node(node, depth) => (node, depth),
                Visit::Leaf(entry) => {
                    on_leaf(entry);
                    continue;
                }
            };
            on_node(&node, depth);
            // Right first so the left side is popped first.
            for (side, map) in [(Side::Right, &self.right), (Side::Left, &self.left)] {
                match map.get(&node.id()) {
                    Some(Child::Node(child)) => stack.push(Visit::Node(*child, depth + 1)),
                    Some(Child::Leaf(leaf)) => stack.push(Visit::Leaf(LeafEntry {
                        parent: node,
                        side,
                        leaf,
                    })),
                    None => {}
                }
            }
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate the structural invariants of this tree.
    ///
    /// Every reachable node must have exactly one child per side, nodes and
    /// leaves must each occupy a single position, and no mapping may be
    /// orphaned. Intended for debug checks and tests.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        let Some(root) = self.root else {
            if let Some(id) = self.left.keys().chain(self.right.keys()).next() {
                return Err(TreeValidationError::UnreachableNode { node: *id });
            }
            return Ok(());
        };

        // 1 = visiting, 2 = done
        let mut color: HashMap<NodeId, u8> = HashMap::with_capacity(self.left.len());
        let mut seen_leaves: HashSet<LeafId> = HashSet::with_capacity(self.left.len() + 1);
        let mut stack: Vec<(Node, u8)> = vec![(root, 0)];

        while let Some((node, phase)) = stack.pop() {
            if phase == 1 {
                color.insert(node.id(), 2);
                continue;
            }
            match color.get(&node.id()).copied() {
                Some(1) => return Err(TreeValidationError::CycleDetected { node: node.id() }),
                Some(_) => return Err(TreeValidationError::DuplicateVisit { node: node.id() }),
                None => {}
            }
            color.insert(node.id(), 1);
            stack.push((node, 1));

            let mut children = Vec::with_capacity(2);
            for (side, map) in [(Side::Left, &self.left), (Side::Right, &self.right)] {
                match map.get(&node.id()) {
                    None => {
                        return Err(TreeValidationError::MissingChild {
                            node: node.id(),
                            side,
                        })
                    }
                    Some(Child::Node(child)) => children.push(*child),
                    Some(Child::Leaf(leaf)) => {
                        if !seen_leaves.insert(leaf.id()) {
                            return Err(TreeValidationError::DuplicateLeaf { leaf: leaf.id() });
                        }
                    }
                }
            }
            stack.extend(children.into_iter().rev().map(|child| (child, 0)));
        }

        for id in self.left.keys().chain(self.right.keys()) {
            if !color.contains_key(id) {
                return Err(TreeValidationError::UnreachableNode { node: *id });
            }
        }

        Ok(())
    }
}
