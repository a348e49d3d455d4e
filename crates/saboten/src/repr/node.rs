//! Split node type.

use std::fmt;
use std::hash::{Hash, Hasher};

use super::next_id;

/// Stable identity of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Internal split node.
///
/// Samples whose feature at `column` is `<= threshold` go left, everything
/// else goes right. Equality and hashing use the node's identity only, so two
/// nodes splitting on the same column and threshold are still different
/// positions in a tree.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    id: NodeId,
    column: usize,
    threshold: f64,
}

impl Node {
    /// Create a node with a fresh identity.
    pub fn new(column: usize, threshold: f64) -> Self {
        Self {
            id: NodeId(next_id()),
            column,
            threshold,
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Global feature index tested by this node.
    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns true if a sample with this feature value goes left.
    #[inline]
    pub fn goes_left(&self, value: f64) -> bool {
        value <= self.threshold
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_compare_by_identity() {
        let a = Node::new(3, 0.5);
        let b = Node::new(3, 0.5);
        assert_ne!(a, b);
        assert_eq!(a, a);
    }

    #[test]
    fn threshold_is_inclusive_on_the_left() {
        let node = Node::new(0, 1.5);
        assert!(node.goes_left(1.0));
        assert!(node.goes_left(1.5));
        assert!(!node.goes_left(1.5001));
    }
}
