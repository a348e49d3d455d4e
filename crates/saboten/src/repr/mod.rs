//! Persistent decision-tree representation.
//!
//! - [`Node`]: a split (`feature[column] <= threshold` goes left)
//! - [`Leaf`]: a resolved, ambiguous or unknown label payload
//! - [`Tree`]: copy-on-write container linking nodes to their children
//!
//! Nodes and leaves are identity-bearing: two leaves with the same labels are
//! distinct entities. Identity comes from process-unique ids handed out by
//! [`next_id`], so values created by independent generators never collide.

use std::sync::atomic::{AtomicU64, Ordering};

pub mod leaf;
pub mod node;
pub mod tree;

pub use leaf::{distinct_labels, same_label_set, Label, Leaf, LeafId, LeafLabel};
pub use node::{Node, NodeId};
pub use tree::{Child, LeafEntry, Side, Tree, TreeError, TreeValidationError};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Allocate a fresh identity shared by the node and leaf id spaces.
#[inline]
pub(crate) fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}
