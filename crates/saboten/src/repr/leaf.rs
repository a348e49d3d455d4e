//! Leaf payload types.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::next_id;

/// Trait for class labels stored in leaves.
///
/// Labels only need equality (with hashing for distinctness checks). The
/// `Send + Sync` bounds let models be routed from rayon workers.
pub trait Label: Clone + Eq + Hash + fmt::Debug + Send + Sync {}

impl<T> Label for T where T: Clone + Eq + Hash + fmt::Debug + Send + Sync {}

/// Stable identity of a [`Leaf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafId(u64);

impl fmt::Display for LeafId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}

/// What a leaf predicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafLabel<L> {
    /// No training sample has reached this leaf yet.
    Unknown,
    /// Every sample that reached this leaf carried this label.
    Single(L),
    /// Several distinct labels reached this leaf and no split separates them
    /// yet. Holds at least two labels, in first-seen order.
    Ambiguous(Vec<L>),
}

impl<L: Label> LeafLabel<L> {
    /// Classify a partition by its labels: empty is `Unknown`, one distinct
    /// label is `Single`, anything else is `Ambiguous`.
    pub fn from_labels(labels: &[L]) -> Self {
        let mut distinct = distinct_labels(labels);
        match distinct.len() {
            0 => Self::Unknown,
            1 => Self::Single(distinct.swap_remove(0)),
            _ => Self::Ambiguous(distinct),
        }
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    #[inline]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous(_))
    }

    /// The resolved label, if this leaf has exactly one.
    #[inline]
    pub fn single(&self) -> Option<&L> {
        match self {
            Self::Single(label) => Some(label),
            _ => None,
        }
    }

    /// All labels this leaf may predict (empty for `Unknown`).
    pub fn labels(&self) -> &[L] {
        match self {
            Self::Unknown => &[],
            Self::Single(label) => std::slice::from_ref(label),
            Self::Ambiguous(labels) => labels,
        }
    }

    pub fn contains(&self, label: &L) -> bool {
        self.labels().contains(label)
    }
}

/// Terminal tree position.
///
/// Leaves are never mutated: resolving a label creates a new leaf that
/// replaces this one in the tree. Equality and hashing use identity only.
#[derive(Debug, Clone)]
pub struct Leaf<L> {
    id: LeafId,
    label: LeafLabel<L>,
}

impl<L: Label> Leaf<L> {
    /// Create a leaf with a fresh identity.
    pub fn new(label: LeafLabel<L>) -> Self {
        Self {
            id: LeafId(next_id()),
            label,
        }
    }

    pub fn unknown() -> Self {
        Self::new(LeafLabel::Unknown)
    }

    pub fn labeled(label: L) -> Self {
        Self::new(LeafLabel::Single(label))
    }

    /// Create a leaf describing the given partition labels.
    pub fn from_labels(labels: &[L]) -> Self {
        Self::new(LeafLabel::from_labels(labels))
    }

    #[inline]
    pub fn id(&self) -> LeafId {
        self.id
    }

    #[inline]
    pub fn label(&self) -> &LeafLabel<L> {
        &self.label
    }
}

impl<L> PartialEq for Leaf<L> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<L> Eq for Leaf<L> {}

impl<L> Hash for Leaf<L> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Distinct labels in first-seen order.
pub fn distinct_labels<L: Label>(labels: &[L]) -> Vec<L> {
    let mut seen = HashSet::with_capacity(labels.len().min(16));
    labels
        .iter()
        .filter(|label| seen.insert(*label))
        .cloned()
        .collect()
}

/// Set equality over two label lists that are already distinct.
///
/// Sets differ when their cardinality differs or their symmetric difference
/// is non-empty.
pub fn same_label_set<L: Label>(a: &[L], b: &[L]) -> bool {
    a.len() == b.len() && a.iter().all(|label| b.contains(label))
}
