//! Immutable model: tree, feature router and per-leaf training data.

use std::collections::HashMap;
use std::sync::Arc;

use crate::features::{FeatureRouter, RouterError, SampleFeatureCache};
use crate::repr::{Child, Label, Leaf, LeafId, LeafLabel, Side, Tree, TreeError};
use crate::utils::Parallelism;

use super::train_data::TrainDataCache;

/// Errors raised by model operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("model has no tree yet")]
    EmptyTree,

    #[error("leaf {0} has no training data")]
    MissingTrainData(LeafId),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// A decision tree bound to the features it splits on.
///
/// Every mutation returns a new model; snapshots are cheap to clone and safe
/// to read from several threads while a coordinator builds the next one.
#[derive(Debug, Clone)]
pub struct Model<L> {
    tree: Tree<L>,
    router: Arc<FeatureRouter>,
    train_data: Arc<HashMap<LeafId, TrainDataCache<L>>>,
}

impl<L: Label> Model<L> {
    /// Create a model with an empty tree.
    pub fn new(router: impl Into<Arc<FeatureRouter>>) -> Self {
        Self {
            tree: Tree::new(),
            router: router.into(),
            train_data: Arc::new(HashMap::new()),
        }
    }

    #[inline]
    pub fn tree(&self) -> &Tree<L> {
        &self.tree
    }

    #[inline]
    pub fn router(&self) -> &FeatureRouter {
        &self.router
    }

    /// Training data accumulated for `leaf`, if any.
    pub fn train_data(&self, leaf: &Leaf<L>) -> Option<&TrainDataCache<L>> {
        self.train_data.get(&leaf.id())
    }

    /// Number of leaves holding training data.
    pub fn n_cached_leaves(&self) -> usize {
        self.train_data.len()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Swap in a new tree.
    pub fn update_tree(&self, tree: Tree<L>) -> Self {
        Self {
            tree,
            router: Arc::clone(&self.router),
            train_data: Arc::clone(&self.train_data),
        }
    }

    /// Append `data` to the cache of `leaf`, creating it if needed.
    pub fn add_train_data_cache(&self, leaf: &Leaf<L>, data: TrainDataCache<L>) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.train_data)
            .entry(leaf.id())
            .or_default()
            .extend(data);
        next
    }

    /// Drop the cache of a retired leaf.
    pub fn remove_train_data_cache(&self, leaf: &Leaf<L>) -> Result<Self, ModelError> {
        if !self.train_data.contains_key(&leaf.id()) {
            return Err(ModelError::MissingTrainData(leaf.id()));
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.train_data).remove(&leaf.id());
        Ok(next)
    }

    /// Overwrite the cache of `leaf` (same samples, more features fetched).
    pub(crate) fn replace_train_data_cache(&self, leaf: &Leaf<L>, data: TrainDataCache<L>) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.train_data).insert(leaf.id(), data);
        next
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Route a sample from the root to its leaf.
    ///
    /// Each visited node's feature is prefetched into the sample cache; the
    /// updated cache is returned with the leaf so callers can keep it.
    pub fn predict_leaf(
        &self,
        sample: &SampleFeatureCache,
    ) -> Result<(&Leaf<L>, SampleFeatureCache), ModelError> {
        let mut node = *self.tree.root().ok_or(ModelError::EmptyTree)?;
        let mut cache = sample.clone();

        loop {
            let (next_cache, value) = cache.fetch(node.column(), &self.router)?;
            cache = next_cache;
            let side = if node.goes_left(value) {
                Side::Left
            } else {
                Side::Right
            };
            match self.tree.child(&node, side)? {
                Child::Node(child) => node = *child,
                Child::Leaf(leaf) => return Ok((leaf, cache)),
            }
        }
    }

    /// Label payload of the leaf `sample` reaches.
    pub fn predict(&self, sample: &SampleFeatureCache) -> Result<&LeafLabel<L>, ModelError> {
        self.predict_leaf(sample).map(|(leaf, _)| leaf.label())
    }

    /// Predict a batch of samples, in parallel if allowed.
    pub fn predict_batch(
        &self,
        samples: &[SampleFeatureCache],
        parallelism: Parallelism,
    ) -> Result<Vec<LeafLabel<L>>, ModelError> {
        parallelism
            .maybe_par_map(samples, |sample| self.predict(sample).cloned())
            .into_iter()
            .collect()
    }
}
