//! Tree generator: grows a [`Model`] from labeled samples.
//!
//! A call runs in two phases:
//!
//! 1. **Ingest.** Without a root, one split over all samples creates the
//!    root and two leaves. With a root, each sample is routed to its current
//!    leaf and appended to that leaf's training data; the tree is untouched.
//! 2. **Rebuild.** Every leaf whose training data disagrees with its label
//!    goes on a stack. Popped leaves are either resolved (an `Unknown` leaf
//!    whose data carries one label) or split. A split with an empty side is
//!    rejected and the leaf is retried on the next call.
//!
//! Routing during ingest is read-only and may run on a rayon pool; every
//! model update happens on the calling thread.

use std::collections::HashMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::features::SampleFeatureCache;
use crate::model::{Model, ModelError, TrainDataCache};
use crate::repr::{Label, Leaf, LeafId, LeafLabel, Node, Tree};
use crate::utils::{dedicated_pool, Parallelism};

use super::config::GeneratorConfig;
use super::error::GrowError;
use super::logger::TrainingLogger;
use super::split::find_best_split;

// ============================================================================
// GrowReport
// ============================================================================

/// What one generation call did to the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrowReport {
    /// Samples ingested by the call.
    pub n_samples: usize,
    /// Whether the call created the root.
    pub initial_build: bool,
    /// `Unknown` leaves replaced by a single-label leaf.
    pub resolved: usize,
    /// Leaves replaced by a two-leaf subtree.
    pub accepted: usize,
    /// Splits dropped because one side was empty. The leaf is kept as is.
    pub rejected: usize,
}

/// A leaf waiting in the rebuild stack.
#[derive(Debug, Clone)]
struct PendingLeaf<L> {
    parent: Node,
    leaf: Leaf<L>,
}

// ============================================================================
// Generator
// ============================================================================

/// Incremental decision-tree generator.
///
/// The generator owns the random stream used to order candidate features, so
/// repeated calls on one generator continue the same seeded sequence. A
/// dedicated routing pool, when `n_threads > 1`, is built once here and
/// shared by every call and every clone.
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
    rng: Xoshiro256PlusPlus,
    parallelism: Parallelism,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
        let pool = dedicated_pool(config.n_threads).map(Arc::new);
        let parallelism = match config.n_threads {
            0 => Parallelism::from_threads(0),
            _ if pool.is_some() => Parallelism::Parallel,
            _ => Parallelism::Sequential,
        };
        Self {
            config,
            rng,
            parallelism,
            pool,
        }
    }

    #[inline]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Grow `model` with `samples` and their `labels`.
    pub fn generate<L: Label>(
        &mut self,
        model: &Model<L>,
        samples: &[SampleFeatureCache],
        labels: &[L],
    ) -> Result<Model<L>, GrowError> {
        self.generate_with_report(model, samples, labels)
            .map(|(model, _)| model)
    }

    /// Grow `model` with the samples at `indices` only.
    pub fn generate_at<L: Label>(
        &mut self,
        model: &Model<L>,
        samples: &[SampleFeatureCache],
        labels: &[L],
        indices: &[usize],
    ) -> Result<Model<L>, GrowError> {
        check_lengths(samples, labels)?;
        let mut picked_samples = Vec::with_capacity(indices.len());
        let mut picked_labels = Vec::with_capacity(indices.len());
        for &index in indices {
            if index >= samples.len() {
                return Err(GrowError::IndexOutOfRange {
                    index,
                    len: samples.len(),
                });
            }
            picked_samples.push(samples[index].clone());
            picked_labels.push(labels[index].clone());
        }
        let data = TrainDataCache::from_parts(picked_samples, picked_labels);
        self.grow(model, data).map(|(model, _)| model)
    }

    /// Like [`generate`](Self::generate), also returning a [`GrowReport`].
    pub fn generate_with_report<L: Label>(
        &mut self,
        model: &Model<L>,
        samples: &[SampleFeatureCache],
        labels: &[L],
    ) -> Result<(Model<L>, GrowReport), GrowError> {
        check_lengths(samples, labels)?;
        let data = TrainDataCache::from_parts(samples.to_vec(), labels.to_vec());
        self.grow(model, data)
    }

    fn grow<L: Label>(
        &mut self,
        model: &Model<L>,
        data: TrainDataCache<L>,
    ) -> Result<(Model<L>, GrowReport), GrowError> {
        let mut logger = TrainingLogger::new(self.config.verbosity);
        let initial = model.tree().is_empty();
        let mut report = GrowReport {
            n_samples: data.len(),
            initial_build: initial,
            ..GrowReport::default()
        };
        logger.start_generation(data.len(), !initial);

        let model = if initial {
            if data.is_empty() {
                return Err(GrowError::EmptyTrainingSet);
            }
            self.initial_build(model, data, &logger)?
        } else {
            self.attach(model, data, &logger)?
        };

        let model = self.rebuild(model, &mut report, &logger)?;
        assert!(
            model.tree().root().is_some(),
            "generation must leave the tree with a root"
        );
        debug_assert!(model.tree().validate().is_ok());

        logger.info(format_args!(
            "rebuild: {} resolved, {} accepted, {} rejected",
            report.resolved, report.accepted, report.rejected
        ));
        logger.finish_generation(model.tree().n_nodes(), model.tree().n_leaves());
        Ok((model, report))
    }

    // ------------------------------------------------------------------------
    // Ingest
    // ------------------------------------------------------------------------

    /// Create the root from one split over all samples.
    fn initial_build<L: Label>(
        &mut self,
        model: &Model<L>,
        mut data: TrainDataCache<L>,
        logger: &TrainingLogger,
    ) -> Result<Model<L>, GrowError> {
        let split = find_best_split(&mut data, model.router(), &mut self.rng)?;
        let root = Node::new(split.column, split.threshold);
        let (left_data, right_data) = data.partition(split.column, split.threshold);

        let left = Leaf::from_labels(&left_data.distinct_labels());
        let right = Leaf::from_labels(&right_data.distinct_labels());
        logger.debug(format_args!(
            "root {} on feature {} <= {}: {} left, {} right",
            root.id(),
            split.column,
            split.threshold,
            left_data.len(),
            right_data.len()
        ));

        let tree = Tree::new().add_node(root, left.clone(), right.clone())?;
        Ok(model
            .update_tree(tree)
            .add_train_data_cache(&left, left_data)
            .add_train_data_cache(&right, right_data))
    }

    /// Route each sample to its current leaf and append it to that leaf's data.
    fn attach<L: Label>(
        &self,
        model: &Model<L>,
        data: TrainDataCache<L>,
        logger: &TrainingLogger,
    ) -> Result<Model<L>, GrowError> {
        let route = || {
            self.parallelism.maybe_par_map(data.samples(), |sample| {
                model
                    .predict_leaf(sample)
                    .map(|(leaf, cache)| (leaf.clone(), cache))
            })
        };
        let routed = match &self.pool {
            Some(pool) => pool.install(route),
            None => route(),
        };

        // Group per leaf, in order of first arrival.
        let mut slots: HashMap<LeafId, usize> = HashMap::new();
        let mut groups: Vec<(Leaf<L>, TrainDataCache<L>)> = Vec::new();
        for (result, label) in routed.into_iter().zip(data.labels()) {
            let (leaf, cache) = result?;
            let slot = *slots.entry(leaf.id()).or_insert_with(|| {
                groups.push((leaf.clone(), TrainDataCache::new()));
                groups.len() - 1
            });
            groups[slot].1.push(cache, label.clone());
        }

        let mut model = model.clone();
        for (leaf, group) in groups {
            logger.debug(format_args!("{} samples routed to leaf {}", group.len(), leaf.id()));
            model = model.add_train_data_cache(&leaf, group);
        }
        Ok(model)
    }

    // ------------------------------------------------------------------------
    // Rebuild
    // ------------------------------------------------------------------------

    fn rebuild<L: Label>(
        &mut self,
        mut model: Model<L>,
        report: &mut GrowReport,
        logger: &TrainingLogger,
    ) -> Result<Model<L>, GrowError> {
        let mut stack: Vec<PendingLeaf<L>> = model
            .tree()
            .leaves()
            .into_iter()
            .filter(|entry| {
                model
                    .train_data(entry.leaf)
                    .is_some_and(|data| needs_rework(entry.leaf.label(), &data.distinct_labels()))
            })
            .map(|entry| PendingLeaf {
                parent: entry.parent,
                leaf: entry.leaf.clone(),
            })
            .collect();
        // Pop in left-to-right order.
        stack.reverse();

        while let Some(PendingLeaf { parent, leaf }) = stack.pop() {
            let mut data = model
                .train_data(&leaf)
                .cloned()
                .ok_or(ModelError::MissingTrainData(leaf.id()))?;
            let distinct = data.distinct_labels();

            if leaf.label().is_unknown() && distinct.len() == 1 {
                let resolved = Leaf::from_labels(&distinct);
                logger.debug(format_args!(
                    "leaf {} resolved to {:?} as {}",
                    leaf.id(),
                    distinct[0],
                    resolved.id()
                ));
                let tree = model.tree().replace_leaf(&parent, &leaf, resolved.clone())?;
                model = model
                    .update_tree(tree)
                    .remove_train_data_cache(&leaf)?
                    .add_train_data_cache(&resolved, data);
                report.resolved += 1;
                continue;
            }

            let split = find_best_split(&mut data, model.router(), &mut self.rng)?;
            let (left_data, right_data) = data.clone().partition(split.column, split.threshold);

            if left_data.is_empty() || right_data.is_empty() {
                logger.warn(format_args!(
                    "split of leaf {} on feature {} <= {} leaves one side empty; retrying on a later call",
                    leaf.id(),
                    split.column,
                    split.threshold
                ));
                report.rejected += 1;
                // Keep the features fetched during the search.
                model = model.replace_train_data_cache(&leaf, data);
                continue;
            }

            let node = Node::new(split.column, split.threshold);
            let left = Leaf::from_labels(&left_data.distinct_labels());
            let right = Leaf::from_labels(&right_data.distinct_labels());
            logger.debug(format_args!(
                "leaf {} split as node {} on feature {} <= {} (gain {}): {} left, {} right",
                leaf.id(),
                node.id(),
                split.column,
                split.threshold,
                split.gain,
                left_data.len(),
                right_data.len()
            ));

            let subtree = Tree::new().add_node(node, left.clone(), right.clone())?;
            let tree = model.tree().replace_leaf_with_subtree(&parent, &leaf, &subtree)?;
            model = model
                .update_tree(tree)
                .remove_train_data_cache(&leaf)?
                .add_train_data_cache(&left, left_data)
                .add_train_data_cache(&right, right_data);
            report.accepted += 1;

            for child in [right, left] {
                if child.label().is_ambiguous() {
                    stack.push(PendingLeaf {
                        parent: node,
                        leaf: child,
                    });
                }
            }
        }

        Ok(model)
    }
}

/// A leaf needs rework when its data holds several labels, or one label
/// other than the leaf's own.
fn needs_rework<L: Label>(label: &LeafLabel<L>, distinct: &[L]) -> bool {
    match distinct {
        [] => false,
        [only] => label.single() != Some(only),
        _ => true,
    }
}

fn check_lengths<L>(samples: &[SampleFeatureCache], labels: &[L]) -> Result<(), GrowError> {
    if samples.len() != labels.len() {
        return Err(GrowError::LengthMismatch {
            samples: samples.len(),
            labels: labels.len(),
        });
    }
    Ok(())
}
