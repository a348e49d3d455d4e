//! saboten: incremental decision-tree induction over lazily transformed features.
//!
//! A binary decision tree classifier is grown sample by sample. Samples are
//! raw vectors (image windows, for glyph discrimination); the tree splits on
//! features produced from them by pluggable transformers, which are only
//! computed when a walk actually needs them.
//!
//! # Key Types
//!
//! - [`Tree`] - persistent, copy-on-write tree of [`Node`]s and [`Leaf`]s
//! - [`FeatureRouter`] - maps a global feature index to its transformer
//! - [`SampleFeatureCache`] - per-sample lazy store of computed features
//! - [`Model`] - tree + router + per-leaf training data, with prediction
//! - [`Generator`] - grows a model from labeled samples
//!
//! # Example
//!
//! ```
//! use saboten::testing::{identity_router, samples};
//! use saboten::{Generator, GeneratorConfig, LeafLabel, Model};
//!
//! let model = Model::new(identity_router(2));
//! let data = samples(&[&[2.0, 90.0], &[250.0, 140.0]]);
//!
//! let mut generator = Generator::new(GeneratorConfig::builder().seed(1).build());
//! let model = generator.generate(&model, &data, &["a", "b"]).unwrap();
//!
//! assert_eq!(model.predict(&data[1]).unwrap(), &LeafLabel::Single("b"));
//! ```

pub mod features;
pub mod model;
pub mod repr;
pub mod testing;
pub mod training;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use repr::{Label, Leaf, LeafId, LeafLabel, Node, NodeId, Side, Tree, TreeError};

pub use features::{FeatureExtractor, FeatureRouter, RouterError, SampleFeatureCache, Transformer};

pub use model::{Model, ModelError, TrainDataCache};

pub use training::{Generator, GeneratorConfig, GrowError, GrowReport, Verbosity};

pub use utils::{dedicated_pool, run_with_threads, Parallelism};
