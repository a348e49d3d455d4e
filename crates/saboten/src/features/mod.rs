//! Feature space: transformers, the router over their outputs, and the
//! per-sample lazy cache of computed features.

mod cache;
mod router;
mod transformer;

pub use cache::SampleFeatureCache;
pub use router::{FeatureRouter, RouterError, TransformerRange};
pub use transformer::{FeatureExtractor, Identity, Transformer};
