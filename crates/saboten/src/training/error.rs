use crate::features::RouterError;
use crate::model::ModelError;
use crate::repr::TreeError;

/// Errors returned by [`Generator`](super::Generator).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrowError {
    #[error("got {samples} samples but {labels} labels")]
    LengthMismatch { samples: usize, labels: usize },

    #[error("sample index {index} out of range for {len} samples")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot build a tree from zero samples")]
    EmptyTrainingSet,

    #[error("no usable split among {n_features} features for {n_samples} samples")]
    NoUsableSplit { n_features: usize, n_samples: usize },

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Router(#[from] RouterError),
}
