//! Trained model: a tree over routed features plus the training samples
//! each leaf has absorbed.

mod train_data;
mod tree_model;

pub use train_data::TrainDataCache;
pub use tree_model::{Model, ModelError};
