//! Tree growth.
//!
//! - [`Generator`]: ingests labeled samples and grows a [`Model`](crate::model::Model)
//! - [`find_best_split`]: the cheap extreme-label split heuristic
//! - [`GeneratorConfig`]: seed, verbosity and thread count
//! - [`TrainingLogger`], [`Verbosity`]: verbosity-gated logging

mod config;
mod error;
mod generator;
mod logger;
mod split;

pub use config::GeneratorConfig;
pub use error::GrowError;
pub use generator::{Generator, GrowReport};
pub use logger::{TrainingLogger, Verbosity};
pub use split::{find_best_split, SplitCandidate};
