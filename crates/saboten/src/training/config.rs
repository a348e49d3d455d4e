//! Generator configuration.
//!
//! ```
//! use saboten::training::{GeneratorConfig, Verbosity};
//!
//! let config = GeneratorConfig::builder()
//!     .seed(7)
//!     .verbosity(Verbosity::Info)
//!     .build();
//! assert_eq!(config.n_threads, 1);
//! ```

use bon::Builder;

use super::logger::Verbosity;

/// Settings for a [`Generator`](super::Generator).
#[derive(Debug, Clone, Builder)]
#[builder(derive(Clone, Debug))]
pub struct GeneratorConfig {
    /// Seed for the candidate-feature shuffle. Default: 0.
    #[builder(default = 0)]
    pub seed: u64,

    /// Verbosity level. Default: `Silent`.
    #[builder(default)]
    pub verbosity: Verbosity,

    /// Threads used to route incremental samples.
    ///
    /// `0` uses the global rayon pool, `1` runs sequentially. Default: 1.
    #[builder(default = 1)]
    pub n_threads: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
