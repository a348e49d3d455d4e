//! Shared helpers for tests and benchmarks.
//!
//! Transformers here stand in for real feature generators (box filters over
//! integral images and similar) so the growth algorithm can be exercised on
//! plain vectors.

use std::sync::Arc;

use rand::prelude::*;

use crate::features::{FeatureRouter, SampleFeatureCache, Transformer};

// =============================================================================
// Transformers
// =============================================================================

/// Passes the sample through unchanged.
pub fn identity() -> Arc<dyn Transformer> {
    Arc::new(|x: &[f64]| x.to_vec())
}

/// Emits the given columns of the sample, in order.
pub fn select(columns: Vec<usize>) -> Arc<dyn Transformer> {
    Arc::new(move |x: &[f64]| columns.iter().map(|&c| x[c]).collect::<Vec<f64>>())
}

/// Emits the mean of every sliding window of `width` consecutive values.
pub fn window_means(width: usize) -> Arc<dyn Transformer> {
    assert!(width > 0, "window width must be positive");
    Arc::new(move |x: &[f64]| {
        x.windows(width)
            .map(|w| w.iter().sum::<f64>() / width as f64)
            .collect::<Vec<f64>>()
    })
}

/// Router exposing the `n_columns` raw columns as features.
pub fn identity_router(n_columns: usize) -> FeatureRouter {
    FeatureRouter::new(vec![identity()], &vec![0.0; n_columns])
}

// =============================================================================
// Samples
// =============================================================================

/// Wrap each row in an empty feature cache.
pub fn samples(rows: &[&[f64]]) -> Vec<SampleFeatureCache> {
    rows.iter()
        .map(|row| SampleFeatureCache::from_raw(row.to_vec()))
        .collect()
}

/// Random rows with values in `[0, 256)` and labels in `0..n_labels`.
pub fn random_samples(
    n_rows: usize,
    n_columns: usize,
    n_labels: u32,
    seed: u64,
) -> (Vec<SampleFeatureCache>, Vec<u32>) {
    assert!(n_labels > 0);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(n_rows);
    let mut labels = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        let row: Vec<f64> = (0..n_columns).map(|_| rng.gen_range(0.0..256.0)).collect();
        rows.push(SampleFeatureCache::from_raw(row));
        labels.push(rng.gen_range(0..n_labels));
    }
    (rows, labels)
}

// =============================================================================
// Scenarios
// =============================================================================

/// Three separable glyph samples.
pub fn scenario_separable() -> (Vec<SampleFeatureCache>, Vec<u32>) {
    (
        samples(&[&[2.0, 90.0], &[250.0, 140.0], &[200.0, 100.0]]),
        vec![42, 54, 42],
    )
}

/// Two identical samples with different labels.
pub fn scenario_conflicting() -> (Vec<SampleFeatureCache>, Vec<u32>) {
    (samples(&[&[250.0, 140.0], &[250.0, 140.0]]), vec![54, 42])
}

/// The conflicting pair followed by a sample that can be told apart.
pub fn scenario_conflicting_then_separable() -> (Vec<SampleFeatureCache>, Vec<u32>) {
    (
        samples(&[&[250.0, 140.0], &[250.0, 140.0], &[215.0, 140.0]]),
        vec![54, 42, 42],
    )
}
