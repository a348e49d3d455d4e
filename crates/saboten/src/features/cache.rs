//! Per-sample lazy feature cache.
//!
//! A [`SampleFeatureCache`] pairs a raw sample with the transformed features
//! computed for it so far. Tree walks only need the handful of features
//! their nodes test, so features are computed on demand, one transformer
//! block at a time, and remembered across walks.
//!
//! The cache is a persistent value: [`SampleFeatureCache::load_cache`] and
//! [`SampleFeatureCache::prefetch`] return a new cache and leave the receiver
//! untouched. Storage is shared through `Arc` until one side writes.

use std::ops::{Index, Range};
use std::sync::Arc;

use fixedbitset::FixedBitSet;

use super::router::{FeatureRouter, RouterError};

/// Raw sample plus the features computed for it so far.
///
/// `values` and `fetched` always have the same logical length. Indices past
/// that length, and indices inside it whose flag is unset, are cache misses.
#[derive(Debug, Clone)]
pub struct SampleFeatureCache {
    raw: Arc<[f64]>,
    values: Arc<Vec<f64>>,
    fetched: Arc<FixedBitSet>,
}

impl SampleFeatureCache {
    /// Wrap a raw sample with an empty cache.
    pub fn from_raw(raw: impl Into<Arc<[f64]>>) -> Self {
        Self {
            raw: raw.into(),
            values: Arc::new(Vec::new()),
            fetched: Arc::new(FixedBitSet::new()),
        }
    }

    /// The raw sample transformers are applied to.
    #[inline]
    pub fn raw(&self) -> &[f64] {
        &self.raw
    }

    /// Logical length (highest loaded index + 1).
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of indices actually fetched.
    #[inline]
    pub fn n_fetched(&self) -> usize {
        self.fetched.count_ones(..)
    }

    /// All stored values, placeholders included.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns true if `index` is in bounds and has been fetched.
    #[inline]
    pub fn cache_hit(&self, index: usize) -> bool {
        index < self.values.len() && self.fetched.contains(index)
    }

    /// The cached value at `index`, or `None` on a miss.
    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.cache_hit(index).then(|| self.values[index])
    }

    /// Merge a batch of computed values at `range` into a new cache.
    ///
    /// - `range.start == len`: append.
    /// - `range.start > len`: pad the gap with unfetched zeros, then append.
    /// - `range.start < len`: replace `[start, end)` (clipped to `len`) with
    ///   the new values. Transformers may be probed in any order.
    pub fn load_cache(&self, range: Range<usize>, values: &[f64]) -> Self {
        debug_assert_eq!(range.len(), values.len(), "range and values length differ");

        let mut next = self.clone();
        let stored = Arc::make_mut(&mut next.values);
        let n = stored.len();
        let start = range.start;

        if start >= n {
            stored.resize(start, 0.0);
            stored.extend_from_slice(values);
        } else {
            let end = (start + values.len()).min(n);
            stored.splice(start..end, values.iter().copied());
        }

        let len = stored.len();
        let fetched = Arc::make_mut(&mut next.fetched);
        fetched.grow(len);
        fetched.insert_range(start..start + values.len());
        next
    }

    /// Compute and load the block owning `feature_index` unless it is cached.
    pub fn prefetch(&self, feature_index: usize, router: &FeatureRouter) -> Result<Self, RouterError> {
        if self.cache_hit(feature_index) {
            return Ok(self.clone());
        }
        let (range, values) = router.compute(feature_index, &self.raw)?;
        Ok(self.load_cache(range, &values))
    }

    /// Prefetch every feature the router exposes.
    pub fn prefetch_all(&self, router: &FeatureRouter) -> Result<Self, RouterError> {
        let mut cache = self.clone();
        for index in 0..router.total_output_features() {
            cache = cache.prefetch(index, router)?;
        }
        Ok(cache)
    }

    /// Prefetch `feature_index` and read it.
    pub fn fetch(&self, feature_index: usize, router: &FeatureRouter) -> Result<(Self, f64), RouterError> {
        let cache = self.prefetch(feature_index, router)?;
        let value = cache[feature_index];
        Ok((cache, value))
    }
}

/// Reads a fetched feature. Call [`SampleFeatureCache::prefetch`] first.
impl Index<usize> for SampleFeatureCache {
    type Output = f64;

    #[inline]
    fn index(&self, index: usize) -> &f64 {
        debug_assert!(
            self.cache_hit(index),
            "feature {} read before it was fetched",
            index
        );
        &self.values[index]
    }
}
