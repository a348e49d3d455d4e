//! Training samples accumulated per leaf.

use crate::features::SampleFeatureCache;
use crate::repr::{distinct_labels, Label};

/// Samples and their true labels, kept for one leaf.
///
/// The two sequences always have the same length. Caches only ever grow by
/// concatenation; a leaf's cache is dropped when the leaf is retired.
#[derive(Debug, Clone)]
pub struct TrainDataCache<L> {
    samples: Vec<SampleFeatureCache>,
    labels: Vec<L>,
}

impl<L> Default for TrainDataCache<L> {
    fn default() -> Self {
        Self {
            samples: Vec::new(),
            labels: Vec::new(),
        }
    }
}

impl<L: Label> TrainDataCache<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Panics
    ///
    /// Panics if `samples` and `labels` differ in length.
    pub fn from_parts(samples: Vec<SampleFeatureCache>, labels: Vec<L>) -> Self {
        assert_eq!(
            samples.len(),
            labels.len(),
            "samples and labels must have the same length"
        );
        Self { samples, labels }
    }

    pub fn single(sample: SampleFeatureCache, label: L) -> Self {
        Self {
            samples: vec![sample],
            labels: vec![label],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn samples(&self) -> &[SampleFeatureCache] {
        &self.samples
    }

    /// Samples (writable, to store prefetched features back) beside their labels.
    #[inline]
    pub(crate) fn samples_and_labels_mut(&mut self) -> (&mut [SampleFeatureCache], &[L]) {
        (&mut self.samples, &self.labels)
    }

    #[inline]
    pub fn labels(&self) -> &[L] {
        &self.labels
    }

    pub fn push(&mut self, sample: SampleFeatureCache, label: L) {
        self.samples.push(sample);
        self.labels.push(label);
    }

    /// Concatenate `other` after `self`.
    pub fn merge(&self, other: &TrainDataCache<L>) -> Self {
        let mut merged = self.clone();
        merged.extend(other.clone());
        merged
    }

    pub(crate) fn extend(&mut self, other: TrainDataCache<L>) {
        self.samples.extend(other.samples);
        self.labels.extend(other.labels);
    }

    /// Distinct labels in first-seen order.
    pub fn distinct_labels(&self) -> Vec<L> {
        distinct_labels(&self.labels)
    }

    /// Split into (`feature[column] <= threshold`, rest).
    ///
    /// Every sample must already have `column` fetched.
    pub fn partition(self, column: usize, threshold: f64) -> (Self, Self) {
        let mut left = Self::new();
        let mut right = Self::new();
        for (sample, label) in self.samples.into_iter().zip(self.labels) {
            if sample[column] <= threshold {
                left.push(sample, label);
            } else {
                right.push(sample, label);
            }
        }
        (left, right)
    }
}
