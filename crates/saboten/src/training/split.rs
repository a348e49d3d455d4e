//! Best-split search over a leaf's training data.
//!
//! The search is deliberately cheap: candidate features are visited in a
//! random order and the first one that separates the labels seen at its
//! extremes wins outright. Only if none does is the last candidate used.
//!
//! Per feature a single pass over the samples records the minimum and the
//! maximum together with the labels observed at each extreme. Ties add to
//! the label set; a strictly better extreme resets it.

use rand::prelude::*;

use crate::features::FeatureRouter;
use crate::model::TrainDataCache;
use crate::repr::{same_label_set, Label};

use super::error::GrowError;

// ============================================================================
// SplitCandidate
// ============================================================================

/// A proposed split of a leaf: `feature[column] <= threshold` goes left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitCandidate {
    pub column: usize,
    pub threshold: f64,
    /// Spread of the feature over the leaf (`max - min`).
    pub gain: f64,
    /// True when the labels at the extremes differ, i.e. the split is known
    /// to separate at least two labels.
    pub quick_accepted: bool,
}

// ============================================================================
// FeatureExtremes
// ============================================================================

/// Running min/max of one feature with the labels seen at each extreme.
#[derive(Debug, Clone)]
struct FeatureExtremes<L> {
    min: f64,
    max: f64,
    min_labels: Vec<L>,
    max_labels: Vec<L>,
}

impl<L: Label> FeatureExtremes<L> {
    fn new(value: f64, label: &L) -> Self {
        Self {
            min: value,
            max: value,
            min_labels: vec![label.clone()],
            max_labels: vec![label.clone()],
        }
    }

    fn observe(&mut self, value: f64, label: &L) {
        if value < self.min {
            self.min = value;
            self.min_labels.clear();
            self.min_labels.push(label.clone());
        } else if value == self.min && !self.min_labels.contains(label) {
            self.min_labels.push(label.clone());
        }

        if value > self.max {
            self.max = value;
            self.max_labels.clear();
            self.max_labels.push(label.clone());
        } else if value == self.max && !self.max_labels.contains(label) {
            self.max_labels.push(label.clone());
        }
    }

    #[inline]
    fn gain(&self) -> f64 {
        if self.min == self.max {
            0.0
        } else {
            self.max - self.min
        }
    }

    /// Midpoint of the extremes, kept in `[min, max)` whenever `min < max`
    /// so that `<=` puts the minimum left and the maximum right.
    fn threshold(&self) -> f64 {
        let (min, max) = (self.min, self.max);
        if min == max {
            return min;
        }
        if min == f64::NEG_INFINITY && max == f64::INFINITY {
            return 0.0;
        }
        if max == f64::INFINITY {
            return f64::MAX;
        }
        // Halve first: `min + (max - min) / 2` overflows for wide finite ranges.
        let mid = min / 2.0 + max / 2.0;
        if mid < max {
            mid
        } else {
            min
        }
    }

    #[inline]
    fn separates(&self) -> bool {
        !same_label_set(&self.min_labels, &self.max_labels)
    }

    fn into_candidate(self, column: usize) -> SplitCandidate {
        let gain = self.gain();
        SplitCandidate {
            column,
            threshold: self.threshold(),
            gain,
            quick_accepted: gain > 0.0 && self.separates(),
        }
    }
}

// ============================================================================
// Search
// ============================================================================

/// Find a split for `data`.
///
/// Every feature examined is prefetched into the samples of `data`, so the
/// caller keeps the computed values and [`TrainDataCache::partition`] can
/// read the chosen column directly. NaN values are ignored when tracking the
/// extremes.
///
/// # Errors
///
/// [`GrowError::NoUsableSplit`] if there are no samples, no features, or no
/// feature with a single non-NaN value.
pub fn find_best_split<L, R>(
    data: &mut TrainDataCache<L>,
    router: &FeatureRouter,
    rng: &mut R,
) -> Result<SplitCandidate, GrowError>
where
    L: Label,
    R: Rng + ?Sized,
{
    let n_features = router.total_output_features();
    let no_split = GrowError::NoUsableSplit {
        n_features,
        n_samples: data.len(),
    };
    if data.is_empty() || n_features == 0 {
        return Err(no_split);
    }

    let mut columns: Vec<usize> = (0..n_features).collect();
    columns.shuffle(rng);

    let mut fallback = None;
    for column in columns {
        let Some(extremes) = scan_feature(data, column, router)? else {
            continue;
        };
        let candidate = extremes.into_candidate(column);
        if candidate.quick_accepted {
            return Ok(candidate);
        }
        fallback = Some(candidate);
    }

    fallback.ok_or(no_split)
}

/// Prefetch `column` for every sample and collect its extremes.
fn scan_feature<L: Label>(
    data: &mut TrainDataCache<L>,
    column: usize,
    router: &FeatureRouter,
) -> Result<Option<FeatureExtremes<L>>, GrowError> {
    let mut extremes: Option<FeatureExtremes<L>> = None;
    let (samples, labels) = data.samples_and_labels_mut();

    for (sample, label) in samples.iter_mut().zip(labels) {
        let (cache, value) = sample.fetch(column, router)?;
        *sample = cache;
        if value.is_nan() {
            continue;
        }
        match extremes.as_mut() {
            Some(ext) => ext.observe(value, label),
            None => extremes = Some(FeatureExtremes::new(value, label)),
        }
    }

    Ok(extremes)
}

#[cfg(test)]
mod tests {
    use rand_xoshiro::Xoshiro256PlusPlus;
    use rstest::rstest;

    use super::*;
    use crate::testing::{identity_router, samples};

    fn data(rows: &[&[f64]], labels: &[i32]) -> TrainDataCache<i32> {
        TrainDataCache::from_parts(samples(rows), labels.to_vec())
    }

    fn rng(seed: u64) -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(seed)
    }

    #[test]
    fn extremes_accumulate_ties_and_reset_on_improvement() {
        let mut ext = FeatureExtremes::new(5.0, &1);
        ext.observe(5.0, &2);
        assert_eq!(ext.min_labels, vec![1, 2]);
        ext.observe(3.0, &3);
        assert_eq!(ext.min_labels, vec![3]);
        assert_eq!(ext.max_labels, vec![1, 2]);
        assert_eq!(ext.gain(), 2.0);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(42)]
    fn separating_feature_is_quick_accepted(#[case] seed: u64) {
        // Column 1 is constant, column 0 separates the labels.
        let mut d = data(&[&[1.0, 7.0], &[3.0, 7.0]], &[10, 20]);
        let split = find_best_split(&mut d, &identity_router(2), &mut rng(seed)).unwrap();
        assert_eq!(split.column, 0);
        assert!(split.quick_accepted);
        approx::assert_abs_diff_eq!(split.threshold, 2.0);
        approx::assert_abs_diff_eq!(split.gain, 2.0);
    }

    #[test]
    fn falls_back_when_nothing_separates() {
        let mut d = data(&[&[4.0, 4.0], &[4.0, 4.0]], &[1, 2]);
        let split = find_best_split(&mut d, &identity_router(2), &mut rng(0)).unwrap();
        assert!(!split.quick_accepted);
        assert_eq!(split.gain, 0.0);
        assert_eq!(split.threshold, 4.0);
    }

    #[test]
    fn spread_alone_is_not_enough() {
        // Same label set at both extremes of column 0.
        let mut d = data(&[&[0.0], &[0.0], &[9.0], &[9.0]], &[1, 2, 1, 2]);
        let split = find_best_split(&mut d, &identity_router(1), &mut rng(3)).unwrap();
        assert!(!split.quick_accepted);
        approx::assert_abs_diff_eq!(split.threshold, 4.5);
    }

    #[rstest]
    #[case(f64::NEG_INFINITY, 1.0, f64::NEG_INFINITY)]
    #[case(1.0, f64::INFINITY, f64::MAX)]
    #[case(f64::NEG_INFINITY, f64::INFINITY, 0.0)]
    #[case(-1e308, 1e308, 0.0)]
    fn extreme_values_still_separate(#[case] low: f64, #[case] high: f64, #[case] expected: f64) {
        let mut d = data(&[&[low], &[high]], &[1, 2]);
        let split = find_best_split(&mut d, &identity_router(1), &mut rng(0)).unwrap();

        assert!(split.quick_accepted);
        assert!(!split.threshold.is_nan());
        assert_eq!(split.threshold, expected);

        let (left, right) = d.partition(split.column, split.threshold);
        assert_eq!(left.labels(), &[1]);
        assert_eq!(right.labels(), &[2]);
    }

    #[test]
    fn constant_infinite_feature_has_no_gain() {
        let mut d = data(&[&[f64::INFINITY], &[f64::INFINITY]], &[1, 2]);
        let split = find_best_split(&mut d, &identity_router(1), &mut rng(0)).unwrap();
        assert_eq!(split.gain, 0.0);
        assert!(!split.quick_accepted);
    }

    #[test]
    fn examined_features_are_kept_in_the_samples() {
        let mut d = data(&[&[1.0, 2.0], &[3.0, 4.0]], &[1, 1]);
        find_best_split(&mut d, &identity_router(2), &mut rng(0)).unwrap();
        for sample in d.samples() {
            assert!(sample.cache_hit(0) && sample.cache_hit(1));
        }
    }

    #[test]
    fn nan_values_are_ignored() {
        let mut d = data(&[&[f64::NAN], &[1.0], &[5.0]], &[1, 1, 2]);
        let split = find_best_split(&mut d, &identity_router(1), &mut rng(0)).unwrap();
        assert!(split.quick_accepted);
        approx::assert_abs_diff_eq!(split.threshold, 3.0);
    }

    #[test]
    fn no_samples_or_no_features_is_an_error() {
        let mut empty = TrainDataCache::<i32>::new();
        assert_eq!(
            find_best_split(&mut empty, &identity_router(2), &mut rng(0)).unwrap_err(),
            GrowError::NoUsableSplit {
                n_features: 2,
                n_samples: 0
            }
        );

        let mut d = data(&[&[1.0]], &[1]);
        let router = FeatureRouter::new(Vec::new(), &[1.0]);
        assert!(matches!(
            find_best_split(&mut d, &router, &mut rng(0)),
            Err(GrowError::NoUsableSplit { n_features: 0, .. })
        ));
    }

    #[test]
    fn all_nan_feature_is_unusable() {
        let mut d = data(&[&[f64::NAN], &[f64::NAN]], &[1, 2]);
        assert!(find_best_split(&mut d, &identity_router(1), &mut rng(0)).is_err());
    }
}
