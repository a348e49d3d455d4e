//! Feature router: global feature index to owning transformer.
//!
//! Transformers are registered in bulk and each emits a variable number of
//! features. The router lays their outputs end to end in registration order,
//! so transformer `i` owns the half-open range `[offset_i, offset_i + k_i)`,
//! and resolves a feature index back to its owner by binary search.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use super::transformer::{FeatureExtractor, Identity, Transformer};

/// Errors raised while resolving or computing features.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    #[error("feature index {index} out of range: router exposes {total} features")]
    FeatureOutOfRange { index: usize, total: usize },

    #[error("transformer for features {start}..{end} produced {got} values, expected {expected}")]
    WidthMismatch {
        start: usize,
        end: usize,
        expected: usize,
        got: usize,
    },
}

/// A transformer together with the feature indices it owns.
#[derive(Clone)]
pub struct TransformerRange {
    range: Range<usize>,
    transformer: Arc<dyn Transformer>,
}

impl TransformerRange {
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    #[inline]
    pub fn transformer(&self) -> &dyn Transformer {
        self.transformer.as_ref()
    }

    /// Offset of a global feature index within this transformer's output.
    #[inline]
    pub fn local_offset(&self, feature_index: usize) -> usize {
        debug_assert!(self.range.contains(&feature_index));
        feature_index - self.range.start
    }

    #[inline]
    fn width(&self) -> usize {
        self.range.len()
    }
}

impl fmt::Debug for TransformerRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerRange")
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

/// Ordered, non-overlapping transformer ranges covering
/// `[0, total_output_features)`.
#[derive(Clone)]
pub struct FeatureRouter {
    ranges: Vec<TransformerRange>,
    extractor: Arc<dyn FeatureExtractor>,
}

impl FeatureRouter {
    /// Build a router with the identity extractor.
    ///
    /// Every transformer is invoked once on `probe` to learn its width.
    pub fn new(transformers: Vec<Arc<dyn Transformer>>, probe: &[f64]) -> Self {
        Self::with_extractor(transformers, Arc::new(Identity), probe)
    }

    /// Build a router whose transformers see `extractor(raw)` instead of the
    /// raw sample.
    pub fn with_extractor(
        transformers: Vec<Arc<dyn Transformer>>,
        extractor: Arc<dyn FeatureExtractor>,
        probe: &[f64],
    ) -> Self {
        let working = extractor.extract(probe);
        let mut offset = 0;
        let ranges = transformers
            .into_iter()
            .map(|transformer| {
                let width = transformer.transform(&working).len();
                let range = offset..offset + width;
                offset += width;
                TransformerRange { range, transformer }
            })
            .collect();

        Self { ranges, extractor }
    }

    /// Total number of features across all transformers.
    #[inline]
    pub fn total_output_features(&self) -> usize {
        self.ranges.last().map_or(0, |r| r.range.end)
    }

    #[inline]
    pub fn n_transformers(&self) -> usize {
        self.ranges.len()
    }

    #[inline]
    pub fn ranges(&self) -> &[TransformerRange] {
        &self.ranges
    }

    /// Resolve the transformer owning `feature_index`.
    pub fn data_transformer(&self, feature_index: usize) -> Result<&TransformerRange, RouterError> {
        let total = self.total_output_features();
        if feature_index >= total {
            return Err(RouterError::FeatureOutOfRange {
                index: feature_index,
                total,
            });
        }

        let found = self.ranges.binary_search_by(|entry| {
            if feature_index < entry.range.start {
                Ordering::Greater
            } else if feature_index >= entry.range.end {
                Ordering::Less
            } else {
                Ordering::Equal
            }
        });

        // Ranges tile [0, total) so an in-range index always has an owner.
        match found {
            Ok(pos) => Ok(&self.ranges[pos]),
            Err(_) => Err(RouterError::FeatureOutOfRange {
                index: feature_index,
                total,
            }),
        }
    }

    /// Run the transformer owning `feature_index` on a raw sample.
    ///
    /// Returns the owner's full range with its freshly computed values.
    pub fn compute(
        &self,
        feature_index: usize,
        raw: &[f64],
    ) -> Result<(Range<usize>, Vec<f64>), RouterError> {
        let entry = self.data_transformer(feature_index)?;
        let working = self.extractor.extract(raw);
        let values = entry.transformer.transform(&working);
        if values.len() != entry.width() {
            return Err(RouterError::WidthMismatch {
                start: entry.range.start,
                end: entry.range.end,
                expected: entry.width(),
                got: values.len(),
            });
        }
        Ok((entry.range(), values))
    }
}

impl fmt::Debug for FeatureRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureRouter")
            .field("ranges", &self.ranges)
            .field("total_output_features", &self.total_output_features())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(width: usize, value: f64) -> Arc<dyn Transformer> {
        Arc::new(move |_: &[f64]| vec![value; width])
    }

    #[test]
    fn ranges_are_laid_out_in_order() {
        let router = FeatureRouter::new(
            vec![constant(2, 0.0), constant(3, 1.0), constant(1, 2.0)],
            &[0.0],
        );
        let ranges: Vec<_> = router.ranges().iter().map(|r| r.range()).collect();
        assert_eq!(ranges, vec![0..2, 2..5, 5..6]);
        assert_eq!(router.total_output_features(), 6);
    }

    #[test]
    fn resolves_owner_and_offset() {
        let router = FeatureRouter::new(vec![constant(2, 0.0), constant(3, 1.0)], &[0.0]);
        let entry = router.data_transformer(3).unwrap();
        assert_eq!(entry.range(), 2..5);
        assert_eq!(entry.local_offset(3), 1);
    }

    #[test]
    fn zero_width_transformers_own_nothing() {
        let router = FeatureRouter::new(
            vec![constant(1, 0.0), constant(0, 9.0), constant(1, 1.0)],
            &[0.0],
        );
        assert_eq!(router.data_transformer(1).unwrap().range(), 1..2);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let router = FeatureRouter::new(vec![constant(2, 0.0)], &[0.0]);
        assert_eq!(
            router.data_transformer(2).unwrap_err(),
            RouterError::FeatureOutOfRange { index: 2, total: 2 }
        );
        let empty = FeatureRouter::new(Vec::new(), &[0.0]);
        assert!(empty.data_transformer(0).is_err());
    }

    #[test]
    fn extractor_runs_before_transformers() {
        let sum: Arc<dyn Transformer> = Arc::new(|x: &[f64]| vec![x.iter().sum::<f64>()]);
        let tail: Arc<dyn FeatureExtractor> = Arc::new(|x: &[f64]| x[1..].to_vec());
        let router = FeatureRouter::with_extractor(vec![sum], tail, &[1.0, 2.0, 3.0]);
        let (range, values) = router.compute(0, &[10.0, 2.0, 3.0]).unwrap();
        assert_eq!(range, 0..1);
        assert_eq!(values, vec![5.0]);
    }

    #[test]
    fn width_drift_is_reported() {
        let echo: Arc<dyn Transformer> = Arc::new(|x: &[f64]| x.to_vec());
        let router = FeatureRouter::new(vec![echo], &[0.0, 0.0]);
        let err = router.compute(0, &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, RouterError::WidthMismatch { expected: 2, got: 3, .. }));
    }
}
