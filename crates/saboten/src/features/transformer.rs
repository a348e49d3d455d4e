//! Transformer and extractor seams.
//!
//! Feature generation (window averages over integral images and the like)
//! lives outside this crate. It plugs in through [`Transformer`]; plain
//! closures `Fn(&[f64]) -> Vec<f64>` implement it directly.

use std::borrow::Cow;

/// Maps a raw sample to a block of output features.
///
/// Implementations must be pure and deterministic, and must produce the same
/// number of outputs for every input of the same width: the router probes
/// the width once and trusts it afterwards.
pub trait Transformer: Send + Sync {
    fn transform(&self, sample: &[f64]) -> Vec<f64>;
}

impl<F> Transformer for F
where
    F: Fn(&[f64]) -> Vec<f64> + Send + Sync,
{
    #[inline]
    fn transform(&self, sample: &[f64]) -> Vec<f64> {
        self(sample)
    }
}

/// Derives the working sample a transformer sees from the raw sample.
pub trait FeatureExtractor: Send + Sync {
    fn extract<'a>(&self, raw: &'a [f64]) -> Cow<'a, [f64]>;
}

/// Pass-through extractor (the default).
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl FeatureExtractor for Identity {
    #[inline]
    fn extract<'a>(&self, raw: &'a [f64]) -> Cow<'a, [f64]> {
        Cow::Borrowed(raw)
    }
}

impl<F> FeatureExtractor for F
where
    F: Fn(&[f64]) -> Vec<f64> + Send + Sync,
{
    #[inline]
    fn extract<'a>(&self, raw: &'a [f64]) -> Cow<'a, [f64]> {
        Cow::Owned(self(raw))
    }
}
