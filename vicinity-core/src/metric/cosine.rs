//! Cosine distance, optionally weighted by inverse document frequency.

use std::sync::Arc;

use crate::{
    error::MetricError,
    feature::{AsFloats, FloatsFeature},
};

use super::{
    MeanEvaluator, Metric, Result,
    helpers::{ensure_same_dimension, mean_components},
};

/// Cosine distance `1 - similarity`, with similarity clamped to `[-1, 1]`.
///
/// When an IDF vector is supplied each component is scaled by its weight
/// before the vectors are compared, as for TF-IDF histograms. A vector with
/// zero magnitude is treated as orthogonal to everything and yields `1.0`; a
/// NaN component yields a NaN distance.
///
/// # Examples
/// ```
/// use vicinity_core::{CosineMetric, FloatsFeature, Metric};
///
/// let a = FloatsFeature::new(vec![1.0, 0.0, 0.0]);
/// let b = FloatsFeature::new(vec![0.0, 1.0, 0.0]);
/// let orthogonal = CosineMetric::new().distance(&a, &b)?;
/// assert!((orthogonal - 1.0).abs() < 1e-6);
/// # Ok::<(), vicinity_core::MetricError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct CosineMetric {
    idf: Option<Arc<[f32]>>,
}

impl CosineMetric {
    /// Creates an unweighted cosine metric.
    #[must_use]
    pub const fn new() -> Self {
        Self { idf: None }
    }

    /// Creates a metric that scales component `i` of both vectors by `idf[i]`.
    #[must_use]
    pub fn with_idf(idf: impl Into<Arc<[f32]>>) -> Self {
        Self {
            idf: Some(idf.into()),
        }
    }

    /// Returns the IDF weights, if any.
    #[must_use]
    pub fn idf(&self) -> Option<&[f32]> {
        self.idf.as_deref()
    }

    fn accumulate(&self, left: &[f32], right: &[f32]) -> Result<(f64, f64, f64)> {
        ensure_same_dimension(left.len(), right.len())?;
        let weights: Box<dyn Iterator<Item = f64> + '_> = match self.idf.as_deref() {
            Some(idf) if idf.len() != left.len() => {
                return Err(MetricError::DimensionMismatch {
                    left: idf.len(),
                    right: left.len(),
                });
            }
            Some(idf) => Box::new(idf.iter().map(|&weight| f64::from(weight))),
            None => Box::new(std::iter::repeat(1.0)),
        };

        let mut dot = 0.0_f64;
        let mut left_squares = 0.0_f64;
        let mut right_squares = 0.0_f64;
        for ((&l, &r), weight) in left.iter().zip(right).zip(weights) {
            let (l, r) = (f64::from(l) * weight, f64::from(r) * weight);
            dot += l * r;
            left_squares += l * l;
            right_squares += r * r;
        }
        Ok((dot, left_squares, right_squares))
    }
}

impl<T: AsFloats + ?Sized> Metric<T> for CosineMetric {
    fn distance(&self, left: &T, right: &T) -> Result<f32> {
        let (dot, left_squares, right_squares) = self.accumulate(left.floats(), right.floats())?;
        let denominator = left_squares.sqrt() * right_squares.sqrt();
        if denominator.is_nan() || dot.is_nan() {
            return Ok(f32::NAN);
        }
        if denominator == 0.0 || denominator.is_infinite() {
            return Ok(1.0);
        }
        // Rounding can push the ratio just outside [-1, 1].
        let similarity = ((dot / denominator) as f32).clamp(-1.0, 1.0);
        Ok(1.0 - similarity)
    }
}

impl MeanEvaluator<FloatsFeature> for CosineMetric {
    fn mean(&self, items: &[FloatsFeature]) -> Result<FloatsFeature> {
        mean_components(items.iter().map(AsFloats::floats)).map(FloatsFeature::new)
    }
}
