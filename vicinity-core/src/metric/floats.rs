//! Minkowski metrics over dense float vectors.

use std::sync::Arc;

use crate::{
    error::MetricError,
    feature::{AsFloats, FloatsFeature},
};

use super::{
    MeanEvaluator, Metric, Result,
    helpers::{bounded_sum, ensure_same_dimension, mean_components, sum_terms},
};

/// Manhattan (L1) distance with early exit on the running sum.
///
/// # Examples
/// ```
/// use vicinity_core::{FloatsFeature, L1Metric, MeanEvaluator, Metric};
///
/// let metric = L1Metric::new();
/// let left = FloatsFeature::new(vec![1.0, 2.0]);
/// let right = FloatsFeature::new(vec![4.0, 0.0]);
/// assert_eq!(metric.distance(&left, &right)?, 5.0);
///
/// let mean = metric.mean(&[left, right])?;
/// assert_eq!(mean, FloatsFeature::new(vec![2.5, 1.0]));
/// # Ok::<(), vicinity_core::MetricError>(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct L1Metric;

impl L1Metric {
    /// Creates the metric.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn abs_diffs<'a>(left: &'a [f32], right: &'a [f32]) -> impl Iterator<Item = f64> + 'a {
    left.iter()
        .zip(right)
        .map(|(&l, &r)| (f64::from(l) - f64::from(r)).abs())
}

impl<T: AsFloats + ?Sized> Metric<T> for L1Metric {
    fn distance(&self, left: &T, right: &T) -> Result<f32> {
        let (left, right) = (left.floats(), right.floats());
        ensure_same_dimension(left.len(), right.len())?;
        Ok(sum_terms(abs_diffs(left, right), |sum| sum as f32))
    }

    fn distance_within(&self, left: &T, right: &T, max: f32) -> Result<Option<f32>> {
        let (left, right) = (left.floats(), right.floats());
        ensure_same_dimension(left.len(), right.len())?;
        Ok(bounded_sum(
            abs_diffs(left, right),
            max,
            f64::from(max),
            |sum| sum as f32,
        ))
    }
}

impl MeanEvaluator<FloatsFeature> for L1Metric {
    fn mean(&self, items: &[FloatsFeature]) -> Result<FloatsFeature> {
        mean_components(items.iter().map(AsFloats::floats)).map(FloatsFeature::new)
    }
}

/// Euclidean (L2) distance, optionally weighting each dimension.
///
/// Weights are fixed at construction and must be finite and non-negative.
/// Early exit compares the running squared sum against the squared bound.
///
/// # Examples
/// ```
/// use vicinity_core::{FloatsFeature, L2Metric, Metric};
///
/// let left = FloatsFeature::new(vec![0.0, 0.0]);
/// let right = FloatsFeature::new(vec![3.0, 4.0]);
/// assert_eq!(L2Metric::new().distance(&left, &right)?, 5.0);
///
/// let weighted = L2Metric::weighted(vec![4.0, 0.0])?;
/// assert_eq!(weighted.distance(&left, &right)?, 6.0);
/// # Ok::<(), vicinity_core::MetricError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct L2Metric {
    weights: Option<Arc<[f32]>>,
}

impl L2Metric {
    /// Creates an unweighted metric.
    #[must_use]
    pub const fn new() -> Self {
        Self { weights: None }
    }

    /// Creates a metric that scales each squared difference by `weights[i]`.
    ///
    /// # Errors
    /// Returns [`MetricError::InvalidWeight`] when a weight is negative, NaN,
    /// or infinite.
    pub fn weighted(weights: impl Into<Arc<[f32]>>) -> Result<Self> {
        let weights = weights.into();
        if let Some((index, &value)) = weights
            .iter()
            .enumerate()
            .find(|(_, weight)| !weight.is_finite() || **weight < 0.0)
        {
            return Err(MetricError::InvalidWeight { index, value });
        }
        Ok(Self {
            weights: Some(weights),
        })
    }

    /// Returns the per-dimension weights, if any.
    #[must_use]
    pub fn weights(&self) -> Option<&[f32]> {
        self.weights.as_deref()
    }

    fn squared_terms<'a>(
        &'a self,
        left: &'a [f32],
        right: &'a [f32],
    ) -> Result<Box<dyn Iterator<Item = f64> + 'a>> {
        ensure_same_dimension(left.len(), right.len())?;
        let diffs = left.iter().zip(right).map(|(&l, &r)| {
            let diff = f64::from(l) - f64::from(r);
            diff * diff
        });
        match self.weights.as_deref() {
            None => Ok(Box::new(diffs)),
            Some(weights) => {
                if weights.len() != left.len() {
                    return Err(MetricError::DimensionMismatch {
                        left: weights.len(),
                        right: left.len(),
                    });
                }
                Ok(Box::new(
                    diffs
                        .zip(weights)
                        .map(|(squared, &weight)| squared * f64::from(weight)),
                ))
            }
        }
    }
}

impl<T: AsFloats + ?Sized> Metric<T> for L2Metric {
    fn distance(&self, left: &T, right: &T) -> Result<f32> {
        let terms = self.squared_terms(left.floats(), right.floats())?;
        Ok(sum_terms(terms, |sum| sum.sqrt() as f32))
    }

    fn distance_within(&self, left: &T, right: &T, max: f32) -> Result<Option<f32>> {
        let terms = self.squared_terms(left.floats(), right.floats())?;
        Ok(bounded_sum(terms, max, f64::from(max).powi(2), |sum| {
            sum.sqrt() as f32
        }))
    }
}

impl MeanEvaluator<FloatsFeature> for L2Metric {
    fn mean(&self, items: &[FloatsFeature]) -> Result<FloatsFeature> {
        mean_components(items.iter().map(AsFloats::floats)).map(FloatsFeature::new)
    }
}
