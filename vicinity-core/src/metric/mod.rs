//! Distance functions with early-exit support.
//!
//! A [`Metric`] may stop computing as soon as it can prove that the distance
//! exceeds a caller-supplied bound; the top-K selector feeds it the current
//! admission threshold so hopeless candidates cost only a partial scan.

mod collector;
mod cosine;
mod floats;
mod group;
mod hamming;
mod helpers;

use std::sync::Arc;

use crate::{error::MetricError, feature::FeatureKind};

pub use self::{
    collector::CollectorMetric,
    cosine::CosineMetric,
    floats::{L1Metric, L2Metric},
    group::{GroupMatch, GroupMatchMetric},
    hamming::HammingMetric,
};

/// Convenient alias for metric computations.
pub type Result<T> = core::result::Result<T, MetricError>;

/// A distance function over `T`.
///
/// Implementations must return finite, non-negative distances. Metrics are
/// shared between worker threads and therefore must be [`Send`] and [`Sync`];
/// any statistics they need are fixed at construction.
///
/// # Examples
/// ```
/// use vicinity_core::{FloatsFeature, L1Metric, Metric};
///
/// let metric = L1Metric::new();
/// let a = FloatsFeature::new(vec![0.0, 0.0]);
/// let b = FloatsFeature::new(vec![3.0, 4.0]);
/// assert_eq!(metric.distance(&a, &b)?, 7.0);
/// assert_eq!(metric.distance_within(&a, &b, 5.0)?, None);
/// assert_eq!(metric.distance_within(&a, &b, 7.0)?, Some(7.0));
/// # Ok::<(), vicinity_core::MetricError>(())
/// ```
pub trait Metric<T: ?Sized>: Send + Sync {
    /// Feature kinds this metric reads from a [`crate::FeatureCollector`].
    ///
    /// Metrics over raw values need nothing and return an empty slice.
    fn required_features(&self) -> &[FeatureKind] {
        &[]
    }

    /// Computes the full distance between `left` and `right`.
    ///
    /// # Errors
    /// Returns a [`MetricError`] when the inputs cannot be compared.
    fn distance(&self, left: &T, right: &T) -> Result<f32>;

    /// Computes the distance, or returns `None` once the implementation can
    /// prove it exceeds `max`.
    ///
    /// `None` is a pruning signal, not a failure. Implementations without an
    /// early exit return the full distance even when it exceeds `max`.
    ///
    /// # Errors
    /// Returns a [`MetricError`] when the inputs cannot be compared.
    fn distance_within(&self, left: &T, right: &T, max: f32) -> Result<Option<f32>> {
        let _ = max;
        self.distance(left, right).map(Some)
    }

    /// Validates a query once, before it is compared against any candidate.
    ///
    /// # Errors
    /// Returns a [`MetricError`] when the query can never be scored.
    fn check_query(&self, query: &T) -> Result<()> {
        let _ = query;
        Ok(())
    }
}

/// Computes a representative mean of a collection, for clustering consumers.
pub trait MeanEvaluator<T> {
    /// Returns the mean of `items`.
    ///
    /// # Errors
    /// Returns [`MetricError::EmptyMean`] for an empty slice and
    /// [`MetricError::DimensionMismatch`] when items disagree in shape.
    fn mean(&self, items: &[T]) -> Result<T>;
}

impl<T: ?Sized, M: Metric<T> + ?Sized> Metric<T> for Arc<M> {
    fn required_features(&self) -> &[FeatureKind] {
        (**self).required_features()
    }

    fn distance(&self, left: &T, right: &T) -> Result<f32> {
        (**self).distance(left, right)
    }

    fn distance_within(&self, left: &T, right: &T, max: f32) -> Result<Option<f32>> {
        (**self).distance_within(left, right, max)
    }

    fn check_query(&self, query: &T) -> Result<()> {
        (**self).check_query(query)
    }
}
