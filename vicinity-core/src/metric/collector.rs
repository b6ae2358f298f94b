//! Adapts feature metrics to whole feature collectors.

use std::marker::PhantomData;

use crate::{
    error::MetricError,
    feature::{Feature, FeatureCollector, FeatureKind},
};

use super::{Metric, Result};

/// Scores feature collectors by fetching feature `F` from both sides and
/// delegating to `M`.
///
/// # Examples
/// ```
/// use vicinity_core::{
///     CollectorMetric, FeatureCollector, FloatsFeature, ItemId, L1Metric, Metric,
/// };
///
/// let metric = CollectorMetric::<_, FloatsFeature>::new(L1Metric::new());
/// let a = FeatureCollector::new(ItemId::new(1)).with_feature(FloatsFeature::new(vec![0.0]));
/// let b = FeatureCollector::new(ItemId::new(2)).with_feature(FloatsFeature::new(vec![2.0]));
/// assert_eq!(metric.distance(&a, &b)?, 2.0);
///
/// let bare = FeatureCollector::new(ItemId::new(3));
/// assert!(metric.check_query(&bare).is_err());
/// # Ok::<(), vicinity_core::MetricError>(())
/// ```
pub struct CollectorMetric<M, F> {
    inner: M,
    kinds: [FeatureKind; 1],
    _feature: PhantomData<fn() -> F>,
}

impl<M, F: Feature> CollectorMetric<M, F> {
    /// Wraps `inner`, which measures features of type `F`.
    #[must_use]
    pub const fn new(inner: M) -> Self {
        Self {
            inner,
            kinds: [F::KIND],
            _feature: PhantomData,
        }
    }

    /// Borrows the wrapped feature metric.
    #[must_use]
    pub const fn inner(&self) -> &M {
        &self.inner
    }

    fn fetch<'a>(collector: &'a FeatureCollector) -> Result<&'a F> {
        collector
            .feature::<F>()
            .ok_or(MetricError::MissingFeature {
                collector: collector.item_id(),
                kind: F::KIND,
            })
    }
}

impl<M: Clone, F> Clone for CollectorMetric<M, F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            kinds: self.kinds,
            _feature: PhantomData,
        }
    }
}

impl<M: core::fmt::Debug, F> core::fmt::Debug for CollectorMetric<M, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CollectorMetric")
            .field("inner", &self.inner)
            .field("kind", &self.kinds[0])
            .finish()
    }
}

impl<M, F> Metric<FeatureCollector> for CollectorMetric<M, F>
where
    M: Metric<F>,
    F: Feature,
{
    fn required_features(&self) -> &[FeatureKind] {
        &self.kinds
    }

    fn distance(&self, left: &FeatureCollector, right: &FeatureCollector) -> Result<f32> {
        self.inner.distance(Self::fetch(left)?, Self::fetch(right)?)
    }

    fn distance_within(
        &self,
        left: &FeatureCollector,
        right: &FeatureCollector,
        max: f32,
    ) -> Result<Option<f32>> {
        self.inner
            .distance_within(Self::fetch(left)?, Self::fetch(right)?, max)
    }

    fn check_query(&self, query: &FeatureCollector) -> Result<()> {
        self.inner.check_query(Self::fetch(query)?)
    }
}
