//! Distances between descriptor groups derived from correspondence matching.

use crate::{
    feature::DescriptorGroup,
    matching::{RadiusTest, RatioTest},
};

use super::{Metric, Result};

/// Correspondence test used to compare two descriptor groups.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GroupMatch {
    /// Count query descriptors with any target within a radius.
    Radius(RadiusTest),
    /// Count query descriptors whose nearest target passes Lowe's ratio test.
    Ratio(RatioTest),
}

/// Scores a candidate group by the share of query descriptors that find a
/// correspondence in it: the distance is `1 - fraction`.
///
/// The measure is directional. The left-hand group supplies the query
/// descriptors.
///
/// # Examples
/// ```
/// use vicinity_core::{
///     DescriptorGroup, FloatDescriptor, GroupMatchMetric, KeyPoint, L1Metric, Metric, RadiusTest,
/// };
///
/// let at = |value: f32| FloatDescriptor::new(KeyPoint::new(0.0, 0.0, 0.0, 1.0), vec![value]);
/// let query = DescriptorGroup::new(vec![at(0.0), at(10.0)]);
/// let candidate = DescriptorGroup::new(vec![at(0.5)]);
///
/// let metric = GroupMatchMetric::radius(L1Metric::new(), RadiusTest::new(1.0)?);
/// assert_eq!(metric.distance(&query, &candidate)?, 0.5);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct GroupMatchMetric<M> {
    descriptor_metric: M,
    test: GroupMatch,
}

impl<M> GroupMatchMetric<M> {
    /// Compares groups with `test`, measuring descriptors with
    /// `descriptor_metric`.
    #[must_use]
    pub const fn new(descriptor_metric: M, test: GroupMatch) -> Self {
        Self {
            descriptor_metric,
            test,
        }
    }

    /// Compares groups with the radius test.
    #[must_use]
    pub const fn radius(descriptor_metric: M, test: RadiusTest) -> Self {
        Self::new(descriptor_metric, GroupMatch::Radius(test))
    }

    /// Compares groups with the ratio test.
    #[must_use]
    pub const fn ratio(descriptor_metric: M, test: RatioTest) -> Self {
        Self::new(descriptor_metric, GroupMatch::Ratio(test))
    }

    /// Test used to decide correspondences.
    #[must_use]
    pub const fn test(&self) -> GroupMatch {
        self.test
    }

    /// Share of `query` descriptors with a correspondence in `candidate`.
    ///
    /// # Errors
    /// Propagates descriptor metric failures.
    pub fn match_fraction<D>(
        &self,
        query: &DescriptorGroup<D>,
        candidate: &DescriptorGroup<D>,
    ) -> Result<f64>
    where
        M: Metric<D>,
    {
        let (queries, targets) = (query.descriptors(), candidate.descriptors());
        match self.test {
            GroupMatch::Radius(test) => {
                test.match_fraction(&self.descriptor_metric, queries, targets)
            }
            GroupMatch::Ratio(test) => {
                test.match_fraction(&self.descriptor_metric, queries, targets)
            }
        }
    }
}

impl<D, M> Metric<DescriptorGroup<D>> for GroupMatchMetric<M>
where
    D: Send + Sync,
    M: Metric<D>,
{
    fn distance(&self, left: &DescriptorGroup<D>, right: &DescriptorGroup<D>) -> Result<f32> {
        let fraction = self.match_fraction(left, right)?;
        Ok((1.0 - fraction) as f32)
    }
}
