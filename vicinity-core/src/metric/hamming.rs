//! Hamming distance over packed binary descriptors.

use crate::feature::AsBits;

use super::{Metric, Result, helpers::ensure_same_dimension};

/// Counts differing bits, checking the bound after every 64-bit word.
///
/// # Examples
/// ```
/// use vicinity_core::{HammingMetric, Metric};
///
/// let left: &[u64] = &[0b1011, u64::MAX];
/// let right: &[u64] = &[0b0001, 0];
/// assert_eq!(HammingMetric::new().distance(left, right)?, 66.0);
/// assert_eq!(HammingMetric::new().distance_within(left, right, 10.0)?, None);
/// # Ok::<(), vicinity_core::MetricError>(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct HammingMetric;

impl HammingMetric {
    /// Creates the metric.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<T: AsBits + ?Sized> Metric<T> for HammingMetric {
    fn distance(&self, left: &T, right: &T) -> Result<f32> {
        let (left, right) = (left.words(), right.words());
        ensure_same_dimension(left.len(), right.len())?;
        let bits: u64 = left
            .iter()
            .zip(right)
            .map(|(l, r)| u64::from((l ^ r).count_ones()))
            .sum();
        Ok(bits as f32)
    }

    fn distance_within(&self, left: &T, right: &T, max: f32) -> Result<Option<f32>> {
        let (left, right) = (left.words(), right.words());
        ensure_same_dimension(left.len(), right.len())?;
        let mut bits = 0_u64;
        for (l, r) in left.iter().zip(right) {
            bits += u64::from((l ^ r).count_ones());
            if bits as f32 > max {
                return Ok(None);
            }
        }
        Ok(Some(bits as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{BinaryDescriptor, KeyPoint};
    use rstest::rstest;

    fn descriptor(words: &[u64]) -> BinaryDescriptor {
        BinaryDescriptor::new(KeyPoint::new(0.0, 0.0, 0.0, 1.0), words.to_vec())
    }

    #[rstest]
    #[case(0.0, None)]
    #[case(63.0, None)]
    #[case(64.0, Some(64.0))]
    #[case(200.0, Some(64.0))]
    fn early_exit_is_exact(#[case] max: f32, #[case] expected: Option<f32>) {
        let left = descriptor(&[u64::MAX, 0]);
        let right = descriptor(&[0, 0]);
        let metric = HammingMetric::new();
        assert_eq!(metric.distance_within(&left, &right, max), Ok(expected));
        assert_eq!(metric.distance(&left, &right), Ok(64.0));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let result = HammingMetric::new().distance(&descriptor(&[0]), &descriptor(&[0, 0]));
        assert!(result.is_err());
    }
}
