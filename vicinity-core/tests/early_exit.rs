//! Early-exit metrics prune exactly the pairs that lie beyond the bound.

mod common;

use proptest::prelude::*;
use vicinity_core::{CosineMetric, FloatsFeature, HammingMetric, L1Metric, L2Metric, Metric};

fn float_pair(max_len: usize) -> impl Strategy<Value = (Vec<f32>, Vec<f32>)> {
    (0..max_len).prop_flat_map(|len| {
        (
            prop::collection::vec(-100.0_f32..100.0, len),
            prop::collection::vec(-100.0_f32..100.0, len),
        )
    })
}

fn word_pair(max_len: usize) -> impl Strategy<Value = (Vec<u64>, Vec<u64>)> {
    (0..max_len).prop_flat_map(|len| {
        (
            prop::collection::vec(any::<u64>(), len),
            prop::collection::vec(any::<u64>(), len),
        )
    })
}

fn assert_exact<T: ?Sized, M: Metric<T>>(
    metric: &M,
    left: &T,
    right: &T,
    max: f32,
) -> Result<(), TestCaseError> {
    let full = metric.distance(left, right).expect("inputs are comparable");
    let bounded = metric
        .distance_within(left, right, max)
        .expect("inputs are comparable");
    if full > max {
        prop_assert_eq!(bounded, None);
    } else {
        prop_assert_eq!(bounded, Some(full));
    }
    Ok(())
}

proptest! {
    #![proptest_config(common::proptest_config(128))]

    #[test]
    fn l1_prunes_exactly((left, right) in float_pair(40), max in 0.0_f32..4_000.0) {
        assert_exact(&L1Metric::new(), left.as_slice(), right.as_slice(), max)?;
    }

    #[test]
    fn l2_prunes_exactly((left, right) in float_pair(40), max in 0.0_f32..600.0) {
        let (left, right) = (FloatsFeature::new(left), FloatsFeature::new(right));
        assert_exact(&L2Metric::new(), &left, &right, max)?;
    }

    #[test]
    fn weighted_l2_prunes_exactly(
        (left, right, weights) in (0_usize..24).prop_flat_map(|len| (
            prop::collection::vec(-10.0_f32..10.0, len),
            prop::collection::vec(-10.0_f32..10.0, len),
            prop::collection::vec(0.0_f32..5.0, len),
        )),
        max in 0.0_f32..200.0,
    ) {
        let metric = L2Metric::weighted(weights).expect("weights are non-negative");
        assert_exact(&metric, left.as_slice(), right.as_slice(), max)?;
    }

    #[test]
    fn hamming_prunes_exactly((left, right) in word_pair(6), max in 0.0_f32..400.0) {
        assert_exact(&HammingMetric::new(), left.as_slice(), right.as_slice(), max)?;
    }

    #[test]
    fn cosine_never_prunes((left, right) in float_pair(16), max in 0.0_f32..2.0) {
        let metric = CosineMetric::new();
        let full = metric.distance(left.as_slice(), right.as_slice()).expect("same length");
        let bounded = metric
            .distance_within(left.as_slice(), right.as_slice(), max)
            .expect("same length");
        prop_assert_eq!(bounded, Some(full));
    }
}
