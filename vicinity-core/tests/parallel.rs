//! Partitioning and parallelism budget behaviour seen from whole searches.

mod common;

use std::{
    sync::{
        Arc, Barrier,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use common::{origin, points, search};
use proptest::prelude::*;
use rstest::rstest;
use vicinity_core::{
    AsFloats, ConcurrencyPolicy, FanOut, FloatsFeature, KnnSearchBuilder, L1Metric, Metric,
    MetricError, ParallelismBudget, SearchError, partition, split_sizes,
};

#[test]
fn seventeen_candidates_over_five_ranges() {
    let sizes = split_sizes(17, 5);
    assert_eq!(sizes.iter().sum::<usize>(), 17);
    assert!(sizes.iter().all(|size| (3..=4).contains(size)));
    assert_eq!(partition(17, 5).len(), 5);
}

#[rstest]
#[case::no_slots(0, 1)]
#[case::one_slot(1, 2)]
#[case::more_slots_than_items(64, 6)]
fn fan_out_uses_granted_slots_plus_the_caller(#[case] slots: usize, #[case] expected: usize) {
    let budget = Arc::new(ParallelismBudget::new(slots));
    let fan_out = FanOut::new(ConcurrencyPolicy::Parallel, Arc::clone(&budget));
    let visited = AtomicUsize::new(0);

    let ranges = fan_out
        .drive(&[1, 2, 3, 4, 5, 6], |_| {
            visited.fetch_add(1, Ordering::Relaxed);
            Ok::<(), ()>(())
        })
        .expect("visit never fails");

    assert_eq!(ranges, expected);
    assert_eq!(visited.load(Ordering::Relaxed), 6);
    assert_eq!(budget.free(), slots);
}

#[test]
fn concurrent_reservations_never_oversubscribe() {
    const SLOTS: usize = 5;
    const THREADS: usize = 12;
    let budget = ParallelismBudget::new(SLOTS);
    let held = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);
    let start = Barrier::new(THREADS);

    thread::scope(|scope| {
        for wanted in 1..=THREADS {
            let (budget, held, peak, start) = (&budget, &held, &peak, &start);
            scope.spawn(move || {
                start.wait();
                for _ in 0..200 {
                    let reservation = budget.reserve(wanted % 4 + 1);
                    let now = held.fetch_add(reservation.granted(), Ordering::SeqCst)
                        + reservation.granted();
                    peak.fetch_max(now, Ordering::SeqCst);
                    held.fetch_sub(reservation.granted(), Ordering::SeqCst);
                }
            });
        }
    });

    assert!(peak.load(Ordering::SeqCst) <= SLOTS);
    assert_eq!(budget.free(), SLOTS);
}

/// L1 distance that fails once it meets a negative component.
#[derive(Clone, Copy)]
struct RejectsNegatives;

impl Metric<FloatsFeature> for RejectsNegatives {
    fn distance(&self, left: &FloatsFeature, right: &FloatsFeature) -> Result<f32, MetricError> {
        if right.floats().iter().any(|value| *value < 0.0) {
            return Err(MetricError::DimensionMismatch { left: 1, right: 0 });
        }
        L1Metric::new().distance(left, right)
    }
}

#[test]
fn failed_searches_return_every_slot() {
    let budget = Arc::new(ParallelismBudget::new(3));
    let knn = KnnSearchBuilder::new()
        .with_k(4)
        .with_concurrency(ConcurrencyPolicy::Parallel)
        .with_budget(Arc::clone(&budget))
        .build()
        .expect("configuration is valid");
    let values: Vec<f32> = (0..40_u8)
        .map(|index| if index == 29 { -1.0 } else { f32::from(index) })
        .collect();

    let err = knn
        .run(RejectsNegatives, origin(), &points(&values))
        .expect_err("one candidate cannot be scored");

    assert!(matches!(err, SearchError::Metric { .. }));
    assert_eq!(budget.free(), 3);
}

#[test]
fn overlapping_searches_share_one_budget() {
    let budget = Arc::new(ParallelismBudget::new(2));
    let knn = KnnSearchBuilder::new()
        .with_k(3)
        .with_budget(Arc::clone(&budget))
        .build()
        .expect("configuration is valid");
    let values: Vec<f32> = (0..500_u16).map(f32::from).collect();
    let candidates = points(&values);

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let results = knn
                    .run(L1Metric::new(), origin(), &candidates)
                    .expect("search succeeds");
                assert_eq!(results.distances(), vec![0.0, 1.0, 2.0]);
            });
        }
    });

    assert_eq!(budget.free(), 2);
}

proptest! {
    #![proptest_config(common::proptest_config(64))]

    #[test]
    fn ranges_tile_the_batch(len in 0_usize..500, parts in 1_usize..32) {
        let ranges = partition(len, parts);
        let ceiling = len.div_ceil(parts);
        let mut next = 0;
        for range in &ranges {
            prop_assert_eq!(range.start, next);
            prop_assert!(!range.is_empty());
            prop_assert!(range.len() <= ceiling);
            next = range.end;
        }
        prop_assert_eq!(next, len);
        prop_assert!(ranges.len() <= parts);
    }

    #[test]
    fn worker_count_never_changes_the_outcome(
        len in 1_usize..120,
        slots in 0_usize..6,
    ) {
        let values: Vec<f32> = (0..len).map(|index| ((index * 7) % 13) as f32).collect();
        let candidates = points(&values);
        let sequential = search(5, ConcurrencyPolicy::Sequential, 0)
            .run(L1Metric::new(), origin(), &candidates)
            .expect("sequential search succeeds");
        let parallel = search(5, ConcurrencyPolicy::Parallel, slots)
            .run(L1Metric::new(), origin(), &candidates)
            .expect("parallel search succeeds");
        prop_assert!(sequential.same_entries(&parallel));
    }
}
