//! Shared test utilities for `vicinity-core`.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use proptest::test_runner::Config as ProptestConfig;
use vicinity_test_support::ci::property_test_profile::ProptestRunProfile;

use crate::{
    error::MetricError,
    feature::AsFloats,
    metric::{L1Metric, Metric, Result},
};

/// Builds a standard proptest configuration from the shared CI profile.
///
/// This keeps property suites aligned on the same `PROGTEST_CASES` and
/// `VICINITY_PBT_FORK` interpretation.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

/// L1 metric that records the early-exit bound of every bounded call.
#[derive(Clone, Default)]
pub(crate) struct CountingMetric {
    bounds: Arc<Mutex<Vec<f32>>>,
    pruned: Arc<AtomicUsize>,
}

impl CountingMetric {
    /// Bounds passed to [`Metric::distance_within`], in call order.
    pub(crate) fn bounds(&self) -> Vec<f32> {
        self.bounds.lock().expect("bounds lock poisoned").clone()
    }

    /// Number of calls that returned the out-of-range sentinel.
    pub(crate) fn pruned(&self) -> usize {
        self.pruned.load(Ordering::Relaxed)
    }
}

impl<T: AsFloats + ?Sized> Metric<T> for CountingMetric {
    fn distance(&self, left: &T, right: &T) -> Result<f32> {
        L1Metric::new().distance(left, right)
    }

    fn distance_within(&self, left: &T, right: &T, max: f32) -> Result<Option<f32>> {
        self.bounds.lock().expect("bounds lock poisoned").push(max);
        let distance = L1Metric::new().distance_within(left, right, max)?;
        if distance.is_none() {
            self.pruned.fetch_add(1, Ordering::Relaxed);
        }
        Ok(distance)
    }
}

/// Metric that fails every comparison.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FailingMetric;

impl<T: ?Sized> Metric<T> for FailingMetric {
    fn distance(&self, _left: &T, _right: &T) -> Result<f32> {
        Err(MetricError::DimensionMismatch { left: 0, right: 1 })
    }
}
