//! Fixtures shared by the integration suites.
#![allow(dead_code, reason = "each suite uses a different subset of fixtures")]

use std::sync::Arc;

use proptest::test_runner::Config as ProptestConfig;
use vicinity_core::{
    ConcurrencyPolicy, FloatsFeature, Item, ItemId, KnnSearch, KnnSearchBuilder,
    ParallelismBudget, StorageMode,
};
use vicinity_test_support::ci::property_test_profile::ProptestRunProfile;

pub type Point = Item<FloatsFeature>;

/// One-dimensional points with identifiers matching their position.
#[must_use]
pub fn points(values: &[f32]) -> Vec<Point> {
    values
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            Item::new(
                ItemId::new(index as u64),
                FloatsFeature::new(vec![value]),
            )
        })
        .collect()
}

/// Query at the origin of the one-dimensional line.
#[must_use]
pub fn origin() -> Arc<FloatsFeature> {
    Arc::new(FloatsFeature::new(vec![0.0]))
}

/// Brute-force reference ranking under L1 distance from the origin.
#[must_use]
pub fn reference_ranking(values: &[f32], k: usize) -> Vec<(ItemId, f32)> {
    let mut ranked: Vec<(ItemId, f32)> = values
        .iter()
        .enumerate()
        .map(|(index, value)| (ItemId::new(index as u64), value.abs()))
        .collect();
    ranked.sort_by(|left, right| left.1.total_cmp(&right.1).then(left.0.cmp(&right.0)));
    ranked.truncate(k);
    ranked
}

/// Search with an explicit policy and a private budget of `slots` workers.
#[must_use]
pub fn search(k: usize, policy: ConcurrencyPolicy, slots: usize) -> KnnSearch {
    KnnSearchBuilder::new()
        .with_k(k)
        .with_storage(StorageMode::Identifiers)
        .with_concurrency(policy)
        .with_budget(Arc::new(ParallelismBudget::new(slots)))
        .build()
        .expect("search configuration must be valid")
}

/// Proptest configuration honouring the CI overrides.
#[must_use]
pub fn proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}
