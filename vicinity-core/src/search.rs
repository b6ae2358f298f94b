//! Entry point for running top-K searches.

use core::borrow::Borrow;
use std::{num::NonZeroUsize, sync::Arc};

use tracing::{info, instrument};

use crate::{
    error::Result,
    feature::Identified,
    metric::Metric,
    parallel::FanOut,
    result::{Payload, RankedResults, StorageMode},
    selector::TopKSelector,
};

/// Validated search configuration that creates selectors and runs searches.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use vicinity_core::{FloatsFeature, Item, ItemId, KnnSearchBuilder, L1Metric};
///
/// let search = KnnSearchBuilder::new().with_k(2).build()?;
/// let candidates: Vec<_> = [4.0, 1.0, 3.0, 2.0]
///     .into_iter()
///     .enumerate()
///     .map(|(id, value)| Item::new(ItemId::new(id as u64), FloatsFeature::new(vec![value])))
///     .collect();
///
/// let query = Arc::new(FloatsFeature::new(vec![0.0]));
/// let results = search.run(L1Metric::new(), query, &candidates)?;
/// assert_eq!(results.distances(), vec![1.0, 2.0]);
/// assert_eq!(results.ids(), vec![ItemId::new(1), ItemId::new(3)]);
/// # Ok::<(), vicinity_core::SearchError>(())
/// ```
#[derive(Clone, Debug)]
pub struct KnnSearch {
    k: NonZeroUsize,
    storage: StorageMode,
    fan_out: FanOut,
}

impl KnnSearch {
    pub(crate) fn new(k: NonZeroUsize, storage: StorageMode, fan_out: FanOut) -> Self {
        Self {
            k,
            storage,
            fan_out,
        }
    }

    /// Number of neighbours each search keeps.
    #[must_use]
    pub fn k(&self) -> NonZeroUsize {
        self.k
    }

    /// What each search keeps per accepted candidate.
    #[must_use]
    pub fn storage(&self) -> StorageMode {
        self.storage
    }

    /// Fan-out used by [`TopKSelector::offer_all`].
    #[must_use]
    pub fn fan_out(&self) -> &FanOut {
        &self.fan_out
    }

    /// Creates an empty selector for `query`.
    ///
    /// # Errors
    /// Returns [`crate::SearchError::Metric`] when `metric` rejects the query,
    /// for example because a feature collector lacks a required feature.
    pub fn selector<T, C, M>(&self, metric: M, query: Arc<T>) -> Result<TopKSelector<T, C, M>>
    where
        T: ?Sized + Send + Sync,
        C: Borrow<T> + Identified + Clone + Send + Sync,
        M: Metric<T>,
    {
        TopKSelector::new(metric, query, self.k, self.storage, self.fan_out.clone())
    }

    /// Ranks `candidates` against `query` and returns the nearest `k`.
    ///
    /// # Errors
    /// Propagates query validation and scoring failures.
    #[instrument(
        name = "search.run",
        err,
        skip(self, metric, query, candidates),
        fields(candidates = candidates.len(), k = self.k.get()),
    )]
    pub fn run<T, C, M>(
        &self,
        metric: M,
        query: Arc<T>,
        candidates: &[C],
    ) -> Result<RankedResults<T, Payload<C>>>
    where
        T: ?Sized + Send + Sync,
        C: Borrow<T> + Identified + Clone + Send + Sync,
        M: Metric<T>,
    {
        let selector = self.selector(metric, query)?;
        selector.offer_all(candidates)?;
        let results = selector.into_results()?;
        info!(kept = results.len(), "search completed");
        Ok(results)
    }
}
