//! Concurrent top-K selection against one query.

use core::{borrow::Borrow, fmt};
use std::{
    num::NonZeroUsize,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicU32, Ordering},
    },
};

use tracing::{Span, field, instrument};

use crate::{
    error::{Result, SearchError},
    feature::Identified,
    metric::Metric,
    parallel::FanOut,
    queue::RankedQueue,
    result::{Payload, RankedEntry, RankedResults, StorageMode},
};

/// Keeps the `k` candidates nearest to a fixed query.
///
/// Offers may arrive from many threads at once. Each offer first scores the
/// candidate against a cached copy of the admission threshold, read without
/// locking and passed to the metric as its early-exit bound. Only candidates
/// that survive take the queue lock, where the threshold is checked again
/// before insertion.
///
/// Selectors are created through [`crate::KnnSearch::selector`].
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use vicinity_core::{FloatsFeature, Item, ItemId, KnnSearchBuilder, L2Metric};
///
/// let search = KnnSearchBuilder::new().with_k(2).build()?;
/// let selector = search.selector(L2Metric::new(), Arc::new(FloatsFeature::new(vec![0.0])))?;
/// for (id, value) in [(1, 3.0), (2, 1.0), (3, 2.0)] {
///     selector.offer(&Item::new(ItemId::new(id), FloatsFeature::new(vec![value])))?;
/// }
/// assert_eq!(selector.last_distance(), 2.0);
/// let ids = selector.into_id_results()?.into_entries();
/// let kept: Vec<_> = ids.iter().map(|entry| entry.item).collect();
/// assert_eq!(kept, vec![ItemId::new(2), ItemId::new(3)]);
/// # Ok::<(), vicinity_core::SearchError>(())
/// ```
pub struct TopKSelector<T: ?Sized, C: Identified, M> {
    metric: M,
    query: Arc<T>,
    k: NonZeroUsize,
    storage: StorageMode,
    queue: Mutex<RankedQueue<Payload<C>>>,
    threshold: AtomicU32,
    fan_out: FanOut,
}

impl<T, C, M> TopKSelector<T, C, M>
where
    T: ?Sized + Send + Sync,
    C: Borrow<T> + Identified + Clone + Send + Sync,
    M: Metric<T>,
{
    /// Validates the query once and prepares an empty selector.
    pub(crate) fn new(
        metric: M,
        query: Arc<T>,
        k: NonZeroUsize,
        storage: StorageMode,
        fan_out: FanOut,
    ) -> Result<Self> {
        metric.check_query(&query)?;
        Ok(Self {
            metric,
            query,
            k,
            storage,
            queue: Mutex::new(RankedQueue::new(k)),
            threshold: AtomicU32::new(f32::MAX.to_bits()),
            fan_out,
        })
    }

    /// Scores `candidate` and keeps it when it ranks among the best `k`.
    ///
    /// Returns whether the candidate was kept. A candidate the metric prunes
    /// early is simply not kept.
    ///
    /// # Errors
    /// Returns [`SearchError::Metric`] when scoring fails,
    /// [`SearchError::NonFiniteDistance`] for invalid distances, and
    /// [`SearchError::QueuePoisoned`] when another thread panicked while
    /// holding the queue.
    pub fn offer(&self, candidate: &C) -> Result<bool> {
        let bound = self.cached_threshold();
        let scored = self
            .metric
            .distance_within(&self.query, Borrow::<T>::borrow(candidate), bound)?;
        match scored {
            Some(distance) if !distance.is_finite() || distance < 0.0 => {
                Err(SearchError::NonFiniteDistance { value: distance })
            }
            Some(distance) if distance <= bound => self.offer_with_distance(candidate, distance),
            _ => Ok(false),
        }
    }

    /// Inserts `candidate` at an already computed `distance`.
    ///
    /// The distance is compared against the authoritative threshold inside
    /// the queue lock, so a candidate that lost a race is rejected here.
    ///
    /// # Errors
    /// Returns [`SearchError::NonFiniteDistance`] when `distance` is NaN,
    /// infinite, or negative, and [`SearchError::QueuePoisoned`] when the
    /// queue lock is poisoned.
    pub fn offer_with_distance(&self, candidate: &C, distance: f32) -> Result<bool> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(SearchError::NonFiniteDistance { value: distance });
        }
        let mut queue = self.lock()?;
        if distance > queue.last_distance() {
            return Ok(false);
        }
        let kept = queue.offer(Payload::store(candidate, self.storage), distance);
        if kept {
            self.threshold
                .store(queue.last_distance().to_bits(), Ordering::Release);
        }
        Ok(kept)
    }

    /// Offers every candidate, splitting the batch across worker threads when
    /// the search allows it.
    ///
    /// The first error is reported once every worker has finished; the
    /// results gathered so far stay in the selector.
    ///
    /// # Errors
    /// Propagates the first error returned by [`Self::offer`].
    #[instrument(
        name = "search.offer_all",
        err,
        skip(self, candidates),
        fields(candidates = candidates.len(), workers = field::Empty, k = self.k.get()),
    )]
    pub fn offer_all(&self, candidates: &[C]) -> Result<()> {
        let workers = self
            .fan_out
            .drive(candidates, |candidate| self.offer(candidate).map(drop))?;
        Span::current().record("workers", workers);
        Ok(())
    }

    /// Current admission threshold; [`f32::MAX`] until `k` candidates are kept.
    #[must_use]
    pub fn last_distance(&self) -> f32 {
        self.cached_threshold()
    }

    /// Nearest kept entry.
    ///
    /// # Errors
    /// Returns [`SearchError::QueuePoisoned`] when the queue lock is poisoned.
    pub fn first(&self) -> Result<Option<RankedEntry<Payload<C>>>> {
        Ok(self.lock()?.first().cloned())
    }

    /// Number of kept entries.
    ///
    /// # Errors
    /// Returns [`SearchError::QueuePoisoned`] when the queue lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Returns whether nothing has been kept yet.
    ///
    /// # Errors
    /// Returns [`SearchError::QueuePoisoned`] when the queue lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// Copies the current ranking.
    ///
    /// # Errors
    /// Returns [`SearchError::QueuePoisoned`] when the queue lock is poisoned.
    pub fn snapshot(&self) -> Result<RankedResults<T, Payload<C>>> {
        Ok(self.lock()?.snapshot(Arc::clone(&self.query)))
    }

    /// Consumes the selector into its final ranking.
    ///
    /// # Errors
    /// Returns [`SearchError::QueuePoisoned`] when the queue lock is poisoned.
    pub fn into_results(self) -> Result<RankedResults<T, Payload<C>>> {
        let queue = self
            .queue
            .into_inner()
            .map_err(|_| SearchError::QueuePoisoned)?;
        Ok(queue.into_results(self.query))
    }

    /// Consumes the selector into a ranking of identifiers.
    ///
    /// # Errors
    /// Returns [`SearchError::QueuePoisoned`] when the queue lock is poisoned.
    pub fn into_id_results(self) -> Result<RankedResults<T, C::Id>> {
        Ok(self.into_results()?.map_items(|payload| payload.id()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, RankedQueue<Payload<C>>>> {
        self.queue.lock().map_err(|_| SearchError::QueuePoisoned)
    }
}

impl<T: ?Sized, C: Identified, M> TopKSelector<T, C, M> {
    /// The query every candidate is compared against.
    #[must_use]
    pub fn query(&self) -> &Arc<T> {
        &self.query
    }

    /// Maximum number of kept entries.
    #[must_use]
    pub fn k(&self) -> NonZeroUsize {
        self.k
    }

    /// What is stored for each kept candidate.
    #[must_use]
    pub fn storage(&self) -> StorageMode {
        self.storage
    }

    /// The metric used for scoring.
    #[must_use]
    pub fn metric(&self) -> &M {
        &self.metric
    }

    fn cached_threshold(&self) -> f32 {
        f32::from_bits(self.threshold.load(Ordering::Acquire))
    }
}

/// Selectors are equal when they share the query allocation and hold equal
/// rankings. A selector whose lock is poisoned equals only itself.
impl<T, C, M> PartialEq for TopKSelector<T, C, M>
where
    T: ?Sized + Send + Sync,
    C: Borrow<T> + Identified + Clone + PartialEq + Send + Sync,
    M: Metric<T>,
{
    fn eq(&self, other: &Self) -> bool {
        if core::ptr::eq(self, other) {
            return true;
        }
        if !Arc::ptr_eq(&self.query, &other.query) {
            return false;
        }
        // Snapshot one side before locking the other so two threads comparing
        // the same pair in opposite order cannot deadlock.
        let Ok(mine) = self.snapshot() else {
            return false;
        };
        let Ok(theirs) = other.snapshot() else {
            return false;
        };
        mine == theirs
    }
}

impl<T: ?Sized, C: Identified, M> fmt::Debug for TopKSelector<T, C, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kept = self.queue.lock().map(|queue| queue.len()).ok();
        f.debug_struct("TopKSelector")
            .field("k", &self.k)
            .field("storage", &self.storage)
            .field("threshold", &self.cached_threshold())
            .field("kept", &kept)
            .field("policy", &self.fan_out.policy())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        feature::{FloatsFeature, Item, ItemId},
        metric::L1Metric,
        parallel::{ConcurrencyPolicy, ParallelismBudget},
        test_utils::{CountingMetric, FailingMetric},
    };
    use rstest::rstest;

    type Scalar = Item<FloatsFeature>;

    fn candidates(values: &[f32]) -> Vec<Scalar> {
        values
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                Item::new(ItemId::new(index as u64), FloatsFeature::new(vec![value]))
            })
            .collect()
    }

    fn origin() -> Arc<FloatsFeature> {
        Arc::new(FloatsFeature::new(vec![0.0]))
    }

    fn build<M: Metric<FloatsFeature>>(
        metric: M,
        query: Arc<FloatsFeature>,
        k: usize,
        storage: StorageMode,
        fan_out: FanOut,
    ) -> TopKSelector<FloatsFeature, Scalar, M> {
        TopKSelector::new(
            metric,
            query,
            NonZeroUsize::new(k).expect("k must be non-zero"),
            storage,
            fan_out,
        )
        .expect("query is valid")
    }

    fn selector<M: Metric<FloatsFeature>>(
        metric: M,
        k: usize,
    ) -> TopKSelector<FloatsFeature, Scalar, M> {
        build(metric, origin(), k, StorageMode::Objects, FanOut::sequential())
    }

    #[test]
    fn keeps_the_nearest_k() {
        let selector = selector(L1Metric::new(), 3);
        selector
            .offer_all(&candidates(&[9.0, 1.0, 7.0, 3.0, 5.0]))
            .expect("offers succeed");

        let results = selector.into_results().expect("queue intact");
        assert_eq!(results.distances(), vec![1.0, 3.0, 5.0]);
        assert_eq!(results.ids(), vec![ItemId::new(1), ItemId::new(3), ItemId::new(4)]);
    }

    #[test]
    fn threshold_tightens_as_the_queue_fills() {
        let selector = selector(L1Metric::new(), 2);
        assert_eq!(selector.last_distance(), f32::MAX);
        let pool = candidates(&[4.0, 2.0, 1.0]);
        assert_eq!(selector.offer(&pool[0]), Ok(true));
        assert_eq!(selector.last_distance(), f32::MAX);
        assert_eq!(selector.offer(&pool[1]), Ok(true));
        assert_eq!(selector.last_distance(), 4.0);
        assert_eq!(selector.offer(&pool[2]), Ok(true));
        assert_eq!(selector.last_distance(), 2.0);
        assert_eq!(
            selector.first().expect("queue intact").map(|entry| entry.distance),
            Some(1.0)
        );
        assert_eq!(selector.len(), Ok(2));
    }

    #[test]
    fn rejected_candidates_leave_results_untouched() {
        let selector = selector(L1Metric::new(), 1);
        let pool = candidates(&[1.0, 2.0]);
        selector.offer(&pool[0]).expect("offer succeeds");
        let before = selector.snapshot().expect("queue intact");

        assert_eq!(selector.offer(&pool[1]), Ok(false));
        assert_eq!(selector.snapshot().expect("queue intact"), before);
    }

    #[test]
    fn metric_prunes_against_the_cached_threshold() {
        let metric = CountingMetric::default();
        let selector = selector(metric.clone(), 1);
        for candidate in &candidates(&[1.0, 5.0, 6.0]) {
            selector.offer(candidate).expect("offer succeeds");
        }
        assert_eq!(metric.bounds(), vec![f32::MAX, 1.0, 1.0]);
        assert_eq!(metric.pruned(), 2);
    }

    #[rstest]
    #[case(f32::NAN)]
    #[case(f32::INFINITY)]
    #[case(-1.0)]
    fn invalid_distances_are_errors(#[case] distance: f32) {
        let selector = selector(L1Metric::new(), 2);
        let pool = candidates(&[0.0]);
        let err = selector
            .offer_with_distance(&pool[0], distance)
            .expect_err("distance is invalid");
        assert_eq!(err.code().as_str(), "SEARCH_NON_FINITE_DISTANCE");
        assert_eq!(selector.is_empty(), Ok(true));
    }

    #[test]
    fn metric_failures_surface_from_offer_all() {
        let selector = selector(FailingMetric, 2);
        let err = selector
            .offer_all(&candidates(&[1.0, 2.0]))
            .expect_err("metric always fails");
        assert!(matches!(err, SearchError::Metric { .. }));
    }

    #[test]
    fn identifier_storage_keeps_only_ids() {
        let selector = build(
            L1Metric::new(),
            origin(),
            2,
            StorageMode::Identifiers,
            FanOut::sequential(),
        );
        selector
            .offer_all(&candidates(&[3.0, 1.0]))
            .expect("offers succeed");

        let results = selector.into_results().expect("queue intact");
        assert!(results.iter().all(|entry| entry.item.object().is_none()));
        assert_eq!(results.ids(), vec![ItemId::new(1), ItemId::new(0)]);
    }

    #[test]
    fn equality_follows_query_identity_and_rankings() {
        let query = origin();
        let make = |query: Arc<FloatsFeature>| {
            build(L1Metric::new(), query, 2, StorageMode::Objects, FanOut::sequential())
        };
        let left = make(Arc::clone(&query));
        let right = make(Arc::clone(&query));
        let stranger = make(origin());
        let pool = candidates(&[1.0, 2.0]);
        left.offer_all(&pool).expect("offers succeed");
        right.offer_all(&pool).expect("offers succeed");
        stranger.offer_all(&pool).expect("offers succeed");

        assert_eq!(left, right);
        assert_ne!(left, stranger);
        right
            .offer_with_distance(&pool[0], 0.5)
            .expect("valid distance");
        assert_ne!(left, right);
    }

    #[test]
    fn parallel_fan_out_matches_sequential() {
        let values: Vec<f32> = (0..200).map(|value| ((value * 37) % 101) as f32).collect();
        let pool = candidates(&values);
        let run = |fan_out: FanOut| {
            let selector = build(L1Metric::new(), origin(), 10, StorageMode::Identifiers, fan_out);
            selector.offer_all(&pool).expect("offers succeed");
            selector.into_id_results().expect("queue intact").into_entries()
        };

        let parallel = FanOut::new(
            ConcurrencyPolicy::Parallel,
            Arc::new(ParallelismBudget::new(7)),
        );
        assert_eq!(run(FanOut::sequential()), run(parallel));
    }
}
