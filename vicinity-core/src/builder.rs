//! Builder utilities for configuring top-K searches.
//!
//! Validates the neighbour count and wires the concurrency policy and
//! parallelism budget into [`KnnSearch`] instances.

use std::{num::NonZeroUsize, sync::Arc};

use crate::{
    error::{Result, SearchError},
    parallel::{ConcurrencyPolicy, FanOut, ParallelismBudget},
    result::StorageMode,
    search::KnnSearch,
};

/// Configures and constructs [`KnnSearch`] instances.
///
/// # Examples
/// ```
/// use vicinity_core::{ConcurrencyPolicy, KnnSearchBuilder, StorageMode};
///
/// let search = KnnSearchBuilder::new()
///     .with_k(5)
///     .with_storage(StorageMode::Identifiers)
///     .with_concurrency(ConcurrencyPolicy::Sequential)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(search.k().get(), 5);
/// assert_eq!(search.storage(), StorageMode::Identifiers);
/// ```
#[derive(Debug, Clone)]
pub struct KnnSearchBuilder {
    k: usize,
    storage: StorageMode,
    concurrency: ConcurrencyPolicy,
    budget: Option<Arc<ParallelismBudget>>,
}

impl Default for KnnSearchBuilder {
    fn default() -> Self {
        Self {
            k: 10,
            storage: StorageMode::default(),
            concurrency: ConcurrencyPolicy::default(),
            budget: None,
        }
    }
}

impl KnnSearchBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use vicinity_core::{ConcurrencyPolicy, KnnSearchBuilder, StorageMode};
    ///
    /// let builder = KnnSearchBuilder::new();
    /// assert_eq!(builder.k(), 10);
    /// assert_eq!(builder.storage(), StorageMode::Objects);
    /// assert_eq!(builder.concurrency(), ConcurrencyPolicy::Parallel);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides how many neighbours each search keeps.
    #[must_use]
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Returns the configured neighbour count.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Chooses whether candidates or only their identifiers are kept.
    #[must_use]
    pub fn with_storage(mut self, storage: StorageMode) -> Self {
        self.storage = storage;
        self
    }

    /// Returns the configured storage mode.
    #[must_use]
    pub fn storage(&self) -> StorageMode {
        self.storage
    }

    /// Sets whether batches may be spread over worker threads.
    ///
    /// # Examples
    /// ```
    /// use vicinity_core::{ConcurrencyPolicy, KnnSearchBuilder};
    ///
    /// let builder = KnnSearchBuilder::new().with_concurrency(ConcurrencyPolicy::Sequential);
    /// assert_eq!(builder.concurrency(), ConcurrencyPolicy::Sequential);
    /// ```
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: ConcurrencyPolicy) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Returns the configured concurrency policy.
    #[must_use]
    pub fn concurrency(&self) -> ConcurrencyPolicy {
        self.concurrency
    }

    /// Draws worker slots from `budget` instead of the process-wide one.
    #[must_use]
    pub fn with_budget(mut self, budget: Arc<ParallelismBudget>) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Validates the configuration and constructs a [`KnnSearch`].
    ///
    /// # Errors
    /// Returns [`SearchError::InvalidK`] when `k` is zero.
    ///
    /// # Examples
    /// ```
    /// use vicinity_core::{KnnSearchBuilder, SearchError};
    ///
    /// let err = KnnSearchBuilder::new().with_k(0).build().expect_err("k must be positive");
    /// assert_eq!(err, SearchError::InvalidK { got: 0 });
    /// ```
    pub fn build(self) -> Result<KnnSearch> {
        let k = NonZeroUsize::new(self.k).ok_or(SearchError::InvalidK { got: self.k })?;
        let budget = self.budget.unwrap_or_else(ParallelismBudget::global);
        Ok(KnnSearch::new(
            k,
            self.storage,
            FanOut::new(self.concurrency, budget),
        ))
    }
}
