//! Fan-out of candidate batches across the Rayon pool.
//!
//! A batch is cut into `granted + 1` contiguous ranges, where `granted` is
//! the number of worker slots a [`ParallelismBudget`] hands out for this call.
//! Every range runs to completion before [`FanOut::drive`] returns, and the
//! slots go back to the budget on every exit path.

mod budget;
mod partition;

use std::{env, sync::Arc};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{Result, SearchError};

pub use self::{
    budget::{ParallelismBudget, Reservation},
    partition::{partition, split_sizes},
};

/// Environment variable that switches parallel fan-out on or off.
pub const PARALLEL_ENV_KEY: &str = "VICINITY_PARALLEL";

/// Whether batches may be spread over worker threads.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ConcurrencyPolicy {
    /// Score every candidate on the calling thread.
    Sequential,
    /// Use as many workers as the budget allows.
    #[default]
    Parallel,
}

impl ConcurrencyPolicy {
    /// Reads the policy from `VICINITY_PARALLEL`, defaulting to
    /// [`ConcurrencyPolicy::Parallel`] when it is unset.
    ///
    /// # Errors
    /// Returns [`SearchError::InvalidConcurrencyOverride`] when the variable
    /// holds anything other than `1/true/yes/on` or `0/false/no/off`.
    pub fn from_env() -> Result<Self> {
        match env::var(PARALLEL_ENV_KEY) {
            Ok(raw) => Self::parse(&raw),
            Err(env::VarError::NotPresent) => Ok(Self::default()),
            Err(env::VarError::NotUnicode(raw)) => {
                Self::parse(&raw.to_string_lossy())
            }
        }
    }

    /// Parses an on/off switch value.
    ///
    /// # Errors
    /// Returns [`SearchError::InvalidConcurrencyOverride`] for unknown values.
    ///
    /// # Examples
    /// ```
    /// use vicinity_core::ConcurrencyPolicy;
    ///
    /// assert_eq!(ConcurrencyPolicy::parse(" Off ")?, ConcurrencyPolicy::Sequential);
    /// assert_eq!(ConcurrencyPolicy::parse("1")?, ConcurrencyPolicy::Parallel);
    /// assert!(ConcurrencyPolicy::parse("sometimes").is_err());
    /// # Ok::<(), vicinity_core::SearchError>(())
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Self::Parallel),
            "0" | "false" | "no" | "off" => Ok(Self::Sequential),
            _ => {
                warn!(
                    env = PARALLEL_ENV_KEY,
                    raw = %raw,
                    "rejected concurrency override",
                );
                Err(SearchError::InvalidConcurrencyOverride {
                    variable: PARALLEL_ENV_KEY,
                    provided: raw.to_owned(),
                })
            }
        }
    }
}

/// Runs a per-item callback over a slice, sequentially or split across the
/// Rayon pool.
#[derive(Clone, Debug)]
pub struct FanOut {
    policy: ConcurrencyPolicy,
    budget: Arc<ParallelismBudget>,
}

impl FanOut {
    /// Creates a fan-out drawing worker slots from `budget`.
    #[must_use]
    pub fn new(policy: ConcurrencyPolicy, budget: Arc<ParallelismBudget>) -> Self {
        Self { policy, budget }
    }

    /// A fan-out that never leaves the calling thread.
    #[must_use]
    pub fn sequential() -> Self {
        Self::new(ConcurrencyPolicy::Sequential, Arc::new(ParallelismBudget::new(0)))
    }

    /// The configured policy.
    #[must_use]
    pub fn policy(&self) -> ConcurrencyPolicy {
        self.policy
    }

    /// The budget worker slots are drawn from.
    #[must_use]
    pub fn budget(&self) -> &Arc<ParallelismBudget> {
        &self.budget
    }

    /// Applies `visit` to every item and returns how many ranges ran.
    ///
    /// All ranges finish before this returns. When several fail, one of the
    /// errors is returned; a panic in any range resumes on the caller after
    /// the others have finished.
    ///
    /// # Errors
    /// Propagates the first error reported by `visit`.
    pub fn drive<T, F, E>(&self, items: &[T], visit: F) -> core::result::Result<usize, E>
    where
        T: Sync,
        F: Fn(&T) -> core::result::Result<(), E> + Send + Sync,
        E: Send,
    {
        if items.is_empty() {
            return Ok(0);
        }
        if self.policy == ConcurrencyPolicy::Sequential || items.len() == 1 {
            items.iter().try_for_each(&visit)?;
            return Ok(1);
        }

        let reservation = self.budget.reserve(items.len() - 1);
        let ranges = partition(items.len(), reservation.granted() + 1);
        let workers = ranges.len();
        if workers == 1 {
            items.iter().try_for_each(&visit)?;
            return Ok(1);
        }

        ranges.into_par_iter().try_for_each(|range| {
            debug!(start = range.start, end = range.end, "scoring candidate range");
            items[range].iter().try_for_each(&visit)
        })?;
        drop(reservation);
        Ok(workers)
    }
}

impl Default for FanOut {
    fn default() -> Self {
        Self::new(ConcurrencyPolicy::default(), ParallelismBudget::global())
    }
}
