//! Benchmark parameter types.

use std::fmt;

/// Parameters for one top-K search benchmark.
#[derive(Clone, Debug)]
pub struct SearchBenchParams {
    /// Number of candidates scored per search.
    pub point_count: usize,
    /// Neighbours kept.
    pub k: usize,
    /// Worker slots in the search's private budget.
    pub slots: usize,
}

impl fmt::Display for SearchBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},k={},slots={}", self.point_count, self.k, self.slots)
    }
}

/// Parameters for one group-matching benchmark.
#[derive(Clone, Debug)]
pub struct MatchBenchParams {
    /// Descriptors per group.
    pub group_size: usize,
}

impl fmt::Display for MatchBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "descriptors={}", self.group_size)
    }
}
