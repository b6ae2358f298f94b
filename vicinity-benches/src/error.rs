//! Benchmark setup error type.

use crate::source::SyntheticError;
use vicinity_core::{MatchError, SearchError};

/// Errors that may occur while preparing a benchmark.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Synthetic data generation failed.
    #[error("synthetic data generation failed: {0}")]
    Synthetic(#[from] SyntheticError),
    /// Search configuration or execution failed.
    #[error("search failed: {0}")]
    Search(#[from] SearchError),
    /// Matcher configuration was rejected.
    #[error("matcher configuration failed: {0}")]
    Match(#[from] MatchError),
}
