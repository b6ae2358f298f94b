//! Vicinity core library.
//!
//! Bounded top-K similarity search with early-exit metrics, descriptor
//! correspondence matching, and a budgeted parallel fan-out.

mod builder;
mod error;
mod feature;
mod matching;
mod metric;
mod parallel;
mod queue;
mod result;
mod search;
mod selector;

#[cfg(test)]
mod test_utils;

pub use crate::{
    builder::KnnSearchBuilder,
    error::{
        MatchError, MatchErrorCode, MetricError, MetricErrorCode, Result, SearchError,
        SearchErrorCode,
    },
    feature::{
        AsBits, AsFloats, BinaryDescriptor, DescriptorGroup, Feature, FeatureCollector,
        FeatureKind, FloatDescriptor, FloatsFeature, GroupStats, Identified, Item, ItemId,
        KeyPoint, LocalDescriptor,
    },
    matching::{Correspondence, RadiusTest, RatioTest},
    metric::{
        CollectorMetric, CosineMetric, GroupMatch, GroupMatchMetric, HammingMetric, L1Metric,
        L2Metric, MeanEvaluator, Metric,
    },
    parallel::{
        ConcurrencyPolicy, FanOut, PARALLEL_ENV_KEY, ParallelismBudget, Reservation, partition,
        split_sizes,
    },
    queue::RankedQueue,
    result::{Payload, RankedEntry, RankedResults, StorageMode},
    search::KnnSearch,
    selector::TopKSelector,
};
