//! Error types for the vicinity core library.
//!
//! Every public error enum carries a stable machine-readable code so callers
//! can branch on failures without matching display strings.

use std::fmt;

use thiserror::Error;

use crate::feature::FeatureKind;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced while evaluating a [`crate::Metric`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MetricError {
    /// A feature collector did not carry a feature the metric requires.
    #[error("feature collector {collector} has no {kind} feature")]
    MissingFeature {
        /// Identifier of the collector that lacked the feature.
        collector: crate::ItemId,
        /// Feature family the metric asked for.
        kind: FeatureKind,
    },
    /// Compared vectors had different dimensions.
    #[error("dimension mismatch: left={left}, right={right}")]
    DimensionMismatch {
        /// Dimensionality of the left-hand value.
        left: usize,
        /// Dimensionality of the right-hand value.
        right: usize,
    },
    /// A mean was requested over an empty collection.
    #[error("cannot compute the mean of an empty collection")]
    EmptyMean,
    /// A per-dimension weight was negative or not finite.
    #[error("weight {index} must be finite and non-negative (got {value})")]
    InvalidWeight {
        /// Dimension of the rejected weight.
        index: usize,
        /// The rejected weight.
        value: f32,
    },
}

define_error_codes! {
    /// Stable codes describing [`MetricError`] variants.
    enum MetricErrorCode for MetricError {
        /// A feature collector did not carry a required feature.
        MissingFeature => MissingFeature { .. } => "METRIC_MISSING_FEATURE",
        /// Compared vectors had different dimensions.
        DimensionMismatch => DimensionMismatch { .. } => "METRIC_DIMENSION_MISMATCH",
        /// A mean was requested over an empty collection.
        EmptyMean => EmptyMean => "METRIC_EMPTY_MEAN",
        /// A per-dimension weight was negative or not finite.
        InvalidWeight => InvalidWeight { .. } => "METRIC_INVALID_WEIGHT",
    }
}

/// An error produced while configuring or running descriptor matching.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MatchError {
    /// Ratio-test confidence must be finite and lie in `(0, 1]`.
    #[error("ratio-test confidence must be in (0, 1] (got {got})")]
    InvalidConfidence {
        /// The rejected confidence value.
        got: f32,
    },
    /// The optional distance cap must be finite and non-negative.
    #[error("ratio-test distance cap must be finite and non-negative (got {got})")]
    InvalidDistanceCap {
        /// The rejected cap.
        got: f32,
    },
    /// The radius must be finite and non-negative.
    #[error("match radius must be finite and non-negative (got {got})")]
    InvalidRadius {
        /// The rejected radius.
        got: f32,
    },
}

define_error_codes! {
    /// Stable codes describing [`MatchError`] variants.
    enum MatchErrorCode for MatchError {
        /// Ratio-test confidence outside `(0, 1]`.
        InvalidConfidence => InvalidConfidence { .. } => "MATCH_INVALID_CONFIDENCE",
        /// Distance cap was negative or non-finite.
        InvalidDistanceCap => InvalidDistanceCap { .. } => "MATCH_INVALID_DISTANCE_CAP",
        /// Radius was negative or non-finite.
        InvalidRadius => InvalidRadius { .. } => "MATCH_INVALID_RADIUS",
    }
}

/// Error type produced when configuring or running a top-K search.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SearchError {
    /// The number of neighbours to keep must be at least one.
    #[error("k must be at least 1 (got {got})")]
    InvalidK {
        /// The rejected neighbour count.
        got: usize,
    },
    /// The concurrency override read from the environment was not understood.
    #[error("unsupported value `{provided}` for `{variable}`; expected on/off")]
    InvalidConcurrencyOverride {
        /// Environment variable that carried the value.
        variable: &'static str,
        /// Raw value supplied by the user.
        provided: String,
    },
    /// A metric produced a NaN, infinite, or negative distance.
    #[error("metric returned an invalid distance {value}")]
    NonFiniteDistance {
        /// The offending distance.
        value: f32,
    },
    /// A worker panicked while holding the ranked queue lock.
    #[error("ranked queue lock poisoned by a failed worker")]
    QueuePoisoned,
    /// The metric failed while scoring a candidate.
    #[error("metric failure: {source}")]
    Metric {
        /// Error reported by the metric.
        #[from]
        source: MetricError,
    },
}

define_error_codes! {
    /// Stable codes describing [`SearchError`] variants.
    enum SearchErrorCode for SearchError {
        /// The number of neighbours to keep must be at least one.
        InvalidK => InvalidK { .. } => "SEARCH_INVALID_K",
        /// The concurrency override could not be parsed.
        InvalidConcurrencyOverride => InvalidConcurrencyOverride { .. } =>
            "SEARCH_INVALID_CONCURRENCY_OVERRIDE",
        /// A metric produced an invalid distance.
        NonFiniteDistance => NonFiniteDistance { .. } => "SEARCH_NON_FINITE_DISTANCE",
        /// The ranked queue lock was poisoned.
        QueuePoisoned => QueuePoisoned => "SEARCH_QUEUE_POISONED",
        /// The metric failed while scoring a candidate.
        MetricFailure => Metric { .. } => "SEARCH_METRIC_FAILURE",
    }
}

impl SearchError {
    /// Retrieve the inner [`MetricErrorCode`] when the error originated in a metric.
    pub const fn metric_code(&self) -> Option<MetricErrorCode> {
        match self {
            Self::Metric { source } => Some(source.code()),
            _ => None,
        }
    }
}

/// Convenient alias for results returned by the search API.
pub type Result<T> = core::result::Result<T, SearchError>;
