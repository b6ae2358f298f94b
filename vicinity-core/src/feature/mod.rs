//! Feature model consumed by metrics and the top-K selector.
//!
//! Features are typed values tagged with a [`FeatureKind`]. A
//! [`FeatureCollector`] bundles the features extracted from one item under a
//! single [`ItemId`], and descriptor groups carry the local descriptors of one
//! image together with their lazily derived keypoint statistics.

mod collector;
mod descriptor;
mod group;
mod id;
mod keypoint;

use core::fmt;
use std::any::Any;

pub use self::{
    collector::FeatureCollector,
    descriptor::{
        AsBits, AsFloats, BinaryDescriptor, FloatDescriptor, FloatsFeature, LocalDescriptor,
    },
    group::{DescriptorGroup, GroupStats},
    id::{Identified, Item, ItemId},
    keypoint::KeyPoint,
};

/// Families of features a metric may request from a [`FeatureCollector`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[non_exhaustive]
pub enum FeatureKind {
    /// A global dense float vector.
    Floats,
    /// A group of float local descriptors (SIFT-like).
    FloatDescriptors,
    /// A group of binary local descriptors (ORB/BRISK-like).
    BinaryDescriptors,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Floats => f.write_str("floats"),
            Self::FloatDescriptors => f.write_str("float descriptors"),
            Self::BinaryDescriptors => f.write_str("binary descriptors"),
        }
    }
}

/// A typed feature that can be stored in a [`FeatureCollector`].
///
/// # Examples
/// ```
/// use vicinity_core::{Feature, FeatureKind, FloatsFeature};
///
/// assert_eq!(FloatsFeature::KIND, FeatureKind::Floats);
/// ```
pub trait Feature: Any + Send + Sync {
    /// Family this feature belongs to. At most one feature per kind is stored
    /// in a collector.
    const KIND: FeatureKind;
}

impl Feature for FloatsFeature {
    const KIND: FeatureKind = FeatureKind::Floats;
}

impl Feature for DescriptorGroup<FloatDescriptor> {
    const KIND: FeatureKind = FeatureKind::FloatDescriptors;
}

impl Feature for DescriptorGroup<BinaryDescriptor> {
    const KIND: FeatureKind = FeatureKind::BinaryDescriptors;
}
