//! Identified bundles of typed features.

use std::{any::Any, collections::BTreeMap, sync::Arc};

use super::{Feature, FeatureKind, id::Identified, id::ItemId};

/// The features extracted from one item, keyed by [`FeatureKind`].
///
/// Cloning is cheap: features are shared behind reference counts.
///
/// # Examples
/// ```
/// use vicinity_core::{FeatureCollector, FeatureKind, FloatsFeature, ItemId};
///
/// let collector = FeatureCollector::new(ItemId::new(1))
///     .with_feature(FloatsFeature::new(vec![0.0, 1.0]));
/// assert!(collector.has(FeatureKind::Floats));
/// assert_eq!(collector.feature::<FloatsFeature>().map(FloatsFeature::len), Some(2));
/// ```
#[derive(Clone, Debug)]
pub struct FeatureCollector {
    id: ItemId,
    features: BTreeMap<FeatureKind, Arc<dyn Any + Send + Sync>>,
}

impl FeatureCollector {
    /// Creates an empty collector for item `id`.
    #[must_use]
    pub const fn new(id: ItemId) -> Self {
        Self {
            id,
            features: BTreeMap::new(),
        }
    }

    /// Adds `feature`, replacing any feature of the same kind.
    #[must_use]
    pub fn with_feature<F: Feature>(mut self, feature: F) -> Self {
        self.insert(feature);
        self
    }

    /// Stores `feature`, replacing any feature of the same kind.
    pub fn insert<F: Feature>(&mut self, feature: F) {
        self.features.insert(F::KIND, Arc::new(feature));
    }

    /// Returns the feature of type `F`, or `None` when it was never computed.
    #[must_use]
    pub fn feature<F: Feature>(&self) -> Option<&F> {
        self.features
            .get(&F::KIND)
            .and_then(|feature| feature.downcast_ref::<F>())
    }

    /// Returns whether a feature of `kind` is present.
    #[must_use]
    pub fn has(&self, kind: FeatureKind) -> bool {
        self.features.contains_key(&kind)
    }

    /// Iterates over the kinds present, in kind order.
    pub fn kinds(&self) -> impl Iterator<Item = FeatureKind> + '_ {
        self.features.keys().copied()
    }

    /// Returns a collector holding only the requested kinds.
    ///
    /// Used to keep just what a metric declares through
    /// [`crate::Metric::required_features`].
    #[must_use]
    pub fn project(&self, kinds: &[FeatureKind]) -> Self {
        let features = self
            .features
            .iter()
            .filter(|(kind, _)| kinds.contains(*kind))
            .map(|(kind, feature)| (*kind, Arc::clone(feature)))
            .collect();
        Self {
            id: self.id,
            features,
        }
    }

    /// Identifier of the item the features belong to.
    #[must_use]
    pub const fn item_id(&self) -> ItemId {
        self.id
    }
}

impl Identified for FeatureCollector {
    type Id = ItemId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
