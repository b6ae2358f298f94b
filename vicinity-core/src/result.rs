//! Ranked search output.
//!
//! A [`RankedResults`] is an immutable snapshot of a bounded queue, tagged
//! with the query it was computed for. Entries are sorted ascending by
//! distance; equal distances are ordered by identifier.

use std::sync::Arc;

use crate::feature::Identified;

/// One kept candidate and its distance from the query.
///
/// # Examples
/// ```
/// use vicinity_core::{ItemId, RankedEntry};
///
/// let entry = RankedEntry { item: ItemId::new(3), distance: 0.42 };
/// assert_eq!(entry.item, ItemId::new(3));
/// assert!(entry.distance < 1.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RankedEntry<P> {
    /// The stored payload: the candidate itself or its identifier.
    pub item: P,
    /// Distance between the query and [`RankedEntry::item`].
    pub distance: f32,
}

/// What a top-K selector keeps for each accepted candidate.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum StorageMode {
    /// Keep a clone of the candidate.
    #[default]
    Objects,
    /// Keep only the candidate's identifier.
    Identifiers,
}

/// A kept candidate in either storage mode.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload<C: Identified> {
    /// The candidate itself.
    Object(C),
    /// The candidate's identifier.
    Id(C::Id),
}

impl<C: Identified> Payload<C> {
    /// Stores `candidate` according to `mode`.
    pub(crate) fn store(candidate: &C, mode: StorageMode) -> Self
    where
        C: Clone,
    {
        match mode {
            StorageMode::Objects => Self::Object(candidate.clone()),
            StorageMode::Identifiers => Self::Id(candidate.id()),
        }
    }

    /// Borrows the candidate when it was stored by value.
    #[must_use]
    pub fn object(&self) -> Option<&C> {
        match self {
            Self::Object(candidate) => Some(candidate),
            Self::Id(_) => None,
        }
    }

    /// Unwraps the candidate when it was stored by value.
    pub fn into_object(self) -> Option<C> {
        match self {
            Self::Object(candidate) => Some(candidate),
            Self::Id(_) => None,
        }
    }
}

impl<C: Identified> Identified for Payload<C> {
    type Id = C::Id;

    fn id(&self) -> C::Id {
        match self {
            Self::Object(candidate) => candidate.id(),
            Self::Id(id) => id.clone(),
        }
    }
}

/// The ranked outcome of one top-K search.
///
/// Equality requires both results to refer to the same query allocation
/// ([`Arc::ptr_eq`]) and to hold equal entries; results for equal but
/// distinct queries are never equal. Use [`RankedResults::same_entries`] to
/// compare rankings alone.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use vicinity_core::{ItemId, RankedEntry, RankedResults};
///
/// let query = Arc::new([0.0_f32]);
/// let results = RankedResults::new(
///     Arc::clone(&query),
///     vec![RankedEntry { item: ItemId::new(1), distance: 0.5 }],
/// );
/// assert_eq!(results.len(), 1);
/// assert_eq!(results.ids(), vec![ItemId::new(1)]);
/// ```
#[derive(Clone, Debug)]
pub struct RankedResults<Q: ?Sized, P> {
    query: Arc<Q>,
    entries: Vec<RankedEntry<P>>,
}

impl<Q: ?Sized, P> RankedResults<Q, P> {
    /// Wraps entries that are already sorted.
    #[must_use]
    pub fn new(query: Arc<Q>, entries: Vec<RankedEntry<P>>) -> Self {
        Self { query, entries }
    }

    /// The query these results belong to.
    #[must_use]
    pub fn query(&self) -> &Arc<Q> {
        &self.query
    }

    /// Entries in ascending distance order.
    #[must_use]
    pub fn entries(&self) -> &[RankedEntry<P>] {
        &self.entries
    }

    /// Nearest entry, if any candidate was kept.
    #[must_use]
    pub fn first(&self) -> Option<&RankedEntry<P>> {
        self.entries.first()
    }

    /// Number of kept entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no candidate was kept.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distances in ranked order.
    #[must_use]
    pub fn distances(&self) -> Vec<f32> {
        self.entries.iter().map(|entry| entry.distance).collect()
    }

    /// Iterates over the entries in ranked order.
    pub fn iter(&self) -> std::slice::Iter<'_, RankedEntry<P>> {
        self.entries.iter()
    }

    /// Consumes the results, returning the entries.
    pub fn into_entries(self) -> Vec<RankedEntry<P>> {
        self.entries
    }

    /// Transforms every payload, keeping order, distances, and the query.
    pub fn map_items<R>(self, mut f: impl FnMut(P) -> R) -> RankedResults<Q, R> {
        RankedResults {
            query: self.query,
            entries: self
                .entries
                .into_iter()
                .map(|entry| RankedEntry {
                    item: f(entry.item),
                    distance: entry.distance,
                })
                .collect(),
        }
    }

    /// Compares rankings while ignoring which query produced them.
    #[must_use]
    pub fn same_entries(&self, other: &Self) -> bool
    where
        P: PartialEq,
    {
        self.entries == other.entries
    }
}

impl<Q: ?Sized, P: Identified> RankedResults<Q, P> {
    /// Identifiers in ranked order.
    #[must_use]
    pub fn ids(&self) -> Vec<P::Id> {
        self.entries.iter().map(|entry| entry.item.id()).collect()
    }
}

impl<Q: ?Sized, P: PartialEq> PartialEq for RankedResults<Q, P> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.query, &other.query) && self.entries == other.entries
    }
}

impl<'a, Q: ?Sized, P> IntoIterator for &'a RankedResults<Q, P> {
    type Item = &'a RankedEntry<P>;
    type IntoIter = std::slice::Iter<'a, RankedEntry<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
