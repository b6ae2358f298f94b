//! Bounded queue of the best candidates seen so far.

use std::{cmp::Ordering, num::NonZeroUsize, sync::Arc};

use crate::{
    feature::Identified,
    result::{RankedEntry, RankedResults},
};

/// Upper bound on the slots reserved up front, so very large `k` values do
/// not allocate eagerly.
const PREALLOCATED_SLOTS: usize = 1024;

/// Sorted, bounded list of the nearest payloads offered so far.
///
/// Entries are ordered by `(distance, identifier)`. Once the queue is full,
/// the distance of its last entry is the admission threshold; before that
/// the threshold is [`f32::MAX`]. A candidate at exactly the threshold
/// replaces the last entry only when its identifier is smaller, which makes
/// the kept set independent of the order in which candidates arrive.
///
/// The queue itself is not synchronised; the top-K selector guards it with a
/// mutex.
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
/// use vicinity_core::{ItemId, RankedQueue};
///
/// let mut queue = RankedQueue::new(NonZeroUsize::new(2).expect("non-zero"));
/// assert!(queue.offer(ItemId::new(1), 3.0));
/// assert!(queue.offer(ItemId::new(2), 1.0));
/// assert_eq!(queue.last_distance(), 3.0);
/// assert!(!queue.offer(ItemId::new(3), 4.0));
/// assert!(queue.offer(ItemId::new(4), 2.0));
/// assert_eq!(queue.last_distance(), 2.0);
/// ```
#[derive(Clone, Debug)]
pub struct RankedQueue<P> {
    capacity: NonZeroUsize,
    entries: Vec<RankedEntry<P>>,
}

impl<P: Identified> RankedQueue<P> {
    /// Creates an empty queue keeping at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity.get().min(PREALLOCATED_SLOTS)),
        }
    }

    /// Inserts `item` when it ranks inside the bound.
    ///
    /// Returns whether the item was kept. Inserting into a full queue evicts
    /// the last entry.
    pub fn offer(&mut self, item: P, distance: f32) -> bool {
        if self.is_full() && distance > self.last_distance() {
            return false;
        }
        let id = item.id();
        let position = self
            .entries
            .partition_point(|entry| rank(entry, distance, &id) != Ordering::Greater);
        if position >= self.capacity.get() {
            return false;
        }
        self.entries.insert(position, RankedEntry { item, distance });
        self.entries.truncate(self.capacity.get());
        true
    }

    /// Current admission threshold: the distance of the last entry once the
    /// queue is full, [`f32::MAX`] until then.
    #[must_use]
    pub fn last_distance(&self) -> f32 {
        if self.is_full() {
            self.entries.last().map_or(f32::MAX, |entry| entry.distance)
        } else {
            f32::MAX
        }
    }

    /// Nearest entry.
    #[must_use]
    pub fn first(&self) -> Option<&RankedEntry<P>> {
        self.entries.first()
    }

    /// Number of kept entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether nothing has been kept.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of kept entries.
    #[must_use]
    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Returns whether the queue holds `capacity` entries.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity.get()
    }

    /// Entries in ranked order.
    #[must_use]
    pub fn entries(&self) -> &[RankedEntry<P>] {
        &self.entries
    }

    /// Copies the current ranking into results tagged with `query`.
    #[must_use]
    pub fn snapshot<Q: ?Sized>(&self, query: Arc<Q>) -> RankedResults<Q, P>
    where
        P: Clone,
    {
        RankedResults::new(query, self.entries.clone())
    }

    /// Consumes the queue into results tagged with `query`.
    #[must_use]
    pub fn into_results<Q: ?Sized>(self, query: Arc<Q>) -> RankedResults<Q, P> {
        RankedResults::new(query, self.entries)
    }
}

fn rank<P: Identified>(entry: &RankedEntry<P>, distance: f32, id: &P::Id) -> Ordering {
    entry
        .distance
        .total_cmp(&distance)
        .then_with(|| entry.item.id().cmp(id))
}
