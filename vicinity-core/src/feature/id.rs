//! Identifiers used to tag candidates and to break distance ties.

use core::{borrow::Borrow, fmt};

/// Integer identifier of an indexed item.
///
/// # Examples
/// ```
/// use vicinity_core::ItemId;
///
/// let id = ItemId::new(42);
/// assert_eq!(id.get(), 42);
/// assert_eq!(id.to_string(), "#42");
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ItemId(u64);

impl ItemId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ItemId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Candidates that expose a totally ordered identifier.
///
/// The identifier is stored instead of the candidate in identifier-storage
/// mode, and it orders entries that sit at the same distance.
pub trait Identified {
    /// Identifier type.
    type Id: Ord + Clone + fmt::Debug + Send + Sync;

    /// Returns the candidate's identifier.
    fn id(&self) -> Self::Id;
}

impl Identified for ItemId {
    type Id = Self;

    fn id(&self) -> Self::Id {
        *self
    }
}

/// A raw value paired with an identifier so it can be offered as a candidate.
///
/// `Item<T>` borrows as `T`, which lets a metric written for `T` score it
/// directly.
///
/// # Examples
/// ```
/// use std::borrow::Borrow;
/// use vicinity_core::{FloatsFeature, Identified, Item, ItemId};
///
/// let item = Item::new(ItemId::new(3), FloatsFeature::new(vec![1.0, 2.0]));
/// assert_eq!(item.id(), ItemId::new(3));
/// let feature: &FloatsFeature = item.borrow();
/// assert_eq!(feature.len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Item<T> {
    id: ItemId,
    value: T,
}

impl<T> Item<T> {
    /// Pairs `value` with `id`.
    pub const fn new(id: ItemId, value: T) -> Self {
        Self { id, value }
    }

    /// Returns the wrapped value.
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Unwraps the value.
    pub fn into_value(self) -> T {
        self.value
    }
}

impl<T> Identified for Item<T> {
    type Id = ItemId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl<T> Borrow<T> for Item<T> {
    fn borrow(&self) -> &T {
        &self.value
    }
}
