//! Process-wide cap on extra worker threads.

use std::{
    num::NonZeroUsize,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use tracing::trace;

/// Counts the worker slots that overlapping searches may reserve.
///
/// The calling thread always works on its own share, so a search that is
/// granted `n` slots runs `n + 1` ranges. Reservations never block: when no
/// slot is free a search simply runs on the calling thread.
///
/// # Examples
/// ```
/// use vicinity_core::ParallelismBudget;
///
/// let budget = ParallelismBudget::new(3);
/// let first = budget.reserve(2);
/// let second = budget.reserve(2);
/// assert_eq!((first.granted(), second.granted()), (2, 1));
/// drop(first);
/// assert_eq!(budget.free(), 2);
/// ```
#[derive(Debug)]
pub struct ParallelismBudget {
    capacity: usize,
    free: AtomicUsize,
}

impl ParallelismBudget {
    /// Creates a budget with `slots` reservable worker slots.
    #[must_use]
    pub const fn new(slots: usize) -> Self {
        Self {
            capacity: slots,
            free: AtomicUsize::new(slots),
        }
    }

    /// Sizes the budget from the host, keeping one processor for the caller.
    #[must_use]
    pub fn from_available_parallelism() -> Self {
        let processors = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Self::new(processors.saturating_sub(1))
    }

    /// Shared budget used by searches that were not given one explicitly.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<ParallelismBudget>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::from_available_parallelism())))
    }

    /// Total number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots not currently reserved.
    #[must_use]
    pub fn free(&self) -> usize {
        self.free.load(Ordering::Acquire)
    }

    /// Takes up to `wanted` free slots and returns how many were granted.
    ///
    /// Callers own the granted slots and must hand them back with
    /// [`Self::release`]; prefer [`Self::reserve`], which does so on drop.
    pub fn reserve_raw(&self, wanted: usize) -> usize {
        if wanted == 0 {
            return 0;
        }
        let granted = match self
            .free
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |free| {
                (free > 0).then(|| free - wanted.min(free))
            }) {
            Ok(previous) => previous.min(wanted),
            Err(_) => 0,
        };
        trace!(wanted, granted, "parallelism budget reservation");
        granted
    }

    /// Returns `slots` to the budget. The free count never exceeds the
    /// capacity.
    pub fn release(&self, slots: usize) {
        if slots == 0 {
            return;
        }
        let _ = self
            .free
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |free| {
                Some(free.saturating_add(slots).min(self.capacity))
            });
        trace!(slots, "parallelism budget release");
    }

    /// Takes up to `wanted` free slots for the lifetime of the returned guard.
    pub fn reserve(&self, wanted: usize) -> Reservation<'_> {
        Reservation {
            budget: self,
            granted: self.reserve_raw(wanted),
        }
    }
}

impl Default for ParallelismBudget {
    fn default() -> Self {
        Self::from_available_parallelism()
    }
}

/// Slots taken from a [`ParallelismBudget`]; released when dropped, including
/// during unwinding.
#[derive(Debug)]
#[must_use = "slots are released as soon as the reservation is dropped"]
pub struct Reservation<'a> {
    budget: &'a ParallelismBudget,
    granted: usize,
}

impl Reservation<'_> {
    /// Number of slots granted.
    #[must_use]
    pub fn granted(&self) -> usize {
        self.granted
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.budget.release(self.granted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::{panic, sync::Barrier};

    #[rstest]
    #[case(4, 0, 0)]
    #[case(4, 3, 3)]
    #[case(4, 9, 4)]
    #[case(0, 2, 0)]
    fn reservations_are_clamped_to_free_slots(
        #[case] slots: usize,
        #[case] wanted: usize,
        #[case] granted: usize,
    ) {
        let budget = ParallelismBudget::new(slots);
        let reservation = budget.reserve(wanted);
        assert_eq!(reservation.granted(), granted);
        assert_eq!(budget.free(), slots - granted);
        drop(reservation);
        assert_eq!(budget.free(), slots);
    }

    #[test]
    fn release_never_exceeds_capacity() {
        let budget = ParallelismBudget::new(2);
        budget.release(5);
        assert_eq!(budget.free(), 2);
    }

    #[test]
    fn slots_return_when_a_worker_panics() {
        let budget = ParallelismBudget::new(3);
        let outcome = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            let _reservation = budget.reserve(3);
            panic!("worker failed");
        }));
        assert!(outcome.is_err());
        assert_eq!(budget.free(), 3);
    }

    #[test]
    fn concurrent_reservations_never_oversubscribe() {
        const THREADS: usize = 8;
        let budget = ParallelismBudget::new(5);
        let in_use = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let barrier = Barrier::new(THREADS);

        thread::scope(|scope| {
            for wanted in 1..=THREADS {
                let (budget, in_use, peak, barrier) = (&budget, &in_use, &peak, &barrier);
                scope.spawn(move || {
                    barrier.wait();
                    for _ in 0..200 {
                        let reservation = budget.reserve(wanted);
                        let now = in_use.fetch_add(reservation.granted(), Ordering::SeqCst)
                            + reservation.granted();
                        peak.fetch_max(now, Ordering::SeqCst);
                        in_use.fetch_sub(reservation.granted(), Ordering::SeqCst);
                    }
                });
            }
        });

        assert!(peak.load(Ordering::SeqCst) <= budget.capacity());
        assert_eq!(budget.free(), budget.capacity());
    }
}
