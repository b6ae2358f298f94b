//! Static partitioning of candidate slices into contiguous worker ranges.

use std::ops::Range;

/// Splits `len` items into `parts` sizes that differ by at most one.
///
/// The first `len % parts` parts receive the extra item. `parts == 0` yields
/// no sizes.
///
/// # Examples
/// ```
/// use vicinity_core::split_sizes;
///
/// assert_eq!(split_sizes(17, 5), vec![4, 4, 3, 3, 3]);
/// assert_eq!(split_sizes(2, 4), vec![1, 1, 0, 0]);
/// ```
#[must_use]
pub fn split_sizes(len: usize, parts: usize) -> Vec<usize> {
    if parts == 0 {
        return Vec::new();
    }
    let (base, remainder) = (len / parts, len % parts);
    (0..parts)
        .map(|index| base + usize::from(index < remainder))
        .collect()
}

/// Splits `0..len` into at most `parts` contiguous, non-empty ranges.
///
/// # Examples
/// ```
/// use vicinity_core::partition;
///
/// assert_eq!(partition(5, 2), vec![0..3, 3..5]);
/// assert_eq!(partition(2, 4), vec![0..1, 1..2]);
/// assert!(partition(0, 3).is_empty());
/// ```
#[must_use]
pub fn partition(len: usize, parts: usize) -> Vec<Range<usize>> {
    let mut start = 0;
    split_sizes(len, parts)
        .into_iter()
        .filter(|&size| size > 0)
        .map(|size| {
            let range = start..start + size;
            start += size;
            range
        })
        .collect()
}
