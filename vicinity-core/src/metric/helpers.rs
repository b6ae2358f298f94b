//! Shared helpers for metric implementations.

use crate::error::MetricError;

use super::Result;

/// Number of components accumulated between two early-exit checks.
pub(crate) const CHECK_STRIDE: usize = 8;

/// Ensures both inputs share the same dimensionality.
pub(crate) fn ensure_same_dimension(left: usize, right: usize) -> Result<()> {
    if left != right {
        return Err(MetricError::DimensionMismatch { left, right });
    }
    Ok(())
}

/// Sums `terms` and maps the total through `finish`.
pub(crate) fn sum_terms<I, F>(terms: I, finish: F) -> f32
where
    I: Iterator<Item = f64>,
    F: Fn(f64) -> f32,
{
    finish(terms.sum())
}

/// Sums `terms`, abandoning the scan once the finished value must exceed `max`.
///
/// `limit` is `max` expressed in accumulator units (the bound itself for L1,
/// its square for L2); the running sum is compared against it and `finish`
/// only runs once the sum has crossed it. `finish` must be monotonically
/// non-decreasing and every term must be non-negative, so a partial sum that
/// already exceeds `max` proves the total does too. Returns `None` exactly
/// when the finished total exceeds `max`. A NaN total is returned as is so
/// callers can reject it.
pub(crate) fn bounded_sum<I, F>(terms: I, max: f32, limit: f64, finish: F) -> Option<f32>
where
    I: Iterator<Item = f64>,
    F: Fn(f64) -> f32,
{
    let mut sum = 0.0_f64;
    for (index, term) in terms.enumerate() {
        sum += term;
        if (index + 1) % CHECK_STRIDE == 0 && sum > limit && finish(sum) > max {
            return None;
        }
    }
    let total = finish(sum);
    (total.is_nan() || total <= max).then_some(total)
}

/// Component-wise mean of equally sized vectors.
pub(crate) fn mean_components<'a, I>(rows: I) -> Result<Vec<f32>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut rows = rows.into_iter();
    let first = rows.next().ok_or(MetricError::EmptyMean)?;
    let mut sums: Vec<f64> = first.iter().copied().map(f64::from).collect();
    let mut count = 1_u32;
    for row in rows {
        ensure_same_dimension(sums.len(), row.len())?;
        for (sum, &value) in sums.iter_mut().zip(row) {
            *sum += f64::from(value);
        }
        count += 1;
    }
    let count = f64::from(count);
    Ok(sums.into_iter().map(|sum| (sum / count) as f32).collect())
}
