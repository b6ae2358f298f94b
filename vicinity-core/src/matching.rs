//! Correspondence matching between groups of local descriptors.
//!
//! Two tests decide whether a query descriptor has a counterpart in a target
//! group. The radius test only asks whether any target descriptor lies within
//! a fixed range. Lowe's ratio test accepts the nearest target descriptor only
//! when it is clearly closer than the second nearest. Both tests aggregate over
//! a query group into a count, a fraction, or (for the ratio test) the list of
//! correspondences.

use core::borrow::Borrow;

use crate::{
    error::MatchError,
    metric::{Metric, Result},
};

/// Existence-only match: does any target descriptor lie within `radius`?
///
/// # Examples
/// ```
/// use vicinity_core::{L1Metric, RadiusTest};
///
/// let test = RadiusTest::new(10.0)?;
/// let targets: [&[f32]; 3] = [&[5.0], &[12.0], &[20.0]];
/// let query: &[f32] = &[0.0];
/// assert!(test.has_match(&L1Metric::new(), query, targets.iter().copied())?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadiusTest {
    radius: f32,
}

impl RadiusTest {
    /// Creates a radius test.
    ///
    /// # Errors
    /// Returns [`MatchError::InvalidRadius`] when `radius` is negative or not
    /// finite.
    pub fn new(radius: f32) -> core::result::Result<Self, MatchError> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(MatchError::InvalidRadius { got: radius });
        }
        Ok(Self { radius })
    }

    /// Maximum distance that still counts as a match.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Returns whether some target lies within the radius of `query`.
    ///
    /// Stops at the first hit. Targets are measured with the radius as the
    /// early-exit bound.
    ///
    /// # Errors
    /// Propagates metric failures.
    pub fn has_match<'a, D, M, I>(&self, metric: &M, query: &D, targets: I) -> Result<bool>
    where
        D: ?Sized + 'a,
        M: Metric<D> + ?Sized,
        I: IntoIterator<Item = &'a D>,
    {
        for target in targets {
            if let Some(distance) = metric.distance_within(query, target, self.radius)? {
                if distance <= self.radius {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Counts the query descriptors that have at least one match in `targets`.
    ///
    /// # Errors
    /// Propagates metric failures.
    pub fn match_count<D, M>(&self, metric: &M, queries: &[D], targets: &[D]) -> Result<usize>
    where
        M: Metric<D> + ?Sized,
    {
        let mut count = 0;
        for query in queries {
            if self.has_match(metric, query, targets)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Share of query descriptors with a match; an empty query group yields
    /// `0.0`.
    ///
    /// # Errors
    /// Propagates metric failures.
    pub fn match_fraction<D, M>(&self, metric: &M, queries: &[D], targets: &[D]) -> Result<f64>
    where
        M: Metric<D> + ?Sized,
    {
        let count = self.match_count(metric, queries, targets)?;
        Ok(fraction(count, queries.len()))
    }
}

/// Lowe's ratio test with an optional absolute distance cap.
///
/// # Examples
/// ```
/// use vicinity_core::{L1Metric, RatioTest};
///
/// let test = RatioTest::new(0.6)?;
/// let targets: [&[f32]; 2] = [&[10.0], &[20.0]];
/// let query: &[f32] = &[0.0];
/// let best = test.best_match(&L1Metric::new(), query, &targets)?;
/// assert_eq!(best, Some((0, 10.0)));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatioTest {
    confidence: f32,
    distance_cap: Option<f32>,
}

impl RatioTest {
    /// Creates a ratio test accepting when `best / second_best < confidence`.
    ///
    /// # Errors
    /// Returns [`MatchError::InvalidConfidence`] unless `confidence` is finite
    /// and lies in `(0, 1]`.
    pub fn new(confidence: f32) -> core::result::Result<Self, MatchError> {
        if !confidence.is_finite() || confidence <= 0.0 || confidence > 1.0 {
            return Err(MatchError::InvalidConfidence { got: confidence });
        }
        Ok(Self {
            confidence,
            distance_cap: None,
        })
    }

    /// Additionally rejects any best match farther than `cap`.
    ///
    /// # Errors
    /// Returns [`MatchError::InvalidDistanceCap`] when `cap` is negative or not
    /// finite.
    pub fn with_distance_cap(self, cap: f32) -> core::result::Result<Self, MatchError> {
        if !cap.is_finite() || cap < 0.0 {
            return Err(MatchError::InvalidDistanceCap { got: cap });
        }
        Ok(Self {
            distance_cap: Some(cap),
            ..self
        })
    }

    /// Acceptance threshold on the distance ratio.
    #[must_use]
    pub const fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Absolute cap on the best distance, if configured.
    #[must_use]
    pub const fn distance_cap(&self) -> Option<f32> {
        self.distance_cap
    }

    /// Finds the accepted nearest target of `query`, as `(index, distance)`.
    ///
    /// Groups with fewer than two targets never match. The scan keeps the best
    /// and second-best distances using strict comparisons only; a zero
    /// second-best distance is ambiguous and rejected. With a cap configured,
    /// each target is measured with the running second-best distance as the
    /// early-exit bound, and pruned targets are skipped.
    ///
    /// # Errors
    /// Propagates metric failures.
    pub fn best_match<D, M, T>(
        &self,
        metric: &M,
        query: &D,
        targets: &[T],
    ) -> Result<Option<(usize, f32)>>
    where
        D: ?Sized,
        M: Metric<D> + ?Sized,
        T: Borrow<D>,
    {
        if targets.len() < 2 {
            return Ok(None);
        }

        let mut best: Option<(usize, f32)> = None;
        let mut second = f32::INFINITY;
        for (index, target) in targets.iter().enumerate() {
            let target = Borrow::<D>::borrow(target);
            let distance = match self.distance_cap {
                None => metric.distance(query, target)?,
                Some(_) => match metric.distance_within(query, target, second)? {
                    Some(distance) => distance,
                    None => continue,
                },
            };
            match best {
                Some((_, first)) if distance >= first => {
                    if distance < second {
                        second = distance;
                    }
                }
                Some((_, first)) => {
                    second = first;
                    best = Some((index, distance));
                }
                None => best = Some((index, distance)),
            }
        }

        let Some((index, first)) = best else {
            return Ok(None);
        };
        if second == 0.0 {
            return Ok(None);
        }
        if self.distance_cap.is_some_and(|cap| first > cap) {
            return Ok(None);
        }
        let ratio = f64::from(first) / f64::from(second);
        Ok((ratio < f64::from(self.confidence)).then_some((index, first)))
    }

    /// Counts query descriptors with an accepted match in `targets`.
    ///
    /// # Errors
    /// Propagates metric failures.
    pub fn match_count<D, M>(&self, metric: &M, queries: &[D], targets: &[D]) -> Result<usize>
    where
        M: Metric<D> + ?Sized,
    {
        Ok(self.matches(metric, queries, targets)?.len())
    }

    /// Share of query descriptors with an accepted match; an empty query group
    /// yields `0.0`.
    ///
    /// # Errors
    /// Propagates metric failures.
    pub fn match_fraction<D, M>(&self, metric: &M, queries: &[D], targets: &[D]) -> Result<f64>
    where
        M: Metric<D> + ?Sized,
    {
        let count = self.match_count(metric, queries, targets)?;
        Ok(fraction(count, queries.len()))
    }

    /// Lists the accepted correspondences from `queries` into `targets`, in
    /// query order.
    ///
    /// # Errors
    /// Propagates metric failures.
    pub fn matches<'a, D, M>(
        &self,
        metric: &M,
        queries: &'a [D],
        targets: &'a [D],
    ) -> Result<Vec<Correspondence<'a, D>>>
    where
        M: Metric<D> + ?Sized,
    {
        if targets.len() < 2 {
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        for (query_index, query) in queries.iter().enumerate() {
            if let Some((target_index, distance)) = self.best_match(metric, query, targets)? {
                found.push(Correspondence {
                    query_index,
                    target_index,
                    query,
                    target: &targets[target_index],
                    distance,
                });
            }
        }
        Ok(found)
    }
}

/// An accepted pairing of a query descriptor with a target descriptor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correspondence<'a, D> {
    /// Position of the query descriptor in its group.
    pub query_index: usize,
    /// Position of the matched descriptor in the target group.
    pub target_index: usize,
    /// The query descriptor.
    pub query: &'a D,
    /// The matched target descriptor.
    pub target: &'a D,
    /// Distance between the two.
    pub distance: f32,
}

fn fraction(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64
}
