//! Seeded synthetic candidates for benchmarks.
//!
//! Float candidates are drawn uniformly from the unit hypercube. Binary
//! descriptor groups are random bit strings, with a configurable share of the
//! target descriptors derived from query descriptors by flipping a few bits so
//! matchers find real correspondences.

use rand::{Rng, SeedableRng, rngs::SmallRng};
use vicinity_core::{BinaryDescriptor, DescriptorGroup, FloatsFeature, Item, ItemId, KeyPoint};

/// Errors raised by synthetic data generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntheticError {
    /// The requested number of points was zero.
    #[error("point count must be greater than zero")]
    ZeroPoints,
    /// The requested dimensionality was zero.
    #[error("dimensions must be greater than zero")]
    ZeroDimensions,
}

/// Shape and seed of a synthetic float dataset.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    /// Number of candidates.
    pub point_count: usize,
    /// Components per candidate.
    pub dimensions: usize,
    /// Random seed.
    pub seed: u64,
}

/// A query and the candidates it is searched against.
#[derive(Clone, Debug)]
pub struct SyntheticPoints {
    /// The query vector.
    pub query: FloatsFeature,
    /// Candidates with identifiers `0..point_count`.
    pub candidates: Vec<Item<FloatsFeature>>,
}

impl SyntheticPoints {
    /// Generates a query and `point_count` candidates.
    ///
    /// # Errors
    /// Returns [`SyntheticError`] when the point count or dimensionality is
    /// zero.
    ///
    /// # Examples
    /// ```
    /// use vicinity_benches::source::{SyntheticConfig, SyntheticPoints};
    ///
    /// let config = SyntheticConfig { point_count: 5, dimensions: 3, seed: 7 };
    /// let points = SyntheticPoints::generate(&config).expect("valid config");
    /// assert_eq!(points.candidates.len(), 5);
    /// assert_eq!(points.query.len(), 3);
    /// ```
    pub fn generate(config: &SyntheticConfig) -> Result<Self, SyntheticError> {
        if config.point_count == 0 {
            return Err(SyntheticError::ZeroPoints);
        }
        if config.dimensions == 0 {
            return Err(SyntheticError::ZeroDimensions);
        }

        let mut rng = SmallRng::seed_from_u64(config.seed);
        let query = random_vector(&mut rng, config.dimensions);
        let candidates = (0..config.point_count)
            .map(|index| {
                Item::new(
                    ItemId::new(index as u64),
                    random_vector(&mut rng, config.dimensions),
                )
            })
            .collect();
        Ok(Self { query, candidates })
    }
}

fn random_vector(rng: &mut SmallRng, dimensions: usize) -> FloatsFeature {
    let values: Vec<f32> = (0..dimensions)
        .map(|_| rng.gen_range(0.0_f32..1.0_f32))
        .collect();
    FloatsFeature::new(values)
}

/// Generates a query group and a target group of 256-bit descriptors.
///
/// Every other target descriptor is a copy of the matching query descriptor
/// with `noise_bits` random bits flipped; the rest are unrelated.
///
/// # Errors
/// Returns [`SyntheticError::ZeroPoints`] when `group_size` is zero.
pub fn binary_groups(
    group_size: usize,
    noise_bits: u32,
    seed: u64,
) -> Result<
    (
        DescriptorGroup<BinaryDescriptor>,
        DescriptorGroup<BinaryDescriptor>,
    ),
    SyntheticError,
> {
    if group_size == 0 {
        return Err(SyntheticError::ZeroPoints);
    }
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut queries = Vec::with_capacity(group_size);
    let mut targets = Vec::with_capacity(group_size);
    for index in 0..group_size {
        let words: [u64; 4] = rng.r#gen();
        let target_words = if index % 2 == 0 {
            let mut noisy = words;
            for _ in 0..noise_bits {
                let bit = rng.gen_range(0..256_usize);
                noisy[bit / 64] ^= 1 << (bit % 64);
            }
            noisy
        } else {
            rng.r#gen()
        };
        let x = index as f32;
        queries.push(BinaryDescriptor::new(KeyPoint::new(x, 0.0, 0.0, 1.0), words.to_vec()));
        targets.push(BinaryDescriptor::new(
            KeyPoint::new(x, 1.0, 0.0, 1.0),
            target_words.to_vec(),
        ));
    }
    Ok((DescriptorGroup::new(queries), DescriptorGroup::new(targets)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 4, SyntheticError::ZeroPoints)]
    #[case(4, 0, SyntheticError::ZeroDimensions)]
    fn rejects_empty_shapes(
        #[case] point_count: usize,
        #[case] dimensions: usize,
        #[case] expected: SyntheticError,
    ) {
        let config = SyntheticConfig {
            point_count,
            dimensions,
            seed: 1,
        };
        assert_eq!(
            SyntheticPoints::generate(&config).map(|_| ()),
            Err(expected)
        );
    }

    #[rstest]
    fn generation_is_deterministic() {
        let config = SyntheticConfig {
            point_count: 16,
            dimensions: 8,
            seed: 42,
        };
        let first = SyntheticPoints::generate(&config).expect("generation must succeed");
        let second = SyntheticPoints::generate(&config).expect("generation must succeed");
        assert_eq!(first.query, second.query);
        assert_eq!(first.candidates, second.candidates);
    }

    #[rstest]
    fn binary_groups_have_the_requested_size() {
        let (queries, targets) = binary_groups(10, 3, 5).expect("generation must succeed");
        assert_eq!(queries.len(), 10);
        assert_eq!(targets.len(), 10);
    }
}
