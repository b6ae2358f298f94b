//! Ordered groups of local descriptors belonging to one item.

use std::sync::OnceLock;

use super::descriptor::LocalDescriptor;

/// Keypoint statistics of a [`DescriptorGroup`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupStats {
    mean_xy: [f32; 2],
    norm_scale: f32,
}

impl GroupStats {
    /// Builds statistics from an explicit mean and scale.
    #[must_use]
    pub const fn new(mean_xy: [f32; 2], norm_scale: f32) -> Self {
        Self {
            mean_xy,
            norm_scale,
        }
    }

    /// Mean keypoint location.
    #[must_use]
    pub const fn mean_xy(&self) -> [f32; 2] {
        self.mean_xy
    }

    /// Factor that maps centred locations to unit root-mean-square spread.
    #[must_use]
    pub const fn norm_scale(&self) -> f32 {
        self.norm_scale
    }
}

/// Ordered local descriptors of one item plus derived keypoint statistics.
///
/// # Examples
/// ```
/// use vicinity_core::{DescriptorGroup, FloatDescriptor, KeyPoint};
///
/// let group = DescriptorGroup::new(vec![
///     FloatDescriptor::new(KeyPoint::new(0.0, 0.0, 0.0, 1.0), vec![1.0]),
///     FloatDescriptor::new(KeyPoint::new(2.0, 0.0, 0.0, 1.0), vec![2.0]),
/// ]);
/// assert_eq!(group.len(), 2);
/// assert_eq!(group.mean_xy(), [1.0, 0.0]);
/// assert_eq!(group.norm_scale(), 1.0);
/// ```
#[derive(Clone, Debug)]
pub struct DescriptorGroup<D> {
    descriptors: Vec<D>,
    stats: OnceLock<GroupStats>,
}

impl<D> DescriptorGroup<D> {
    /// Wraps descriptors in their extraction order.
    #[must_use]
    pub const fn new(descriptors: Vec<D>) -> Self {
        Self {
            descriptors,
            stats: OnceLock::new(),
        }
    }

    /// Number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns whether the group holds no descriptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Borrows the descriptors in order.
    #[must_use]
    pub fn descriptors(&self) -> &[D] {
        &self.descriptors
    }

    /// Iterates over the descriptors in order.
    pub fn iter(&self) -> std::slice::Iter<'_, D> {
        self.descriptors.iter()
    }
}

impl<D: LocalDescriptor> DescriptorGroup<D> {
    /// Returns the keypoint statistics, computing them on first use.
    ///
    /// The scale is the reciprocal of the root-mean-square distance of the
    /// keypoints from their mean. Empty groups and groups whose keypoints all
    /// coincide use a scale of `1.0`.
    pub fn stats(&self) -> GroupStats {
        *self.stats.get_or_init(|| compute_stats(&self.descriptors))
    }

    /// Mean keypoint location.
    pub fn mean_xy(&self) -> [f32; 2] {
        self.stats().mean_xy()
    }

    /// Normalisation scale.
    pub fn norm_scale(&self) -> f32 {
        self.stats().norm_scale()
    }

    /// Normalised keypoint location of the descriptor at `index`.
    pub fn normalised_xy(&self, index: usize) -> Option<[f32; 2]> {
        let descriptor = self.descriptors.get(index)?;
        Some(descriptor.keypoint().normalised_xy(self.stats()))
    }
}

impl<'a, D> IntoIterator for &'a DescriptorGroup<D> {
    type Item = &'a D;
    type IntoIter = std::slice::Iter<'a, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

impl<D: PartialEq> PartialEq for DescriptorGroup<D> {
    fn eq(&self, other: &Self) -> bool {
        self.descriptors == other.descriptors
    }
}

fn compute_stats<D: LocalDescriptor>(descriptors: &[D]) -> GroupStats {
    if descriptors.is_empty() {
        return GroupStats::new([0.0, 0.0], 1.0);
    }
    let count = descriptors.len() as f64;
    let (sum_x, sum_y) = descriptors.iter().fold((0.0_f64, 0.0_f64), |(x, y), d| {
        let [dx, dy] = d.keypoint().xy();
        (x + f64::from(dx), y + f64::from(dy))
    });
    let (mean_x, mean_y) = (sum_x / count, sum_y / count);

    let spread = descriptors
        .iter()
        .map(|d| {
            let [x, y] = d.keypoint().xy();
            let (cx, cy) = (f64::from(x) - mean_x, f64::from(y) - mean_y);
            cx * cx + cy * cy
        })
        .sum::<f64>()
        / count;
    let rms = spread.sqrt();
    let norm_scale = if rms > 0.0 && rms.is_finite() {
        (1.0 / rms) as f32
    } else {
        1.0
    };

    GroupStats::new([mean_x as f32, mean_y as f32], norm_scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{BinaryDescriptor, KeyPoint};

    fn at(x: f32, y: f32) -> BinaryDescriptor {
        BinaryDescriptor::new(KeyPoint::new(x, y, 0.0, 1.0), vec![0])
    }

    #[test]
    fn empty_group_uses_identity_stats() {
        let group: DescriptorGroup<BinaryDescriptor> = DescriptorGroup::new(Vec::new());
        assert_eq!(group.stats(), GroupStats::new([0.0, 0.0], 1.0));
        assert_eq!(group.normalised_xy(0), None);
    }

    #[test]
    fn coincident_keypoints_use_unit_scale() {
        let group = DescriptorGroup::new(vec![at(3.0, 3.0), at(3.0, 3.0)]);
        assert_eq!(group.mean_xy(), [3.0, 3.0]);
        assert_eq!(group.norm_scale(), 1.0);
    }

    #[test]
    fn normalised_locations_have_unit_spread() {
        let group = DescriptorGroup::new(vec![
            at(0.0, 0.0),
            at(4.0, 0.0),
            at(0.0, 4.0),
            at(4.0, 4.0),
        ]);
        assert_eq!(group.mean_xy(), [2.0, 2.0]);
        let scale = group.norm_scale();
        assert!((scale - 1.0 / 8.0_f32.sqrt()).abs() < 1e-6);

        let spread: f32 = (0..group.len())
            .filter_map(|index| group.normalised_xy(index))
            .map(|[x, y]| x * x + y * y)
            .sum::<f32>()
            / 4.0;
        assert!((spread - 1.0).abs() < 1e-5);
    }

    #[test]
    fn descriptors_moved_between_groups_use_the_new_group() {
        let first = DescriptorGroup::new(vec![at(3.0, 3.0), at(1.0, 1.0)]);
        let shared = first.normalised_xy(0).expect("index in range");
        assert!(shared[0] > 0.0 && shared[1] > 0.0);

        let moved = DescriptorGroup::new(vec![first.descriptors()[0].clone(), at(5.0, 5.0)]);
        let fresh = DescriptorGroup::new(vec![at(3.0, 3.0), at(5.0, 5.0)]);
        assert_eq!(moved.normalised_xy(0), fresh.normalised_xy(0));
        let [x, y] = moved.normalised_xy(0).expect("index in range");
        assert!(x < 0.0 && y < 0.0);
    }
}
