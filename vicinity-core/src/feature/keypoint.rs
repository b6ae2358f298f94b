//! Keypoints anchoring local descriptors.

use std::sync::OnceLock;

use super::group::GroupStats;

/// Image location, orientation, and scale of a local descriptor.
///
/// The normalised location is derived from the statistics of the owning
/// [`crate::DescriptorGroup`] on first request and memoised; later requests
/// return the stored value regardless of the statistics passed in. Clones
/// start with an empty cache so they can join a different group.
#[derive(Debug)]
pub struct KeyPoint {
    xy: [f32; 2],
    orientation: f32,
    scale: f32,
    normalised: OnceLock<[f32; 2]>,
}

impl KeyPoint {
    /// Creates a keypoint at `(x, y)`.
    #[must_use]
    pub const fn new(x: f32, y: f32, orientation: f32, scale: f32) -> Self {
        Self {
            xy: [x, y],
            orientation,
            scale,
            normalised: OnceLock::new(),
        }
    }

    /// Returns the image coordinates.
    #[must_use]
    pub const fn xy(&self) -> [f32; 2] {
        self.xy
    }

    /// Returns the orientation in radians.
    #[must_use]
    pub const fn orientation(&self) -> f32 {
        self.orientation
    }

    /// Returns the detection scale.
    #[must_use]
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// Returns the location centred on the group mean and scaled by the group
    /// normalisation factor.
    ///
    /// Computed at most once even under concurrent callers.
    ///
    /// # Examples
    /// ```
    /// use vicinity_core::{GroupStats, KeyPoint};
    ///
    /// let keypoint = KeyPoint::new(4.0, 6.0, 0.0, 1.0);
    /// let stats = GroupStats::new([2.0, 2.0], 0.5);
    /// assert_eq!(keypoint.normalised_xy(stats), [1.0, 2.0]);
    /// ```
    #[must_use]
    pub fn normalised_xy(&self, stats: GroupStats) -> [f32; 2] {
        *self.normalised.get_or_init(|| {
            let [mean_x, mean_y] = stats.mean_xy();
            [
                (self.xy[0] - mean_x) * stats.norm_scale(),
                (self.xy[1] - mean_y) * stats.norm_scale(),
            ]
        })
    }
}

impl Clone for KeyPoint {
    fn clone(&self) -> Self {
        Self::new(self.xy[0], self.xy[1], self.orientation, self.scale)
    }
}

impl PartialEq for KeyPoint {
    fn eq(&self, other: &Self) -> bool {
        self.xy == other.xy && self.orientation == other.orientation && self.scale == other.scale
    }
}
