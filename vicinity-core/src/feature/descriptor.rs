//! Concrete feature vectors and local descriptors.

use super::keypoint::KeyPoint;

/// Values that expose a dense float view for the float metrics.
pub trait AsFloats {
    /// Returns the vector components.
    fn floats(&self) -> &[f32];
}

/// Values that expose a packed bit view for the Hamming metric.
pub trait AsBits {
    /// Returns the bits packed into 64-bit words.
    fn words(&self) -> &[u64];
}

/// A local descriptor anchored at a keypoint.
pub trait LocalDescriptor: Send + Sync {
    /// Returns the keypoint the descriptor was extracted at.
    fn keypoint(&self) -> &KeyPoint;
}

/// A global dense float vector.
///
/// # Examples
/// ```
/// use vicinity_core::{AsFloats, FloatsFeature};
///
/// let feature = FloatsFeature::new(vec![0.5, 1.5]);
/// assert_eq!(feature.floats(), &[0.5, 1.5]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FloatsFeature {
    values: Box<[f32]>,
}

impl FloatsFeature {
    /// Wraps the given components.
    #[must_use]
    pub fn new(values: impl Into<Box<[f32]>>) -> Self {
        Self {
            values: values.into(),
        }
    }

    /// Returns the dimensionality.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the vector has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl AsFloats for FloatsFeature {
    fn floats(&self) -> &[f32] {
        &self.values
    }
}

impl AsFloats for [f32] {
    fn floats(&self) -> &[f32] {
        self
    }
}

/// A float local descriptor such as SIFT.
#[derive(Clone, Debug, PartialEq)]
pub struct FloatDescriptor {
    keypoint: KeyPoint,
    values: Box<[f32]>,
}

impl FloatDescriptor {
    /// Creates a descriptor at `keypoint`.
    #[must_use]
    pub fn new(keypoint: KeyPoint, values: impl Into<Box<[f32]>>) -> Self {
        Self {
            keypoint,
            values: values.into(),
        }
    }
}

impl AsFloats for FloatDescriptor {
    fn floats(&self) -> &[f32] {
        &self.values
    }
}

impl LocalDescriptor for FloatDescriptor {
    fn keypoint(&self) -> &KeyPoint {
        &self.keypoint
    }
}

/// A binary local descriptor such as ORB or BRISK.
///
/// # Examples
/// ```
/// use vicinity_core::{AsBits, BinaryDescriptor, KeyPoint};
///
/// let descriptor = BinaryDescriptor::from_bytes(KeyPoint::new(0.0, 0.0, 0.0, 1.0), &[0xFF, 0x01]);
/// assert_eq!(descriptor.words(), &[0x01FF]);
/// assert_eq!(descriptor.bit_len(), 16);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct BinaryDescriptor {
    keypoint: KeyPoint,
    words: Box<[u64]>,
    bit_len: usize,
}

impl BinaryDescriptor {
    /// Creates a descriptor from already packed words.
    #[must_use]
    pub fn new(keypoint: KeyPoint, words: impl Into<Box<[u64]>>) -> Self {
        let words = words.into();
        let bit_len = words.len() * 64;
        Self {
            keypoint,
            words,
            bit_len,
        }
    }

    /// Packs descriptor bytes into words, least significant byte first.
    #[must_use]
    pub fn from_bytes(keypoint: KeyPoint, bytes: &[u8]) -> Self {
        let words = bytes
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0_u64, |word, (offset, &byte)| {
                        word | (u64::from(byte) << (offset * 8))
                    })
            })
            .collect();
        Self {
            keypoint,
            words,
            bit_len: bytes.len() * 8,
        }
    }

    /// Returns the number of meaningful bits.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }
}

impl AsBits for BinaryDescriptor {
    fn words(&self) -> &[u64] {
        &self.words
    }
}

impl AsBits for [u64] {
    fn words(&self) -> &[u64] {
        self
    }
}

impl LocalDescriptor for BinaryDescriptor {
    fn keypoint(&self) -> &KeyPoint {
        &self.keypoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_pads_the_last_word() {
        let bytes = [1_u8, 0, 0, 0, 0, 0, 0, 0, 0x80];
        let descriptor = BinaryDescriptor::from_bytes(KeyPoint::new(0.0, 0.0, 0.0, 1.0), &bytes);
        assert_eq!(descriptor.words(), &[1, 0x80]);
        assert_eq!(descriptor.bit_len(), 72);
    }

    #[test]
    fn floats_feature_reports_dimension() {
        let feature = FloatsFeature::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(feature.len(), 3);
        assert!(!feature.is_empty());
        assert!(FloatsFeature::new(Vec::new()).is_empty());
    }
}
