//! # Features Module
//!
//! Local keypoint descriptors and descriptor matching.
//!
//! Keypoints come from a FAST-9 corner detector; each one is described by a
//! 256-bit binary test pattern over a smoothed patch. Two sets are compared
//! by mutual nearest-neighbour matching under Hamming distance.

mod brief;

pub use brief::FastBriefBackend;

use crate::error::ExtractionError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Descriptor width in bytes
pub const DESCRIPTOR_BYTES: usize = 32;

/// Matches closer than this many bits count as good
pub const GOOD_MATCH_DISTANCE: u32 = 50;

/// Default cap on keypoints per image
pub const DEFAULT_MAX_FEATURES: usize = 500;

/// A 256-bit binary descriptor
pub type Descriptor = [u8; DESCRIPTOR_BYTES];

/// A detected corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: u32,
    pub y: u32,
    pub score: f32,
}

/// Keypoints and their descriptors, index-aligned
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl FeatureSet {
    pub fn keypoint_count(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Keypoint detector and descriptor extractor
pub trait FeatureBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Detect at most `max_features` keypoints and describe them
    fn detect(&self, image: &DynamicImage, max_features: usize) -> Result<FeatureSet, ExtractionError>;
}

/// Bits that differ between two descriptors
pub fn descriptor_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

fn nearest(query: &Descriptor, train: &[Descriptor]) -> Option<(usize, u32)> {
    train
        .iter()
        .enumerate()
        .map(|(index, candidate)| (index, descriptor_distance(query, candidate)))
        .min_by_key(|&(_, distance)| distance)
}

/// Share of cross-checked matches closer than [`GOOD_MATCH_DISTANCE`].
///
/// A pair (i, j) is a match when j is i's nearest neighbour in `b` and i is
/// j's nearest neighbour in `a`. Returns 0.0 when either set is empty or no
/// pair survives the cross-check.
pub fn feature_similarity(a: &FeatureSet, b: &FeatureSet) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let backward: Vec<Option<usize>> = b
        .descriptors
        .iter()
        .map(|descriptor| nearest(descriptor, &a.descriptors).map(|(index, _)| index))
        .collect();

    let mut total = 0usize;
    let mut good = 0usize;
    for (i, descriptor) in a.descriptors.iter().enumerate() {
        if let Some((j, distance)) = nearest(descriptor, &b.descriptors) {
            if backward[j] == Some(i) {
                total += 1;
                if distance < GOOD_MATCH_DISTANCE {
                    good += 1;
                }
            }
        }
    }

    if total == 0 {
        0.0
    } else {
        good as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(descriptors: Vec<Descriptor>) -> FeatureSet {
        FeatureSet {
            keypoints: descriptors
                .iter()
                .enumerate()
                .map(|(i, _)| Keypoint {
                    x: i as u32,
                    y: 0,
                    score: 1.0,
                })
                .collect(),
            descriptors,
        }
    }

    fn pattern(seed: u8) -> Descriptor {
        let mut descriptor = [0u8; DESCRIPTOR_BYTES];
        for (i, byte) in descriptor.iter_mut().enumerate() {
            *byte = seed.wrapping_mul(31).wrapping_add(i as u8 * 17);
        }
        descriptor
    }

    #[test]
    fn distance_counts_bits() {
        let a = [0u8; DESCRIPTOR_BYTES];
        let mut b = [0u8; DESCRIPTOR_BYTES];
        b[0] = 0b1011;
        b[31] = 0xFF;
        assert_eq!(descriptor_distance(&a, &b), 11);
    }

    #[test]
    fn identical_sets_match_fully() {
        let a = set(vec![pattern(1), pattern(2), pattern(3)]);
        assert_eq!(feature_similarity(&a, &a), 1.0);
    }

    #[test]
    fn empty_sets_score_zero() {
        let a = set(vec![pattern(1)]);
        assert_eq!(feature_similarity(&a, &FeatureSet::default()), 0.0);
        assert_eq!(feature_similarity(&FeatureSet::default(), &a), 0.0);
    }

    #[test]
    fn distant_matches_are_not_good() {
        let a = set(vec![[0x00; DESCRIPTOR_BYTES]]);
        let b = set(vec![[0xFF; DESCRIPTOR_BYTES]]);
        // The only pair cross-checks but is 256 bits apart.
        assert_eq!(feature_similarity(&a, &b), 0.0);
    }

    #[test]
    fn similarity_is_good_over_total() {
        let mut near = [0u8; DESCRIPTOR_BYTES];
        near[0] = 0b1;
        let a = set(vec![[0x00; DESCRIPTOR_BYTES], [0xFF; DESCRIPTOR_BYTES]]);
        let b = set(vec![near, [0x3F; DESCRIPTOR_BYTES]]);

        // 0x00 <-> near (1 bit), 0xFF <-> 0x3F (64 bits)
        assert_eq!(feature_similarity(&a, &b), 0.5);
    }
}
