//! Weighted fusion of per-kind similarities.

use crate::core::fingerprint::{FingerprintKind, FingerprintSet};
use serde::{Deserialize, Serialize};

/// Weight given to each fingerprint kind in combined mode.
///
/// Weights need not sum to one; the fused score is normalised by the weights
/// that were actually usable for a pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityWeights {
    pub grayscale: f64,
    pub color: f64,
    pub multi_scale: f64,
    pub content: f64,
    pub exif: f64,
    pub features: f64,
    pub embedding: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            grayscale: 0.20,
            color: 0.20,
            multi_scale: 0.15,
            content: 0.15,
            exif: 0.10,
            features: 0.20,
            embedding: 0.0,
        }
    }
}

impl SimilarityWeights {
    pub fn weight(&self, kind: FingerprintKind) -> f64 {
        match kind {
            FingerprintKind::Grayscale => self.grayscale,
            FingerprintKind::Color => self.color,
            FingerprintKind::MultiScale => self.multi_scale,
            FingerprintKind::Content => self.content,
            FingerprintKind::Exif => self.exif,
            FingerprintKind::Features => self.features,
            FingerprintKind::Embedding => self.embedding,
        }
    }

    /// Kinds with a positive weight, in fusion order
    pub fn active_kinds(&self) -> Vec<FingerprintKind> {
        FingerprintKind::ALL
            .into_iter()
            .filter(|kind| self.weight(*kind) > 0.0)
            .collect()
    }

    /// Reject negative or non-finite weights
    pub fn validate(&self) -> Result<(), String> {
        for kind in FingerprintKind::ALL {
            let weight = self.weight(kind);
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!("weight for {} must be a non-negative number, got {}", kind, weight));
            }
        }
        Ok(())
    }
}

/// Weighted mean of the similarities both images can provide.
///
/// A kind contributes only when its weight is positive and both sets carry
/// it; its weight then joins the denominator. Returns 0.0 when no kind
/// contributes.
pub fn fused_similarity(a: &FingerprintSet, b: &FingerprintSet, weights: &SimilarityWeights) -> f64 {
    let mut score = 0.0;
    let mut denominator = 0.0;

    for kind in FingerprintKind::ALL {
        let weight = weights.weight(kind);
        if weight <= 0.0 {
            continue;
        }
        if let Some(similarity) = a.similarity(b, kind) {
            score += similarity * weight;
            denominator += weight;
        }
    }

    if denominator > 0.0 {
        (score / denominator).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::{BitHash, ContentHasher};
    use crate::core::metadata::ExifRecord;

    fn set(gray: &str, content: &[u8], make: &str) -> FingerprintSet {
        FingerprintSet {
            grayscale: Some(BitHash::from_bit_str(gray)),
            content: Some(ContentHasher::default().hash_bytes(content)),
            exif: Some(ExifRecord {
                camera_make: Some(make.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_match_documented_table() {
        let weights = SimilarityWeights::default();
        assert_eq!(weights.grayscale, 0.20);
        assert_eq!(weights.exif, 0.10);
        assert_eq!(weights.embedding, 0.0);
        assert!(!weights.active_kinds().contains(&FingerprintKind::Embedding));
    }

    #[test]
    fn identical_sets_fuse_to_one() {
        let a = set("10101010", b"x", "Canon");
        assert!((fused_similarity(&a, &a, &SimilarityWeights::default()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn missing_kinds_leave_the_denominator() {
        let a = set("11110000", b"x", "Canon");
        let b = FingerprintSet {
            grayscale: Some(BitHash::from_bit_str("11110000")),
            ..Default::default()
        };
        // Only grayscale is shared, and it matches exactly.
        assert_eq!(fused_similarity(&a, &b, &SimilarityWeights::default()), 1.0);
    }

    #[test]
    fn score_is_weighted_mean() {
        let a = set("11110000", b"same", "Canon");
        let b = set("11110000", b"same", "Nikon");
        let weights = SimilarityWeights::default();

        // grayscale 1.0 * 0.20 + content 1.0 * 0.15 + exif 0.0 * 0.10
        let expected = 0.35 / 0.45;
        assert!((fused_similarity(&a, &b, &weights) - expected).abs() < 1e-12);
    }

    #[test]
    fn pixel_twins_with_different_metadata_stay_close() {
        use crate::core::features::{FeatureSet, Keypoint};

        let twin = |bytes: &[u8], datetime: &str| FingerprintSet {
            grayscale: Some(BitHash::from_bit_str("11110000")),
            color: Some(BitHash::from_bit_str("110011001100")),
            multi_scale: Some(BitHash::from_bit_str("1010101010")),
            content: Some(ContentHasher::default().hash_bytes(bytes)),
            exif: Some(ExifRecord {
                camera_make: Some("Canon".to_string()),
                camera_model: Some("EOS R5".to_string()),
                datetime: Some(datetime.to_string()),
                ..Default::default()
            }),
            features: Some(FeatureSet {
                keypoints: vec![Keypoint { x: 20, y: 20, score: 9.0 }],
                descriptors: vec![[0x5A; 32]],
            }),
            embedding: None,
        };
        let a = twin(b"exif one", "2024:01:01 10:00:00");
        let b = twin(b"exif two", "2024:02:03 10:00:00");

        // Pixel kinds and features agree, the digest does not, EXIF agrees on 2 of 3 fields.
        let expected = 0.20 + 0.20 + 0.15 + 0.20 + 0.10 * 2.0 / 3.0;
        let score = fused_similarity(&a, &b, &SimilarityWeights::default());
        assert!((score - expected).abs() < 1e-9);
        assert!(score > 0.8 && score < 0.9);
    }

    #[test]
    fn nothing_shared_scores_zero() {
        let a = FingerprintSet {
            color: Some(BitHash::from_bit_str("1")),
            ..Default::default()
        };
        let b = FingerprintSet::default();
        assert_eq!(fused_similarity(&a, &b, &SimilarityWeights::default()), 0.0);
    }

    #[test]
    fn zero_weight_kinds_are_ignored() {
        let a = set("11110000", b"a", "Canon");
        let b = set("00001111", b"b", "Canon");
        let exif_only = SimilarityWeights {
            grayscale: 0.0,
            color: 0.0,
            multi_scale: 0.0,
            content: 0.0,
            exif: 1.0,
            features: 0.0,
            embedding: 0.0,
        };
        assert_eq!(fused_similarity(&a, &b, &exif_only), 1.0);
    }

    #[test]
    fn negative_weights_are_rejected() {
        let weights = SimilarityWeights {
            color: -0.1,
            ..Default::default()
        };
        assert!(weights.validate().is_err());
        assert!(SimilarityWeights::default().validate().is_ok());

        let nan = SimilarityWeights {
            exif: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }
}
