//! Detection methods and their threshold semantics.
//!
//! | Method          | Per-pair test                     |
//! |-----------------|-----------------------------------|
//! | basic           | grayscale distance <= T           |
//! | color           | color distance <= T               |
//! | multi_scale     | multi-scale distance <= T         |
//! | combined        | fused similarity >= s             |
//! | exact_duplicate | content digests equal             |
//! | orb_features    | feature similarity >= 0.3         |
//! | ml_features     | embedding similarity >= 0.8       |
//!
//! For basic and color T = trunc((1 - s) x hash bits), where s is the user
//! similarity. Multi-scale scales against `multi_scale_threshold_bits`
//! (896 by default) rather than its 1344-bit length. The feature and
//! embedding methods ignore s.

use super::fusion::SimilarityWeights;
use super::traits::{ComparisonStrategy, ExactStrategy, FusionStrategy, HammingStrategy, SimilarityStrategy};
use crate::core::fingerprint::FingerprintKind;
use crate::core::hasher::HashSettings;
use serde::{Deserialize, Serialize};

/// Fixed floor for keypoint matching
pub const FEATURE_MIN_SIMILARITY: f64 = 0.3;

/// Fixed floor for embedding similarity
pub const EMBEDDING_MIN_SIMILARITY: f64 = 0.8;

/// How images are compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Grayscale average hash
    Basic,
    /// Per-channel color hash
    Color,
    /// Grayscale hashes at several sizes
    MultiScale,
    /// Weighted fusion of every available fingerprint
    #[default]
    Combined,
    /// Byte-identical files
    ExactDuplicate,
    /// Local keypoint descriptors
    OrbFeatures,
    /// Learned embeddings
    MlFeatures,
}

/// The per-pair test a method applies, with its threshold unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule", content = "value")]
pub enum GroupingRule {
    MaxHammingDistance(u32),
    MinSimilarity(f64),
    ExactMatch,
}

impl DetectionMethod {
    pub const ALL: [DetectionMethod; 7] = [
        DetectionMethod::Basic,
        DetectionMethod::Color,
        DetectionMethod::MultiScale,
        DetectionMethod::Combined,
        DetectionMethod::ExactDuplicate,
        DetectionMethod::OrbFeatures,
        DetectionMethod::MlFeatures,
    ];

    /// The name used in settings files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::Basic => "basic",
            DetectionMethod::Color => "color",
            DetectionMethod::MultiScale => "multi_scale",
            DetectionMethod::Combined => "combined",
            DetectionMethod::ExactDuplicate => "exact_duplicate",
            DetectionMethod::OrbFeatures => "orb_features",
            DetectionMethod::MlFeatures => "ml_features",
        }
    }

    /// One-line description for listings
    pub fn description(&self) -> &'static str {
        match self {
            DetectionMethod::Basic => "Standard grayscale hashing",
            DetectionMethod::Color => "Color-aware similarity detection",
            DetectionMethod::MultiScale => "Multi-resolution hashing",
            DetectionMethod::Combined => "All methods combined (recommended)",
            DetectionMethod::ExactDuplicate => "Byte-level duplicate detection",
            DetectionMethod::OrbFeatures => "Feature-based detection using keypoint descriptors",
            DetectionMethod::MlFeatures => "Similarity from a pretrained embedding model",
        }
    }

    /// The single kind this method relies on; `None` for combined
    pub fn primary_kind(&self) -> Option<FingerprintKind> {
        match self {
            DetectionMethod::Basic => Some(FingerprintKind::Grayscale),
            DetectionMethod::Color => Some(FingerprintKind::Color),
            DetectionMethod::MultiScale => Some(FingerprintKind::MultiScale),
            DetectionMethod::Combined => None,
            DetectionMethod::ExactDuplicate => Some(FingerprintKind::Content),
            DetectionMethod::OrbFeatures => Some(FingerprintKind::Features),
            DetectionMethod::MlFeatures => Some(FingerprintKind::Embedding),
        }
    }

    /// Kinds to extract for this method
    pub fn required_kinds(&self, weights: &SimilarityWeights) -> Vec<FingerprintKind> {
        match self.primary_kind() {
            Some(kind) => vec![kind],
            None => weights.active_kinds(),
        }
    }

    /// Translate the user similarity into this method's threshold unit
    pub fn rule(&self, similarity: f64, hashes: &HashSettings) -> GroupingRule {
        let max_distance = |bits: u32| ((1.0 - similarity) * bits as f64) as u32;
        match self {
            DetectionMethod::Basic => GroupingRule::MaxHammingDistance(max_distance(hashes.grayscale_bits())),
            DetectionMethod::Color => GroupingRule::MaxHammingDistance(max_distance(hashes.color_bits())),
            DetectionMethod::MultiScale => GroupingRule::MaxHammingDistance(max_distance(hashes.multi_scale_threshold_bits)),
            DetectionMethod::Combined => GroupingRule::MinSimilarity(similarity),
            DetectionMethod::ExactDuplicate => GroupingRule::ExactMatch,
            DetectionMethod::OrbFeatures => GroupingRule::MinSimilarity(FEATURE_MIN_SIMILARITY),
            DetectionMethod::MlFeatures => GroupingRule::MinSimilarity(EMBEDDING_MIN_SIMILARITY),
        }
    }

    /// Build the pair test for this method
    pub fn strategy(
        &self,
        similarity: f64,
        hashes: &HashSettings,
        weights: &SimilarityWeights,
    ) -> Box<dyn ComparisonStrategy> {
        match (self.rule(similarity, hashes), self.primary_kind()) {
            (GroupingRule::ExactMatch, _) => Box::new(ExactStrategy),
            (GroupingRule::MinSimilarity(floor), None) => Box::new(FusionStrategy::new(weights.clone(), floor)),
            (GroupingRule::MinSimilarity(floor), Some(kind)) => Box::new(SimilarityStrategy::new(kind, floor)),
            (GroupingRule::MaxHammingDistance(distance), kind) => Box::new(HammingStrategy::new(
                kind.unwrap_or(FingerprintKind::Grayscale),
                distance,
            )),
        }
    }
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DetectionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DetectionMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown detection method: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(method: DetectionMethod, similarity: f64) -> GroupingRule {
        method.rule(similarity, &HashSettings::default())
    }

    #[test]
    fn hash_thresholds_scale_with_bit_length() {
        assert_eq!(rule(DetectionMethod::Basic, 0.9), GroupingRule::MaxHammingDistance(6));
        assert_eq!(rule(DetectionMethod::Color, 0.9), GroupingRule::MaxHammingDistance(19));
        assert_eq!(rule(DetectionMethod::MultiScale, 0.9), GroupingRule::MaxHammingDistance(89));
    }

    #[test]
    fn multi_scale_threshold_ignores_hash_length() {
        let hashes = HashSettings::default();
        assert_eq!(hashes.multi_scale_bits(), 1344);
        // (1 - 0.85) * 896 = 134.4
        assert_eq!(
            DetectionMethod::MultiScale.rule(0.85, &hashes),
            GroupingRule::MaxHammingDistance(134)
        );

        let rescaled = HashSettings {
            multi_scale_threshold_bits: 1344,
            ..Default::default()
        };
        assert_eq!(
            DetectionMethod::MultiScale.rule(0.9, &rescaled),
            GroupingRule::MaxHammingDistance(134)
        );
    }

    #[test]
    fn full_similarity_means_zero_distance() {
        assert_eq!(rule(DetectionMethod::Basic, 1.0), GroupingRule::MaxHammingDistance(0));
        assert_eq!(rule(DetectionMethod::MultiScale, 1.0), GroupingRule::MaxHammingDistance(0));
    }

    #[test]
    fn threshold_truncates() {
        // (1 - 0.95) * 64 is about 3.2
        assert_eq!(rule(DetectionMethod::Basic, 0.95), GroupingRule::MaxHammingDistance(3));
        assert_eq!(rule(DetectionMethod::Basic, 0.5), GroupingRule::MaxHammingDistance(32));
    }

    #[test]
    fn fixed_floors_ignore_user_similarity() {
        for similarity in [0.5, 0.75, 1.0] {
            assert_eq!(rule(DetectionMethod::OrbFeatures, similarity), GroupingRule::MinSimilarity(0.3));
            assert_eq!(rule(DetectionMethod::MlFeatures, similarity), GroupingRule::MinSimilarity(0.8));
        }
    }

    #[test]
    fn combined_uses_similarity_directly() {
        assert_eq!(rule(DetectionMethod::Combined, 0.85), GroupingRule::MinSimilarity(0.85));
        assert_eq!(rule(DetectionMethod::ExactDuplicate, 0.5), GroupingRule::ExactMatch);
    }

    #[test]
    fn required_kinds_follow_method() {
        let weights = SimilarityWeights::default();
        assert_eq!(
            DetectionMethod::ExactDuplicate.required_kinds(&weights),
            vec![FingerprintKind::Content]
        );
        assert_eq!(
            DetectionMethod::Combined.required_kinds(&weights),
            vec![
                FingerprintKind::Grayscale,
                FingerprintKind::Color,
                FingerprintKind::MultiScale,
                FingerprintKind::Content,
                FingerprintKind::Exif,
                FingerprintKind::Features,
            ]
        );
    }

    #[test]
    fn names_round_trip() {
        for method in DetectionMethod::ALL {
            assert_eq!(method.as_str().parse::<DetectionMethod>(), Ok(method));
            assert_eq!(
                serde_json::to_string(&method).unwrap(),
                format!("\"{}\"", method.as_str())
            );
        }
        assert!("orb".parse::<DetectionMethod>().is_err());
    }
}
