//! Per-pair match rules.

use super::fusion::{fused_similarity, SimilarityWeights};
use crate::core::fingerprint::{FingerprintKind, FingerprintSet};

/// Decides whether a candidate joins a seed's group
pub trait ComparisonStrategy: Send + Sync {
    fn is_match(&self, seed: &FingerprintSet, candidate: &FingerprintSet) -> bool;

    /// Human-readable description of the strategy
    fn description(&self) -> String;
}

/// Bit-string hashes within a maximum Hamming distance
#[derive(Debug, Clone)]
pub struct HammingStrategy {
    kind: FingerprintKind,
    max_distance: u32,
}

impl HammingStrategy {
    pub fn new(kind: FingerprintKind, max_distance: u32) -> Self {
        Self { kind, max_distance }
    }

    pub fn max_distance(&self) -> u32 {
        self.max_distance
    }
}

impl ComparisonStrategy for HammingStrategy {
    fn is_match(&self, seed: &FingerprintSet, candidate: &FingerprintSet) -> bool {
        let (a, b) = match self.kind {
            FingerprintKind::Grayscale => (&seed.grayscale, &candidate.grayscale),
            FingerprintKind::Color => (&seed.color, &candidate.color),
            FingerprintKind::MultiScale => (&seed.multi_scale, &candidate.multi_scale),
            _ => return false,
        };
        match (a, b) {
            (Some(a), Some(b)) => a.distance(b).is_some_and(|d| d <= self.max_distance),
            _ => false,
        }
    }

    fn description(&self) -> String {
        format!("{} hash distance <= {}", self.kind, self.max_distance)
    }
}

/// Byte-identical files
#[derive(Debug, Clone, Default)]
pub struct ExactStrategy;

impl ComparisonStrategy for ExactStrategy {
    fn is_match(&self, seed: &FingerprintSet, candidate: &FingerprintSet) -> bool {
        match (&seed.content, &candidate.content) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn description(&self) -> String {
        "identical file contents".to_string()
    }
}

/// One kind's similarity at or above a floor
#[derive(Debug, Clone)]
pub struct SimilarityStrategy {
    kind: FingerprintKind,
    min_similarity: f64,
}

impl SimilarityStrategy {
    pub fn new(kind: FingerprintKind, min_similarity: f64) -> Self {
        Self { kind, min_similarity }
    }
}

impl ComparisonStrategy for SimilarityStrategy {
    fn is_match(&self, seed: &FingerprintSet, candidate: &FingerprintSet) -> bool {
        seed.similarity(candidate, self.kind)
            .is_some_and(|s| s >= self.min_similarity)
    }

    fn description(&self) -> String {
        format!("{} similarity >= {:.2}", self.kind, self.min_similarity)
    }
}

/// Fused similarity at or above a floor
#[derive(Debug, Clone)]
pub struct FusionStrategy {
    weights: SimilarityWeights,
    min_similarity: f64,
}

impl FusionStrategy {
    pub fn new(weights: SimilarityWeights, min_similarity: f64) -> Self {
        Self {
            weights,
            min_similarity,
        }
    }
}

impl ComparisonStrategy for FusionStrategy {
    fn is_match(&self, seed: &FingerprintSet, candidate: &FingerprintSet) -> bool {
        fused_similarity(seed, candidate, &self.weights) >= self.min_similarity
    }

    fn description(&self) -> String {
        format!("combined similarity >= {:.2}", self.min_similarity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::embedding::EmbeddingVector;
    use crate::core::hasher::{BitHash, ContentHasher};

    fn gray(bits: &str) -> FingerprintSet {
        FingerprintSet {
            grayscale: Some(BitHash::from_bit_str(bits)),
            ..Default::default()
        }
    }

    #[test]
    fn hamming_strategy_at_boundary() {
        let strategy = HammingStrategy::new(FingerprintKind::Grayscale, 2);
        let seed = gray("00000000");

        assert!(strategy.is_match(&seed, &gray("11000000")));
        assert!(!strategy.is_match(&seed, &gray("11100000")));
    }

    #[test]
    fn hamming_strategy_skips_length_mismatch() {
        let strategy = HammingStrategy::new(FingerprintKind::Grayscale, 64);
        assert!(!strategy.is_match(&gray("0000"), &gray("00000")));
    }

    #[test]
    fn hamming_strategy_needs_both_hashes() {
        let strategy = HammingStrategy::new(FingerprintKind::Color, 64);
        assert!(!strategy.is_match(&gray("0000"), &gray("0000")));
    }

    #[test]
    fn exact_strategy_compares_digests() {
        let hasher = ContentHasher::default();
        let with = |bytes: &[u8]| FingerprintSet {
            content: Some(hasher.hash_bytes(bytes)),
            ..Default::default()
        };

        assert!(ExactStrategy.is_match(&with(b"abc"), &with(b"abc")));
        assert!(!ExactStrategy.is_match(&with(b"abc"), &with(b"abd")));
    }

    #[test]
    fn similarity_strategy_uses_floor() {
        let with = |values: Vec<f32>| FingerprintSet {
            embedding: Some(EmbeddingVector {
                model: "m".to_string(),
                values,
            }),
            ..Default::default()
        };
        let strategy = SimilarityStrategy::new(FingerprintKind::Embedding, 0.8);

        assert!(strategy.is_match(&with(vec![1.0, 0.0]), &with(vec![1.0, 0.1])));
        assert!(!strategy.is_match(&with(vec![1.0, 0.0]), &with(vec![0.0, 1.0])));
    }

    #[test]
    fn description_includes_threshold() {
        assert!(HammingStrategy::new(FingerprintKind::Grayscale, 7)
            .description()
            .contains('7'));
        assert!(FusionStrategy::new(SimilarityWeights::default(), 0.85)
            .description()
            .contains("0.85"));
    }
}
