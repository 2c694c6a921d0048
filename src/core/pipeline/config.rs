//! Analysis run configuration.

use crate::core::comparator::{DetectionMethod, SimilarityWeights};
use crate::core::features::DEFAULT_MAX_FEATURES;
use crate::core::hasher::{DigestAlgorithm, HashSettings};
use crate::core::scanner::ScanConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lowest accepted user similarity
pub const MIN_SIMILARITY: f64 = 0.5;

/// Highest accepted user similarity
pub const MAX_SIMILARITY: f64 = 1.0;

/// Everything one analysis run needs to know
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub method: DetectionMethod,
    /// User similarity in [0.5, 1.0]; its unit depends on the method
    pub similarity: f64,
    pub min_group_size: usize,
    pub weights: SimilarityWeights,
    pub hashes: HashSettings,
    pub digest: DigestAlgorithm,
    /// Cap on keypoints per image for feature matching
    pub max_features: usize,
    /// ONNX model used by the embedding method
    pub embedding_model: Option<PathBuf>,
    /// Descend into subfolders
    pub recursive: bool,
    pub include_hidden: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            method: DetectionMethod::default(),
            similarity: 0.85,
            min_group_size: 2,
            weights: SimilarityWeights::default(),
            hashes: HashSettings::default(),
            digest: DigestAlgorithm::default(),
            max_features: DEFAULT_MAX_FEATURES,
            embedding_model: None,
            recursive: false,
            include_hidden: false,
        }
    }
}

impl AnalysisConfig {
    /// Check every field, returning a user-facing message for the first bad one
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_SIMILARITY..=MAX_SIMILARITY).contains(&self.similarity) {
            return Err(format!(
                "similarity must be between {} and {}, got {}",
                MIN_SIMILARITY, MAX_SIMILARITY, self.similarity
            ));
        }
        if self.min_group_size == 0 {
            return Err("minimum group size must be at least 1".to_string());
        }
        self.weights.validate()?;
        self.hashes.validate()?;
        if self.max_features == 0 {
            return Err("max features must be positive".to_string());
        }
        Ok(())
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            recursive: self.recursive,
            include_hidden: self.include_hidden,
            ..Default::default()
        }
    }
}
