//! Persisted user settings.
//!
//! A small JSON file that seeds an [`AnalysisConfig`]. Every field is
//! optional; missing fields keep the config's current value.

use super::config::AnalysisConfig;
use crate::core::comparator::{DetectionMethod, SimilarityWeights};
use crate::core::hasher::{DigestAlgorithm, HashSettings};
use crate::error::ImageSorterError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up under the platform config directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Settings loaded from disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SorterSettings {
    #[serde(alias = "detection_method")]
    pub method: Option<DetectionMethod>,
    #[serde(alias = "similarity_threshold")]
    pub similarity: Option<f64>,
    pub min_group_size: Option<usize>,
    pub weights: Option<SimilarityWeights>,
    pub hashes: Option<HashSettings>,
    pub digest: Option<DigestAlgorithm>,
    pub embedding_model: Option<PathBuf>,
    pub recursive: Option<bool>,
}

impl SorterSettings {
    /// `<config dir>/image-sorter/settings.json`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("image-sorter").join(SETTINGS_FILE))
    }

    /// Read and parse a settings file
    pub fn load(path: &Path) -> Result<Self, ImageSorterError> {
        let text = fs::read_to_string(path).map_err(|e| {
            ImageSorterError::Config(format!("Cannot read settings {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            ImageSorterError::Config(format!("Invalid settings {}: {}", path.display(), e))
        })
    }

    /// Load an explicit file, or the default one when it exists.
    ///
    /// A missing default file yields empty settings; a missing explicit file is an error.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ImageSorterError> {
        match explicit {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Overwrite the fields of `config` this file sets
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(method) = self.method {
            config.method = method;
        }
        if let Some(similarity) = self.similarity {
            config.similarity = similarity;
        }
        if let Some(size) = self.min_group_size {
            config.min_group_size = size;
        }
        if let Some(ref weights) = self.weights {
            config.weights = weights.clone();
        }
        if let Some(ref hashes) = self.hashes {
            config.hashes = hashes.clone();
        }
        if let Some(digest) = self.digest {
            config.digest = digest;
        }
        if let Some(ref model) = self.embedding_model {
            config.embedding_model = Some(model.clone());
        }
        if let Some(recursive) = self.recursive {
            config.recursive = recursive;
        }
    }
}
