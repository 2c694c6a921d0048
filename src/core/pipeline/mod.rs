//! # Pipeline Module
//!
//! Orchestrates one analysis run: list the folder, fingerprint every image,
//! then group them under the method's rule.

mod config;
mod executor;
mod settings;

pub use config::{AnalysisConfig, MAX_SIMILARITY, MIN_SIMILARITY};
pub use executor::{AnalysisResult, Analyzer, AnalyzerBuilder, CapabilityNotice, ExcludedImage, ImageGroup};
pub use settings::{SorterSettings, SETTINGS_FILE};
