//! # Core Module
//!
//! The presentation-agnostic image grouping engine.
//!
//! ## Modules
//! - `scanner` - Lists the images in a folder
//! - `hasher` - Grayscale, color, multi-scale and content hashes
//! - `metadata` - Extracts EXIF records
//! - `features` - Keypoint detection and descriptor matching
//! - `embedding` - Learned image embeddings
//! - `capability` - Whether an optional backend can be used
//! - `fingerprint` - Per-image fingerprints and their extraction
//! - `comparator` - Detection methods, fusion and seed grouping
//! - `pipeline` - Orchestrates an analysis run
//! - `organize` - Moves grouped images into per-group folders

pub mod capability;
pub mod comparator;
pub mod embedding;
pub mod features;
pub mod fingerprint;
pub mod hasher;
pub mod metadata;
pub mod organize;
pub mod pipeline;
pub mod scanner;

// Re-export commonly used types
pub use capability::Capability;
pub use comparator::{DetectionMethod, GroupingRule, SimilarityWeights};
pub use fingerprint::{FingerprintKind, FingerprintSet};
pub use hasher::{BitHash, DigestAlgorithm, HashSettings};
pub use metadata::ExifRecord;
pub use organize::{GroupSorter, SortOptions, SortResult};
pub use pipeline::{AnalysisConfig, AnalysisResult, Analyzer, ImageGroup, SorterSettings};
pub use scanner::ImageFile;
