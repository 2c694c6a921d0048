//! # Comparator Module
//!
//! Decides which images belong together.
//!
//! ## How It Works
//! 1. The detection method picks a per-pair rule and threshold
//! 2. Every unassigned image seeds a group
//! 3. Later images join when they match the seed
//! 4. Groups below the minimum size are dropped
//!
//! See [`method`] for the per-method threshold table.

mod fusion;
mod grouper;
pub mod method;
mod traits;

pub use fusion::{fused_similarity, SimilarityWeights};
pub use grouper::{GroupingOutcome, SeedGroup, SeedGrouper};
pub use method::{DetectionMethod, GroupingRule};
pub use traits::{ComparisonStrategy, ExactStrategy, FusionStrategy, HammingStrategy, SimilarityStrategy};
