//! # Fingerprint Module
//!
//! Per-image fingerprints of every kind, and the extractor that computes
//! them.
//!
//! A [`FingerprintSet`] holds whatever could be computed for one image. A
//! kind that failed or was not requested is simply absent, so fusion can
//! skip it without aborting the run.

mod extractor;

pub use extractor::{Extraction, Extractor};

use super::embedding::{embedding_similarity, EmbeddingVector};
use super::features::{feature_similarity, FeatureSet};
use super::hasher::{BitHash, ContentHash};
use super::metadata::{exif_similarity, ExifRecord};
use serde::{Deserialize, Serialize};

/// Every kind of fingerprint the sorter can compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintKind {
    Grayscale,
    Color,
    MultiScale,
    Content,
    Exif,
    Features,
    Embedding,
}

impl FingerprintKind {
    /// All kinds in fusion order
    pub const ALL: [FingerprintKind; 7] = [
        FingerprintKind::Grayscale,
        FingerprintKind::Color,
        FingerprintKind::MultiScale,
        FingerprintKind::Content,
        FingerprintKind::Exif,
        FingerprintKind::Features,
        FingerprintKind::Embedding,
    ];

    /// Whether computing this kind needs decoded pixels
    pub fn needs_pixels(&self) -> bool {
        matches!(
            self,
            FingerprintKind::Grayscale
                | FingerprintKind::Color
                | FingerprintKind::MultiScale
                | FingerprintKind::Features
                | FingerprintKind::Embedding
        )
    }
}

impl std::fmt::Display for FingerprintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FingerprintKind::Grayscale => "grayscale",
            FingerprintKind::Color => "color",
            FingerprintKind::MultiScale => "multi_scale",
            FingerprintKind::Content => "content",
            FingerprintKind::Exif => "exif",
            FingerprintKind::Features => "features",
            FingerprintKind::Embedding => "embedding",
        };
        write!(f, "{}", name)
    }
}

/// A borrowed view of one fingerprint
#[derive(Debug, Clone, Copy)]
pub enum Fingerprint<'a> {
    Grayscale(&'a BitHash),
    Color(&'a BitHash),
    MultiScale(&'a BitHash),
    Content(&'a ContentHash),
    Exif(&'a ExifRecord),
    Features(&'a FeatureSet),
    Embedding(&'a EmbeddingVector),
}

impl<'a> Fingerprint<'a> {
    pub fn kind(&self) -> FingerprintKind {
        match self {
            Fingerprint::Grayscale(_) => FingerprintKind::Grayscale,
            Fingerprint::Color(_) => FingerprintKind::Color,
            Fingerprint::MultiScale(_) => FingerprintKind::MultiScale,
            Fingerprint::Content(_) => FingerprintKind::Content,
            Fingerprint::Exif(_) => FingerprintKind::Exif,
            Fingerprint::Features(_) => FingerprintKind::Features,
            Fingerprint::Embedding(_) => FingerprintKind::Embedding,
        }
    }

    /// Similarity in [0, 1], or `None` when the kinds differ
    pub fn similarity(&self, other: &Fingerprint<'_>) -> Option<f64> {
        let score = match (self, other) {
            (Fingerprint::Grayscale(a), Fingerprint::Grayscale(b))
            | (Fingerprint::Color(a), Fingerprint::Color(b))
            | (Fingerprint::MultiScale(a), Fingerprint::MultiScale(b)) => a.similarity(b),
            (Fingerprint::Content(a), Fingerprint::Content(b)) => a.exact_match(b),
            (Fingerprint::Exif(a), Fingerprint::Exif(b)) => exif_similarity(a, b),
            (Fingerprint::Features(a), Fingerprint::Features(b)) => feature_similarity(a, b),
            (Fingerprint::Embedding(a), Fingerprint::Embedding(b)) => embedding_similarity(a, b),
            _ => return None,
        };
        Some(score)
    }
}

/// Everything computed for one image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FingerprintSet {
    pub grayscale: Option<BitHash>,
    pub color: Option<BitHash>,
    pub multi_scale: Option<BitHash>,
    pub content: Option<ContentHash>,
    pub exif: Option<ExifRecord>,
    pub features: Option<FeatureSet>,
    pub embedding: Option<EmbeddingVector>,
}

impl FingerprintSet {
    /// The fingerprint of `kind`, if computed
    pub fn get(&self, kind: FingerprintKind) -> Option<Fingerprint<'_>> {
        match kind {
            FingerprintKind::Grayscale => self.grayscale.as_ref().map(Fingerprint::Grayscale),
            FingerprintKind::Color => self.color.as_ref().map(Fingerprint::Color),
            FingerprintKind::MultiScale => self.multi_scale.as_ref().map(Fingerprint::MultiScale),
            FingerprintKind::Content => self.content.as_ref().map(Fingerprint::Content),
            FingerprintKind::Exif => self.exif.as_ref().map(Fingerprint::Exif),
            FingerprintKind::Features => self.features.as_ref().map(Fingerprint::Features),
            FingerprintKind::Embedding => self.embedding.as_ref().map(Fingerprint::Embedding),
        }
    }

    pub fn has(&self, kind: FingerprintKind) -> bool {
        self.get(kind).is_some()
    }

    /// Kinds present, in fusion order
    pub fn kinds(&self) -> Vec<FingerprintKind> {
        FingerprintKind::ALL.into_iter().filter(|k| self.has(*k)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds().is_empty()
    }

    /// Similarity of one kind between two sets; `None` unless both carry it
    pub fn similarity(&self, other: &FingerprintSet, kind: FingerprintKind) -> Option<f64> {
        let (a, b) = (self.get(kind)?, other.get(kind)?);
        a.similarity(&b)
    }
}
