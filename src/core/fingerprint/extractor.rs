//! Computes the fingerprints a detection method needs for one image.

use super::{FingerprintKind, FingerprintSet};
use crate::core::capability::Capability;
use crate::core::embedding::{EmbeddingBackend, EmbeddingVector};
use crate::core::features::{FeatureBackend, FeatureSet, DEFAULT_MAX_FEATURES};
use crate::core::hasher::fast_decode::FastDecoder;
use crate::core::hasher::fast_resize::FastResizer;
use crate::core::hasher::{ContentHasher, HashAlgorithm, HashSettings};
use crate::core::metadata::extract_exif_from_bytes;
use crate::error::ExtractionError;
use image::DynamicImage;
use std::fs;
use std::path::Path;

/// Fingerprints for one image plus the kinds that failed
#[derive(Debug, Default)]
pub struct Extraction {
    pub fingerprints: FingerprintSet,
    pub failures: Vec<(FingerprintKind, ExtractionError)>,
}

/// Fingerprint extractor shared across worker threads
#[derive(Clone)]
pub struct Extractor {
    hashes: HashSettings,
    content: ContentHasher,
    max_features: usize,
    features: Capability<dyn FeatureBackend>,
    embedding: Capability<dyn EmbeddingBackend>,
}

impl Extractor {
    pub fn new(
        hashes: HashSettings,
        content: ContentHasher,
        features: Capability<dyn FeatureBackend>,
        embedding: Capability<dyn EmbeddingBackend>,
    ) -> Self {
        Self {
            hashes,
            content,
            max_features: DEFAULT_MAX_FEATURES,
            features,
            embedding,
        }
    }

    /// Cap on keypoints per image
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Whether the backend behind `kind` is usable
    pub fn supports(&self, kind: FingerprintKind) -> bool {
        match kind {
            FingerprintKind::Features => self.features.is_available(),
            FingerprintKind::Embedding => self.embedding.is_available(),
            _ => true,
        }
    }

    /// Compute the requested kinds for one file.
    ///
    /// The file is read once. Kinds whose backend is unavailable are skipped
    /// silently. A failure in one kind does not stop the others; an error is
    /// returned only when the file cannot be read at all.
    pub fn extract(&self, path: &Path, kinds: &[FingerprintKind]) -> Result<Extraction, ExtractionError> {
        let mut extraction = Extraction::default();

        // Exact-duplicate runs never need the whole file in memory.
        if kinds == [FingerprintKind::Content] {
            extraction.fingerprints.content = Some(self.content.hash_file(path)?);
            return Ok(extraction);
        }

        let bytes = fs::read(path).map_err(|e| ExtractionError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let needs_pixels = kinds.iter().any(|k| k.needs_pixels() && self.supports(*k));
        let image = if needs_pixels {
            match FastDecoder::decode_bytes(path, &bytes) {
                Ok(image) => Some(image),
                Err(e) => {
                    for kind in kinds.iter().filter(|k| k.needs_pixels() && self.supports(**k)) {
                        extraction.failures.push((*kind, clone_error(&e, path)));
                    }
                    None
                }
            }
        } else {
            None
        };

        let mut resizer = FastResizer::new();
        let set = &mut extraction.fingerprints;
        for &kind in kinds {
            if !self.supports(kind) {
                continue;
            }
            let outcome = match (kind, image.as_ref()) {
                (FingerprintKind::Content, _) => {
                    set.content = Some(self.content.hash_bytes(&bytes));
                    Ok(())
                }
                (FingerprintKind::Exif, _) => {
                    set.exif = extract_exif_from_bytes(&bytes);
                    Ok(())
                }
                (_, None) => continue,
                (FingerprintKind::Grayscale, Some(image)) => self
                    .hashes
                    .grayscale_hasher()
                    .hash_image(image, &mut resizer)
                    .map(|hash| set.grayscale = Some(hash)),
                (FingerprintKind::Color, Some(image)) => self
                    .hashes
                    .color_hasher()
                    .hash_image(image, &mut resizer)
                    .map(|hash| set.color = Some(hash)),
                (FingerprintKind::MultiScale, Some(image)) => self
                    .hashes
                    .multi_scale_hasher()
                    .hash_image(image, &mut resizer)
                    .map(|hash| set.multi_scale = Some(hash)),
                (FingerprintKind::Features, Some(image)) => self
                    .detect_features(image)
                    .map(|features| set.features = features),
                (FingerprintKind::Embedding, Some(image)) => self
                    .embed(image)
                    .map(|embedding| set.embedding = embedding),
            };
            if let Err(e) = outcome {
                extraction.failures.push((kind, e.with_path(path)));
            }
        }

        Ok(extraction)
    }

    fn detect_features(&self, image: &DynamicImage) -> Result<Option<FeatureSet>, ExtractionError> {
        match self.features.backend() {
            Some(backend) => backend.detect(image, self.max_features).map(Some),
            None => Ok(None),
        }
    }

    fn embed(&self, image: &DynamicImage) -> Result<Option<EmbeddingVector>, ExtractionError> {
        match self.embedding.backend() {
            Some(backend) => Ok(Some(EmbeddingVector {
                model: backend.model_name().to_string(),
                values: backend.embed(image)?,
            })),
            None => Ok(None),
        }
    }
}

/// Decode failures are shared by every pixel kind of the same image
fn clone_error(error: &ExtractionError, path: &Path) -> ExtractionError {
    match error {
        ExtractionError::DecodeError { path, reason } => ExtractionError::DecodeError {
            path: path.clone(),
            reason: reason.clone(),
        },
        ExtractionError::EmptyImage { path } => ExtractionError::EmptyImage { path: path.clone() },
        other => ExtractionError::DecodeError {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}
