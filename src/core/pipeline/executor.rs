//! Analysis run implementation.

use super::config::AnalysisConfig;
use crate::core::capability::Capability;
use crate::core::comparator::{DetectionMethod, GroupingRule, SeedGrouper};
use crate::core::embedding::EmbeddingBackend;
use crate::core::features::{FastBriefBackend, FeatureBackend};
use crate::core::fingerprint::{Extractor, FingerprintKind, FingerprintSet};
use crate::core::hasher::ContentHasher;
use crate::core::scanner::{ImageFile, ImageScanner, WalkDirScanner};
use crate::error::{ImageSorterError, ScanError};
use crate::events::{
    null_sender, Event, EventSender, ExtractEvent, ExtractProgress, PipelineEvent, PipelinePhase,
    PipelineSummary,
};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Images that matched the same seed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGroup {
    pub id: Uuid,
    /// Members in enumeration order, seed first
    pub images: Vec<ImageFile>,
}

impl ImageGroup {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Total size of the group's files
    pub fn total_bytes(&self) -> u64 {
        self.images.iter().map(|i| i.size).sum()
    }
}

/// An image left out of grouping, with the reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludedImage {
    pub path: PathBuf,
    pub reason: String,
}

/// An optional backend that could not be used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityNotice {
    pub kind: FingerprintKind,
    pub reason: String,
}

/// Outcome of one analysis run.
///
/// Every listed image lands in exactly one of `groups`, `ungrouped` or
/// `excluded`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub source: PathBuf,
    pub method: DetectionMethod,
    pub similarity: f64,
    pub rule: GroupingRule,
    pub min_group_size: usize,
    /// Groups meeting the minimum size
    pub groups: Vec<ImageGroup>,
    /// Fingerprinted images that ended up in no kept group
    pub ungrouped: Vec<PathBuf>,
    /// Images that could not be fingerprinted for this method
    pub excluded: Vec<ExcludedImage>,
    /// Folder entries that could not be read
    pub scan_errors: Vec<String>,
    pub unavailable: Vec<CapabilityNotice>,
    pub total_images: usize,
    pub analyzed_images: usize,
    pub comparisons: usize,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl AnalysisResult {
    /// Images across all kept groups
    pub fn grouped_images(&self) -> usize {
        self.groups.iter().map(|g| g.len()).sum()
    }

    pub fn has_groups(&self) -> bool {
        !self.groups.is_empty()
    }

    fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            total_images: self.total_images,
            analyzed_images: self.analyzed_images,
            groups: self.groups.len(),
            grouped_images: self.grouped_images(),
            duration_ms: self.duration_ms,
        }
    }
}

/// Builder for [`Analyzer`]
pub struct AnalyzerBuilder {
    config: AnalysisConfig,
    features: Option<Capability<dyn FeatureBackend>>,
    embedding: Option<Arc<dyn EmbeddingBackend>>,
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self {
            config: AnalysisConfig::default(),
            features: None,
            embedding: None,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn method(mut self, method: DetectionMethod) -> Self {
        self.config.method = method;
        self
    }

    /// Set the user similarity in [0.5, 1.0]
    pub fn similarity(mut self, similarity: f64) -> Self {
        self.config.similarity = similarity;
        self
    }

    pub fn min_group_size(mut self, size: usize) -> Self {
        self.config.min_group_size = size;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.config.recursive = recursive;
        self
    }

    /// Use a specific keypoint backend
    pub fn feature_backend(mut self, backend: Arc<dyn FeatureBackend>) -> Self {
        self.features = Some(Capability::Available(backend));
        self
    }

    /// Run as if no keypoint backend were installed
    pub fn without_features(mut self, reason: impl Into<String>) -> Self {
        self.features = Some(Capability::unavailable(reason));
        self
    }

    /// Use a specific embedding backend instead of loading a model file
    pub fn embedding_backend(mut self, backend: Arc<dyn EmbeddingBackend>) -> Self {
        self.embedding = Some(backend);
        self
    }

    /// Validate the configuration and resolve optional backends
    pub fn build(self) -> Result<Analyzer, ImageSorterError> {
        self.config.validate().map_err(ImageSorterError::Config)?;

        let features = self
            .features
            .unwrap_or_else(|| Capability::Available(Arc::new(FastBriefBackend::new())));
        let embedding = match self.embedding {
            Some(backend) => Capability::Available(backend),
            None => resolve_embedding(&self.config),
        };

        let mut unavailable = Vec::new();
        let needed = self.config.method.required_kinds(&self.config.weights);
        for (kind, capability) in [
            (FingerprintKind::Features, features.reason()),
            (FingerprintKind::Embedding, embedding.reason()),
        ] {
            if let (true, Some(reason)) = (needed.contains(&kind), capability) {
                tracing::warn!("{} backend unavailable: {}", kind, reason);
                unavailable.push(CapabilityNotice {
                    kind,
                    reason: reason.to_string(),
                });
            }
        }

        if let (true, Some(backend)) = (needed.contains(&FingerprintKind::Features), features.backend()) {
            tracing::info!("Keypoint backend: {}", backend.name());
        }

        let extractor = Extractor::new(
            self.config.hashes.clone(),
            ContentHasher::new(self.config.digest),
            features,
            embedding,
        )
        .with_max_features(self.config.max_features);

        Ok(Analyzer {
            config: self.config,
            extractor,
            unavailable,
        })
    }
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "onnx")]
fn resolve_embedding(config: &AnalysisConfig) -> Capability<dyn EmbeddingBackend> {
    match &config.embedding_model {
        Some(path) => match crate::core::embedding::OnnxEmbedding::load(path) {
            Ok(backend) => Capability::Available(Arc::new(backend)),
            Err(e) => Capability::unavailable(e.to_string()),
        },
        None => Capability::unavailable("no embedding model configured"),
    }
}

#[cfg(not(feature = "onnx"))]
fn resolve_embedding(config: &AnalysisConfig) -> Capability<dyn EmbeddingBackend> {
    match &config.embedding_model {
        Some(_) => Capability::unavailable("built without the onnx feature"),
        None => Capability::unavailable("no embedding model configured"),
    }
}

/// An image and whatever fingerprints it produced
struct Analyzed {
    image: ImageFile,
    fingerprints: FingerprintSet,
}

/// Finds groups of similar images in a folder
pub struct Analyzer {
    config: AnalysisConfig,
    extractor: Extractor,
    unavailable: Vec<CapabilityNotice>,
}

impl Analyzer {
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Backends the configured method wanted but could not get
    pub fn unavailable(&self) -> &[CapabilityNotice] {
        &self.unavailable
    }

    /// Analyze a folder without events
    pub fn run(&self, folder: &Path) -> Result<AnalysisResult, ImageSorterError> {
        self.run_with_events(folder, &null_sender())
    }

    /// Analyze a folder with event reporting
    pub fn run_with_events(&self, folder: &Path, events: &EventSender) -> Result<AnalysisResult, ImageSorterError> {
        let start_time = Instant::now();
        let method = self.config.method;

        events.send(Event::Pipeline(PipelineEvent::Started));
        for notice in &self.unavailable {
            events.send(Event::Pipeline(PipelineEvent::CapabilityUnavailable {
                kind: notice.kind.to_string(),
                reason: notice.reason.clone(),
            }));
        }

        // Phase 1: Scanning
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Scanning,
        }));
        if !folder.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: folder.to_path_buf(),
            }
            .into());
        }

        let scanner = WalkDirScanner::new(self.config.scan_config());
        let scan_result = scanner.scan_with_events(&[folder.to_path_buf()], events)?;
        let scan_errors = scan_result.errors.iter().map(|e| e.to_string()).collect();
        let images = scan_result.images;
        tracing::info!("Found {} images in {}", images.len(), folder.display());

        let mut result = AnalysisResult {
            source: folder.to_path_buf(),
            method,
            similarity: self.config.similarity,
            rule: method.rule(self.config.similarity, &self.config.hashes),
            min_group_size: self.config.min_group_size,
            groups: Vec::new(),
            ungrouped: Vec::new(),
            excluded: Vec::new(),
            scan_errors,
            unavailable: self.unavailable.clone(),
            total_images: images.len(),
            analyzed_images: 0,
            comparisons: 0,
            started_at: Utc::now(),
            duration_ms: 0,
        };

        if images.is_empty() {
            return Ok(self.finish(result, start_time, events));
        }

        // Phase 2: Extracting
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Extracting,
        }));
        tracing::info!("Extracting {} fingerprints for {} images", method, images.len());

        let (analyzed, excluded) = self.extract_all(images, events);
        result.analyzed_images = analyzed.len();
        result.excluded = excluded;

        // Phase 3: Comparing
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Comparing,
        }));
        let strategy = method.strategy(self.config.similarity, &self.config.hashes, &self.config.weights);
        tracing::info!("Grouping {} images: {}", analyzed.len(), strategy.description());

        let outcome = SeedGrouper::new(self.config.min_group_size).group_with_events(
            &analyzed,
            |seed, candidate| strategy.is_match(&seed.fingerprints, &candidate.fingerprints),
            events,
        );

        result.comparisons = outcome.comparisons;
        result.ungrouped = outcome
            .dropped
            .iter()
            .map(|&index| analyzed[index].image.path.clone())
            .collect();
        result.groups = outcome
            .groups
            .into_iter()
            .map(|group| ImageGroup {
                id: group.id,
                images: group
                    .members
                    .iter()
                    .map(|&index| analyzed[index].image.clone())
                    .collect(),
            })
            .collect();

        Ok(self.finish(result, start_time, events))
    }

    fn finish(&self, mut result: AnalysisResult, start_time: Instant, events: &EventSender) -> AnalysisResult {
        result.duration_ms = start_time.elapsed().as_millis() as u64;
        tracing::info!(
            "Analysis complete: {} groups, {} grouped images, {} excluded",
            result.groups.len(),
            result.grouped_images(),
            result.excluded.len()
        );
        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: result.summary(),
        }));
        result
    }

    /// Fingerprint every image in parallel, keeping enumeration order
    fn extract_all(&self, images: Vec<ImageFile>, events: &EventSender) -> (Vec<Analyzed>, Vec<ExcludedImage>) {
        let total = images.len();
        let method = self.config.method;
        let kinds = method.required_kinds(&self.config.weights);

        events.send(Event::Extract(ExtractEvent::Started { total_images: total }));

        // A method whose only backend is missing cannot fingerprint anything.
        if let Some(notice) = method
            .primary_kind()
            .and_then(|kind| self.unavailable.iter().find(|n| n.kind == kind))
        {
            let reason = format!("{} backend unavailable: {}", notice.kind, notice.reason);
            let excluded: Vec<ExcludedImage> = images
                .into_iter()
                .map(|image| ExcludedImage {
                    path: image.path,
                    reason: reason.clone(),
                })
                .collect();
            events.send(Event::Extract(ExtractEvent::Completed {
                extracted: 0,
                failed: excluded.len(),
            }));
            return (Vec::new(), excluded);
        }

        let completed = AtomicUsize::new(0);
        let outcomes: Vec<Result<Analyzed, ExcludedImage>> = images
            .into_par_iter()
            .map(|image| {
                let outcome = self.extract_one(image, &kinds);
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                let current_path = match &outcome {
                    Ok(analyzed) => analyzed.image.path.clone(),
                    Err(excluded) => {
                        events.send(Event::Extract(ExtractEvent::Failed {
                            path: excluded.path.clone(),
                            message: excluded.reason.clone(),
                        }));
                        excluded.path.clone()
                    }
                };
                events.send(Event::Extract(ExtractEvent::Progress(ExtractProgress {
                    completed: done,
                    total,
                    current_path,
                })));
                outcome
            })
            .collect();

        let mut analyzed = Vec::with_capacity(total);
        let mut excluded = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(item) => analyzed.push(item),
                Err(item) => excluded.push(item),
            }
        }

        events.send(Event::Extract(ExtractEvent::Completed {
            extracted: analyzed.len(),
            failed: excluded.len(),
        }));
        (analyzed, excluded)
    }

    fn extract_one(&self, image: ImageFile, kinds: &[FingerprintKind]) -> Result<Analyzed, ExcludedImage> {
        let extraction = match self.extractor.extract(&image.path, kinds) {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::debug!("Excluding {}: {}", image.path.display(), e);
                return Err(ExcludedImage {
                    path: image.path,
                    reason: e.to_string(),
                });
            }
        };

        for (kind, error) in &extraction.failures {
            tracing::debug!("No {} fingerprint for {}: {}", kind, image.path.display(), error);
        }

        let usable = match self.config.method.primary_kind() {
            Some(kind) => extraction.fingerprints.has(kind),
            None => !extraction.fingerprints.is_empty(),
        };
        if usable {
            return Ok(Analyzed {
                image,
                fingerprints: extraction.fingerprints,
            });
        }

        let reason = extraction
            .failures
            .first()
            .map(|(_, error)| error.to_string())
            .unwrap_or_else(|| "no usable fingerprint".to_string());
        Err(ExcludedImage {
            path: image.path,
            reason,
        })
    }
}
