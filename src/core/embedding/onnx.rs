//! ONNX Runtime embedding backend.

use super::{preprocess, EmbeddingBackend, INPUT_SIZE};
use crate::error::ExtractionError;
use image::DynamicImage;
use ort::tensor::InputTensor;
use ort::{Environment, Session, SessionBuilder};
use std::path::{Path, PathBuf};

/// Embedding model loaded from an `.onnx` file
pub struct OnnxEmbedding {
    session: Session,
    model: String,
}

impl OnnxEmbedding {
    /// Load a model; the file stem becomes the model identifier
    pub fn load(path: &Path) -> Result<Self, ExtractionError> {
        let unavailable = |reason: String| ExtractionError::BackendUnavailable {
            kind: "embedding".to_string(),
            reason,
        };

        let environment = Environment::builder()
            .with_name("image-sorter")
            .build()
            .map_err(|e| unavailable(e.to_string()))?
            .into_arc();
        let session = SessionBuilder::new(&environment)
            .and_then(|builder| builder.with_model_from_file(path))
            .map_err(|e| unavailable(format!("{}: {}", path.display(), e)))?;

        let model = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "onnx".to_string());

        tracing::info!("Loaded embedding model {} from {}", model, path.display());
        Ok(Self { session, model })
    }
}

impl EmbeddingBackend for OnnxEmbedding {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn embed(&self, image: &DynamicImage) -> Result<Vec<f32>, ExtractionError> {
        let failed = |reason: String| ExtractionError::InferenceFailed {
            path: PathBuf::new(),
            reason,
        };

        let side = INPUT_SIZE as usize;
        let input = ndarray::Array4::from_shape_vec((1, 3, side, side), preprocess(image)?)
            .map_err(|e| failed(e.to_string()))?
            .into_dyn();

        let outputs = self
            .session
            .run(&[InputTensor::FloatTensor(input)])
            .map_err(|e| failed(e.to_string()))?;
        let first = outputs
            .first()
            .ok_or_else(|| failed("model produced no outputs".to_string()))?;
        let tensor = first.try_extract::<f32>().map_err(|e| failed(e.to_string()))?;
        let values = tensor.view().iter().copied().collect();

        Ok(values)
    }
}
