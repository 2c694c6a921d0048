//! # Embedding Module
//!
//! Learned image embeddings and cosine similarity between them.
//!
//! Inference runs through an [`EmbeddingBackend`]. The `onnx` cargo feature
//! adds [`OnnxEmbedding`], which loads a model file through ONNX Runtime.
//! Without a backend the embedding method is reported as unavailable.

#[cfg(feature = "onnx")]
mod onnx;

#[cfg(feature = "onnx")]
pub use onnx::OnnxEmbedding;

use crate::core::hasher::fast_resize::FastResizer;
use crate::error::ExtractionError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Side length of the model input
pub const INPUT_SIZE: u32 = 224;

/// A model's output for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector {
    /// Identifier of the model that produced the values
    pub model: String,
    pub values: Vec<f32>,
}

/// Image embedding model
pub trait EmbeddingBackend: Send + Sync {
    /// Identifier stored alongside every vector
    fn model_name(&self) -> &str;

    /// Run the model on one image and flatten its pooled output
    fn embed(&self, image: &DynamicImage) -> Result<Vec<f32>, ExtractionError>;
}

/// Resize to 224x224 and lay out as a 1x3xHxW tensor scaled to [-1, 1]
pub fn preprocess(image: &DynamicImage) -> Result<Vec<f32>, ExtractionError> {
    let rgb = FastResizer::new().resize_to_rgb(image, INPUT_SIZE, INPUT_SIZE)?;
    let plane = (INPUT_SIZE * INPUT_SIZE) as usize;

    let mut out = vec![0.0f32; plane * 3];
    for (index, pixel) in rgb.pixels().enumerate() {
        for channel in 0..3 {
            out[channel * plane + index] = pixel[channel] as f32 / 127.5 - 1.0;
        }
    }
    Ok(out)
}

/// Cosine similarity clamped to [0, 1].
///
/// Vectors from different models, of different lengths, or with zero norm
/// score 0.0.
pub fn embedding_similarity(a: &EmbeddingVector, b: &EmbeddingVector) -> f64 {
    if a.model != b.model || a.values.len() != b.values.len() || a.values.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.values.iter().zip(b.values.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn vector(model: &str, values: &[f32]) -> EmbeddingVector {
        EmbeddingVector {
            model: model.to_string(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn self_similarity_is_one() {
        let a = vector("m", &[0.3, -1.2, 4.0]);
        assert!((embedding_similarity(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let a = vector("m", &[1.0, 0.0]);
        let b = vector("m", &[0.0, 1.0]);
        assert_eq!(embedding_similarity(&a, &b), 0.0);
    }

    #[test]
    fn opposite_vectors_clamp_to_zero() {
        let a = vector("m", &[1.0, 2.0]);
        let b = vector("m", &[-1.0, -2.0]);
        assert_eq!(embedding_similarity(&a, &b), 0.0);
    }

    #[test]
    fn different_models_never_compare() {
        let a = vector("resnet", &[1.0, 2.0]);
        let b = vector("mobilenet", &[1.0, 2.0]);
        assert_eq!(embedding_similarity(&a, &b), 0.0);
    }

    #[test]
    fn zero_vector_scores_zero() {
        let a = vector("m", &[0.0, 0.0]);
        let b = vector("m", &[1.0, 1.0]);
        assert_eq!(embedding_similarity(&a, &b), 0.0);
    }

    #[test]
    fn preprocess_is_planar_and_scaled() {
        let white = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(50, 30, Rgb([255, 0, 255])));
        let tensor = preprocess(&white).unwrap();
        let plane = (INPUT_SIZE * INPUT_SIZE) as usize;

        assert_eq!(tensor.len(), plane * 3);
        assert!((tensor[0] - 1.0).abs() < 1e-3);
        assert!((tensor[plane] + 1.0).abs() < 1e-3);
        assert!((tensor[2 * plane + 7] - 1.0).abs() < 1e-3);
    }
}
