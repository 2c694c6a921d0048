//! Fast image decoding with format-specific optimizations.
//!
//! Uses zune-jpeg for JPEG files (1.5-2x faster than image crate),
//! falls back to image crate for other formats. Decoding works on an
//! in-memory buffer so one file read can feed every extractor.

use crate::error::ExtractionError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Fast image decoder that uses optimized decoders per format
pub struct FastDecoder;

impl FastDecoder {
    /// Decode an image already read into memory.
    ///
    /// `path` is only used for format detection and error context.
    pub fn decode_bytes(path: &Path, bytes: &[u8]) -> Result<DynamicImage, ExtractionError> {
        if bytes.is_empty() {
            return Err(ExtractionError::EmptyImage {
                path: path.to_path_buf(),
            });
        }

        let image = if is_jpeg(path) {
            Self::decode_jpeg(path, bytes).or_else(|_| Self::decode_fallback(path, bytes))?
        } else {
            Self::decode_fallback(path, bytes)?
        };

        if image.width() == 0 || image.height() == 0 {
            return Err(ExtractionError::EmptyImage {
                path: path.to_path_buf(),
            });
        }

        Ok(image)
    }

    fn decode_jpeg(path: &Path, bytes: &[u8]) -> Result<DynamicImage, ExtractionError> {
        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(bytes, options);

        let pixels = decoder.decode().map_err(|e| ExtractionError::DecodeError {
            path: path.to_path_buf(),
            reason: format!("zune-jpeg decode failed: {:?}", e),
        })?;

        let info = decoder.info().ok_or_else(|| ExtractionError::DecodeError {
            path: path.to_path_buf(),
            reason: "Failed to get image info".to_string(),
        })?;

        let width = info.width as u32;
        let height = info.height as u32;
        let buffer_error = |kind: &str| ExtractionError::DecodeError {
            path: path.to_path_buf(),
            reason: format!("Failed to create {} buffer", kind),
        };

        match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
            ColorSpace::RGB => {
                let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| buffer_error("RGB"))?;
                Ok(DynamicImage::ImageRgb8(buffer))
            }
            ColorSpace::RGBA => {
                let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| buffer_error("RGBA"))?;
                Ok(DynamicImage::ImageRgba8(buffer))
            }
            ColorSpace::Luma => {
                let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| buffer_error("Luma"))?;
                Ok(DynamicImage::ImageLuma8(buffer))
            }
            _ => Self::decode_fallback(path, bytes),
        }
    }

    fn decode_fallback(path: &Path, bytes: &[u8]) -> Result<DynamicImage, ExtractionError> {
        image::load_from_memory(bytes).map_err(|e| ExtractionError::DecodeError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

fn is_jpeg(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref(),
        Some("jpg" | "jpeg")
    )
}
