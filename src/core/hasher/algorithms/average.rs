//! Grayscale average hash.
//!
//! 1. Convert to a single intensity channel
//! 2. Resize to hash_size x hash_size with Lanczos3
//! 3. Compute the arithmetic mean of the samples
//! 4. For each sample in row-major order: 1 if brighter than the mean, else 0

use super::super::fast_resize::FastResizer;
use super::super::traits::{mean_threshold_bits, BitHash, HashAlgorithm, HashAlgorithmKind};
use crate::error::ExtractionError;
use image::DynamicImage;

/// Grayscale average hash of `hash_size`² bits
#[derive(Debug, Clone, Copy)]
pub struct GrayscaleHasher {
    hash_size: u32,
}

impl GrayscaleHasher {
    /// Create a new grayscale hasher
    pub fn new(hash_size: u32) -> Self {
        Self { hash_size }
    }
}

impl HashAlgorithm for GrayscaleHasher {
    fn hash_image(&self, image: &DynamicImage, resizer: &mut FastResizer) -> Result<BitHash, ExtractionError> {
        let gray = resizer.resize_to_grayscale(image, self.hash_size, self.hash_size)?;
        Ok(BitHash::from_bits(mean_threshold_bits(gray.as_raw())))
    }

    fn bit_len(&self) -> u32 {
        self.hash_size * self.hash_size
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Grayscale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb};

    fn create_solid_image(r: u8, g: u8, b: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(100, 100, |_, _| Rgb([r, g, b])))
    }

    fn left_bright_image() -> DynamicImage {
        DynamicImage::ImageLuma8(ImageBuffer::from_fn(64, 64, |x, _| {
            Luma([if x < 32 { 240 } else { 10 }])
        }))
    }

    #[test]
    fn hash_length_is_size_squared() {
        for size in [4, 8, 16] {
            let hasher = GrayscaleHasher::new(size);
            let hash = hasher
                .hash_image(&create_solid_image(10, 20, 30), &mut FastResizer::new())
                .unwrap();
            assert_eq!(hash.len(), size * size);
            assert_eq!(hasher.bit_len(), size * size);
        }
    }

    #[test]
    fn identical_images_produce_identical_hash() {
        let hasher = GrayscaleHasher::new(8);
        let image = left_bright_image();

        let hash1 = hasher.hash_image(&image, &mut FastResizer::new()).unwrap();
        let hash2 = hasher.hash_image(&image, &mut FastResizer::new()).unwrap();

        assert_eq!(hash1.distance(&hash2), Some(0));
    }

    #[test]
    fn solid_image_produces_all_zero_hash() {
        let hasher = GrayscaleHasher::new(8);
        let hash = hasher
            .hash_image(&create_solid_image(128, 128, 128), &mut FastResizer::new())
            .unwrap();

        assert!(hash.as_bytes().iter().all(|&b| b == 0x00));
    }

    #[test]
    fn bright_half_sets_leading_bits_of_each_row() {
        let hasher = GrayscaleHasher::new(8);
        let hash = hasher.hash_image(&left_bright_image(), &mut FastResizer::new()).unwrap();

        for row in 0..8 {
            assert!(hash.bit(row * 8));
            assert!(!hash.bit(row * 8 + 7));
        }
    }

    #[test]
    fn kind_returns_grayscale() {
        assert_eq!(GrayscaleHasher::new(8).kind(), HashAlgorithmKind::Grayscale);
    }
}
