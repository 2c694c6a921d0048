//! Per-channel color hash.
//!
//! The image is resized in RGB and each channel is thresholded against its
//! own mean. The three grids are emitted R, G, B.

use super::super::fast_resize::FastResizer;
use super::super::traits::{mean_threshold_bits, BitHash, HashAlgorithm, HashAlgorithmKind};
use crate::error::ExtractionError;
use image::DynamicImage;

/// Color hash of 3 x `hash_size`² bits
#[derive(Debug, Clone, Copy)]
pub struct ColorHasher {
    hash_size: u32,
}

impl ColorHasher {
    pub fn new(hash_size: u32) -> Self {
        Self { hash_size }
    }
}

impl HashAlgorithm for ColorHasher {
    fn hash_image(&self, image: &DynamicImage, resizer: &mut FastResizer) -> Result<BitHash, ExtractionError> {
        let rgb = resizer.resize_to_rgb(image, self.hash_size, self.hash_size)?;

        let channels: Vec<BitHash> = (0..3)
            .map(|channel| {
                let samples: Vec<u8> = rgb.pixels().map(|p| p[channel]).collect();
                BitHash::from_bits(mean_threshold_bits(&samples))
            })
            .collect();

        Ok(BitHash::concat(&channels))
    }

    fn bit_len(&self) -> u32 {
        3 * self.hash_size * self.hash_size
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    /// Left half red, right half blue
    fn split_image() -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(64, 64, |x, _| {
            if x < 32 {
                Rgb([250, 0, 0])
            } else {
                Rgb([0, 0, 250])
            }
        }))
    }

    #[test]
    fn hash_length_is_three_grids() {
        let hasher = ColorHasher::new(8);
        let hash = hasher.hash_image(&split_image(), &mut FastResizer::new()).unwrap();
        assert_eq!(hash.len(), 192);
        assert_eq!(hasher.bit_len(), 192);
    }

    #[test]
    fn channels_are_thresholded_independently() {
        let hash = ColorHasher::new(8)
            .hash_image(&split_image(), &mut FastResizer::new())
            .unwrap();

        // Red grid: left column set. Green grid: flat. Blue grid: right column set.
        assert!(hash.bit(0));
        assert!(!hash.bit(7));
        assert!((64..128).all(|i| !hash.bit(i)));
        assert!(!hash.bit(128));
        assert!(hash.bit(128 + 7));
    }

    #[test]
    fn grayscale_twins_differ_in_color() {
        // Same luma layout, different hue: the color hash tells them apart.
        let red_left = split_image();
        let blue_left = DynamicImage::ImageRgb8(ImageBuffer::from_fn(64, 64, |x, _| {
            if x < 32 {
                Rgb([0, 0, 250])
            } else {
                Rgb([250, 0, 0])
            }
        }));

        let hasher = ColorHasher::new(8);
        let a = hasher.hash_image(&red_left, &mut FastResizer::new()).unwrap();
        let b = hasher.hash_image(&blue_left, &mut FastResizer::new()).unwrap();

        assert!(a.distance(&b).unwrap() > 0);
    }
}
