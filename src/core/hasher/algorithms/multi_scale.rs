//! Multi-scale hash: grayscale average hashes at several grid sizes,
//! concatenated in the configured order.

use super::super::fast_resize::FastResizer;
use super::super::traits::{BitHash, HashAlgorithm, HashAlgorithmKind};
use super::GrayscaleHasher;
use crate::error::ExtractionError;
use image::DynamicImage;

/// Multi-scale hash of Σ size² bits
#[derive(Debug, Clone)]
pub struct MultiScaleHasher {
    scales: Vec<GrayscaleHasher>,
}

impl MultiScaleHasher {
    pub fn new(sizes: &[u32]) -> Self {
        Self {
            scales: sizes.iter().copied().map(GrayscaleHasher::new).collect(),
        }
    }
}

impl HashAlgorithm for MultiScaleHasher {
    fn hash_image(&self, image: &DynamicImage, resizer: &mut FastResizer) -> Result<BitHash, ExtractionError> {
        let parts = self
            .scales
            .iter()
            .map(|scale| scale.hash_image(image, resizer))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BitHash::concat(&parts))
    }

    fn bit_len(&self) -> u32 {
        self.scales.iter().map(|s| s.bit_len()).sum()
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::MultiScale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn gradient() -> DynamicImage {
        DynamicImage::ImageLuma8(ImageBuffer::from_fn(96, 96, |x, y| Luma([((x + y) * 255 / 190) as u8])))
    }

    #[test]
    fn length_is_sum_of_squares() {
        let hasher = MultiScaleHasher::new(&[8, 16, 32]);
        let hash = hasher.hash_image(&gradient(), &mut FastResizer::new()).unwrap();

        assert_eq!(hash.len(), 64 + 256 + 1024);
        assert_eq!(hasher.bit_len(), 1344);
    }

    #[test]
    fn leading_bits_match_smallest_scale() {
        let image = gradient();
        let multi = MultiScaleHasher::new(&[8, 16])
            .hash_image(&image, &mut FastResizer::new())
            .unwrap();
        let single = GrayscaleHasher::new(8)
            .hash_image(&image, &mut FastResizer::new())
            .unwrap();

        assert!((0..64).all(|i| multi.bit(i) == single.bit(i)));
    }
}
