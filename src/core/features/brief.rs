//! FAST-9 corners with BRIEF-style binary descriptors.

use super::{Descriptor, FeatureBackend, FeatureSet, Keypoint, DESCRIPTOR_BYTES};
use crate::core::hasher::fast_resize::FastResizer;
use crate::error::ExtractionError;
use image::{DynamicImage, GrayImage};
use imageproc::corners::corners_fast9;
use imageproc::filter::gaussian_blur_f32;

/// Half-width of the sampling patch
const PATCH_RADIUS: i32 = 15;

/// Larger inputs are downscaled before detection
const MAX_DETECTION_SIDE: u32 = 1024;

const DEFAULT_FAST_THRESHOLD: u8 = 20;
const BLUR_SIGMA: f32 = 2.0;

/// Keypoint backend built on imageproc
#[derive(Debug, Clone)]
pub struct FastBriefBackend {
    threshold: u8,
    pattern: Vec<[i32; 4]>,
}

impl FastBriefBackend {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_FAST_THRESHOLD)
    }

    /// Intensity difference a FAST arc must exceed
    pub fn with_threshold(threshold: u8) -> Self {
        Self {
            threshold,
            pattern: sampling_pattern(),
        }
    }

    fn describe(&self, smoothed: &GrayImage, x: u32, y: u32) -> Descriptor {
        let sample = |dx: i32, dy: i32| {
            let px = (x as i32 + dx) as u32;
            let py = (y as i32 + dy) as u32;
            smoothed.get_pixel(px, py)[0]
        };

        let mut descriptor = [0u8; DESCRIPTOR_BYTES];
        for (bit, [x1, y1, x2, y2]) in self.pattern.iter().enumerate() {
            if sample(*x1, *y1) < sample(*x2, *y2) {
                descriptor[bit / 8] |= 1 << (7 - bit % 8);
            }
        }
        descriptor
    }
}

impl Default for FastBriefBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureBackend for FastBriefBackend {
    fn name(&self) -> &str {
        "fast-brief"
    }

    fn detect(&self, image: &DynamicImage, max_features: usize) -> Result<FeatureSet, ExtractionError> {
        let gray = detection_image(image)?;
        let (width, height) = gray.dimensions();
        let margin = PATCH_RADIUS as u32;

        let mut corners: Vec<_> = corners_fast9(&gray, self.threshold)
            .into_iter()
            .filter(|c| c.x >= margin && c.y >= margin && c.x + margin < width && c.y + margin < height)
            .collect();
        corners.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.y.cmp(&b.y))
                .then(a.x.cmp(&b.x))
        });
        corners.truncate(max_features);

        if corners.is_empty() {
            return Ok(FeatureSet::default());
        }

        let smoothed = gaussian_blur_f32(&gray, BLUR_SIGMA);
        let descriptors = corners.iter().map(|c| self.describe(&smoothed, c.x, c.y)).collect();
        let keypoints = corners
            .iter()
            .map(|c| Keypoint {
                x: c.x,
                y: c.y,
                score: c.score,
            })
            .collect();

        Ok(FeatureSet {
            keypoints,
            descriptors,
        })
    }
}

fn detection_image(image: &DynamicImage) -> Result<GrayImage, ExtractionError> {
    let (width, height) = (image.width(), image.height());
    let longest = width.max(height);
    if longest <= MAX_DETECTION_SIDE {
        return Ok(image.to_luma8());
    }

    let scale = MAX_DETECTION_SIDE as f64 / longest as f64;
    let target_w = ((width as f64 * scale).round() as u32).max(1);
    let target_h = ((height as f64 * scale).round() as u32).max(1);
    FastResizer::new().resize_to_grayscale(image, target_w, target_h)
}

/// 256 point pairs inside the patch, fixed across runs
fn sampling_pattern() -> Vec<[i32; 4]> {
    let mut state: u32 = 0x9E37_79B9;
    let mut next = || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (state % (2 * PATCH_RADIUS as u32 + 1)) as i32 - PATCH_RADIUS
    };
    (0..DESCRIPTOR_BYTES * 8)
        .map(|_| [next(), next(), next(), next()])
        .collect()
}
