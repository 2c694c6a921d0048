//! Fast SIMD-accelerated image resizing.
//!
//! Uses the fast_image_resize crate with a Lanczos3 convolution, a smooth
//! filter that keeps small hash grids stable against scaling noise.

use crate::error::ExtractionError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage, ImageBuffer, RgbImage};

/// Fast image resizer using SIMD acceleration
pub struct FastResizer {
    resizer: Resizer,
    options: ResizeOptions,
}

impl FastResizer {
    /// Create a new fast resizer
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3)),
        }
    }

    /// Convert to grayscale, then resize to `width` x `height`.
    pub fn resize_to_grayscale(
        &mut self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, ExtractionError> {
        let gray = image.to_luma8();
        let (src_width, src_height) = gray.dimensions();
        let pixels = self.resize_raw(gray.into_raw(), src_width, src_height, width, height, PixelType::U8)?;

        ImageBuffer::from_raw(width, height, pixels)
            .ok_or_else(|| ExtractionError::ResizeFailed("Failed to create result buffer".to_string()))
    }

    /// Convert to RGB, then resize to `width` x `height`.
    pub fn resize_to_rgb(
        &mut self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, ExtractionError> {
        let rgb = image.to_rgb8();
        let (src_width, src_height) = rgb.dimensions();
        let pixels = self.resize_raw(rgb.into_raw(), src_width, src_height, width, height, PixelType::U8x3)?;

        ImageBuffer::from_raw(width, height, pixels)
            .ok_or_else(|| ExtractionError::ResizeFailed("Failed to create result buffer".to_string()))
    }

    fn resize_raw(
        &mut self,
        pixels: Vec<u8>,
        src_width: u32,
        src_height: u32,
        width: u32,
        height: u32,
        pixel_type: PixelType,
    ) -> Result<Vec<u8>, ExtractionError> {
        if src_width == 0 || src_height == 0 {
            return Err(ExtractionError::ResizeFailed(
                "Invalid source dimensions".to_string(),
            ));
        }
        if width == 0 || height == 0 {
            return Err(ExtractionError::ResizeFailed(
                "Invalid destination dimensions".to_string(),
            ));
        }

        let src_image = Image::from_vec_u8(src_width, src_height, pixels, pixel_type)
            .map_err(|e| ExtractionError::ResizeFailed(format!("Failed to create source image: {}", e)))?;
        let mut dst_image = Image::new(width, height, pixel_type);

        self.resizer
            .resize(&src_image, &mut dst_image, &self.options)
            .map_err(|e| ExtractionError::ResizeFailed(format!("Resize failed: {}", e)))?;

        Ok(dst_image.into_vec())
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            Rgb([r, g, 128])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn grayscale_resize_produces_requested_dimensions() {
        let mut resizer = FastResizer::new();
        let resized = resizer
            .resize_to_grayscale(&create_test_image(100, 60), 8, 8)
            .unwrap();

        assert_eq!(resized.dimensions(), (8, 8));
    }

    #[test]
    fn rgb_resize_keeps_three_channels() {
        let mut resizer = FastResizer::new();
        let resized = resizer.resize_to_rgb(&create_test_image(64, 64), 8, 8).unwrap();

        assert_eq!(resized.dimensions(), (8, 8));
        assert_eq!(resized.into_raw().len(), 8 * 8 * 3);
    }

    #[test]
    fn upscaling_tiny_images_works() {
        let mut resizer = FastResizer::new();
        let resized = resizer
            .resize_to_grayscale(&create_test_image(3, 3), 32, 32)
            .unwrap();

        assert_eq!(resized.dimensions(), (32, 32));
    }

    #[test]
    fn zero_destination_is_rejected() {
        let mut resizer = FastResizer::new();
        let result = resizer.resize_to_grayscale(&create_test_image(10, 10), 0, 8);
        assert!(matches!(result, Err(ExtractionError::ResizeFailed(_))));
    }
}
