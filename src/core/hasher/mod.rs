//! # Hasher Module
//!
//! Bit-string and content hashes for product images.
//!
//! ## Supported Hashes
//! - **Grayscale** - one bit per pixel of an N x N grayscale downsample
//! - **Color** - one grayscale-style grid per RGB channel
//! - **Multi-scale** - grayscale grids at several sizes, concatenated
//! - **Content** - SHA-256 or BLAKE3 digest of the raw file bytes
//!
//! ## Performance Optimizations
//! - Uses `zune-jpeg` for faster JPEG decoding
//! - Uses `fast_image_resize` for SIMD-accelerated Lanczos3 resizing

mod algorithms;
pub mod content;
pub mod fast_decode;
pub mod fast_resize;
mod traits;

pub use algorithms::{ColorHasher, GrayscaleHasher, MultiScaleHasher};
pub use content::{ContentHash, ContentHasher, DigestAlgorithm};
pub use traits::{BitHash, HashAlgorithm, HashAlgorithmKind};

pub(crate) use traits::mean_threshold_bits;

use serde::{Deserialize, Serialize};

/// Grid sizes for the bit-string hashes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashSettings {
    /// Side length of the grayscale grid
    pub grayscale_size: u32,
    /// Side length of each color channel grid
    pub color_size: u32,
    /// Grid sizes for the multi-scale hash, in order
    pub multi_scale_sizes: Vec<u32>,
    /// Bit count the multi-scale similarity is scaled against.
    ///
    /// Kept at 896 for the default sizes even though the hash itself is
    /// 1344 bits, so thresholds match earlier releases.
    pub multi_scale_threshold_bits: u32,
}

/// Largest accepted grid side length
pub const MAX_HASH_SIZE: u32 = 256;

impl HashSettings {
    /// Bits in a grayscale hash
    pub fn grayscale_bits(&self) -> u32 {
        self.grayscale_size.saturating_mul(self.grayscale_size)
    }

    /// Bits in a color hash
    pub fn color_bits(&self) -> u32 {
        self.color_size.saturating_mul(self.color_size).saturating_mul(3)
    }

    /// Bits in a multi-scale hash
    pub fn multi_scale_bits(&self) -> u32 {
        self.multi_scale_sizes
            .iter()
            .fold(0u32, |bits, s| bits.saturating_add(s.saturating_mul(*s)))
    }

    /// Reject sizes a hash cannot be built from
    pub fn validate(&self) -> Result<(), String> {
        let sizes = [self.grayscale_size, self.color_size];
        if sizes.iter().chain(&self.multi_scale_sizes).any(|s| *s == 0) {
            return Err("hash sizes must be positive".to_string());
        }
        if let Some(size) = sizes.iter().chain(&self.multi_scale_sizes).find(|s| **s > MAX_HASH_SIZE) {
            return Err(format!("hash sizes must be at most {}, got {}", MAX_HASH_SIZE, size));
        }
        if self.multi_scale_sizes.is_empty() {
            return Err("multi-scale hash needs at least one size".to_string());
        }
        if self.multi_scale_threshold_bits == 0 {
            return Err("multi-scale threshold bits must be positive".to_string());
        }
        Ok(())
    }

    pub fn grayscale_hasher(&self) -> GrayscaleHasher {
        GrayscaleHasher::new(self.grayscale_size)
    }

    pub fn color_hasher(&self) -> ColorHasher {
        ColorHasher::new(self.color_size)
    }

    pub fn multi_scale_hasher(&self) -> MultiScaleHasher {
        MultiScaleHasher::new(&self.multi_scale_sizes)
    }
}

impl Default for HashSettings {
    fn default() -> Self {
        Self {
            grayscale_size: 8,
            color_size: 8,
            multi_scale_sizes: vec![8, 16, 32],
            multi_scale_threshold_bits: 896,
        }
    }
}
