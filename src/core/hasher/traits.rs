//! Bit-string hashes and the trait shared by the pixel hashers.

use super::fast_resize::FastResizer;
use crate::error::ExtractionError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Kinds of bit-string hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithmKind {
    /// Mean-thresholded grayscale grid
    Grayscale,
    /// One mean-thresholded grid per RGB channel
    Color,
    /// Grayscale grids at several sizes, concatenated
    MultiScale,
}

impl HashAlgorithmKind {
    /// Get a human-readable description of the algorithm
    pub fn description(&self) -> &'static str {
        match self {
            HashAlgorithmKind::Grayscale => "Grayscale average hash - brightness layout",
            HashAlgorithmKind::Color => "Color hash - per-channel brightness layout",
            HashAlgorithmKind::MultiScale => "Multi-scale hash - brightness layout at several sizes",
        }
    }
}

impl std::fmt::Display for HashAlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithmKind::Grayscale => write!(f, "grayscale"),
            HashAlgorithmKind::Color => write!(f, "color"),
            HashAlgorithmKind::MultiScale => write!(f, "multi-scale"),
        }
    }
}

/// Trait for pixel hash implementations
pub trait HashAlgorithm: Send + Sync {
    /// Compute a hash from an already-decoded image
    fn hash_image(&self, image: &DynamicImage, resizer: &mut FastResizer) -> Result<BitHash, ExtractionError>;

    /// Number of bits every hash from this algorithm carries
    fn bit_len(&self) -> u32;

    /// Get the algorithm kind
    fn kind(&self) -> HashAlgorithmKind;
}

/// A fixed-length bit string, packed most-significant bit first
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitHash {
    bytes: Vec<u8>,
    len: u32,
}

impl BitHash {
    /// Pack a sequence of bits
    pub fn from_bits<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        let mut builder = BitHashBuilder::default();
        for bit in bits {
            builder.push(bit);
        }
        builder.finish()
    }

    /// Build from a '0'/'1' string; any other character is treated as '0'
    pub fn from_bit_str(bits: &str) -> Self {
        Self::from_bits(bits.chars().map(|c| c == '1'))
    }

    /// Join several hashes end to end
    pub fn concat(parts: &[BitHash]) -> Self {
        let mut builder = BitHashBuilder::default();
        for part in parts {
            for index in 0..part.len {
                builder.push(part.bit(index));
            }
        }
        builder.finish()
    }

    /// Number of bits
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether the hash carries no bits
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read a single bit
    pub fn bit(&self, index: u32) -> bool {
        let byte = self.bytes[(index / 8) as usize];
        byte & (1 << (7 - index % 8)) != 0
    }

    /// Raw packed bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hexadecimal rendering of the packed bytes
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Number of differing bits, or `None` when lengths differ
    pub fn distance(&self, other: &BitHash) -> Option<u32> {
        if self.len != other.len {
            return None;
        }
        // Padding bits are always zero, so they never count.
        Some(
            self.bytes
                .iter()
                .zip(other.bytes.iter())
                .map(|(a, b)| (a ^ b).count_ones())
                .sum(),
        )
    }

    /// 1 - distance/length; 0 when lengths differ
    pub fn similarity(&self, other: &BitHash) -> f64 {
        match self.distance(other) {
            Some(_) if self.len == 0 => 1.0,
            Some(distance) => 1.0 - distance as f64 / self.len as f64,
            None => 0.0,
        }
    }
}

/// Accumulates bits into a [`BitHash`]
#[derive(Default)]
pub(crate) struct BitHashBuilder {
    bytes: Vec<u8>,
    len: u32,
}

impl BitHashBuilder {
    pub(crate) fn push(&mut self, bit: bool) {
        let offset = self.len % 8;
        if offset == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 1 << (7 - offset);
            }
        }
        self.len += 1;
    }

    pub(crate) fn finish(self) -> BitHash {
        BitHash {
            bytes: self.bytes,
            len: self.len,
        }
    }
}

/// Threshold each sample against the arithmetic mean of all samples
pub(crate) fn mean_threshold_bits(samples: &[u8]) -> Vec<bool> {
    if samples.is_empty() {
        return Vec::new();
    }
    let sum: u64 = samples.iter().map(|&s| s as u64).sum();
    let mean = sum as f64 / samples.len() as f64;
    samples.iter().map(|&s| s as f64 > mean).collect()
}
