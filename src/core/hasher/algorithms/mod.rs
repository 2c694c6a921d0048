//! Bit-string hash implementations.

mod average;
mod color;
mod multi_scale;

pub use average::GrayscaleHasher;
pub use color::ColorHasher;
pub use multi_scale::MultiScaleHasher;
