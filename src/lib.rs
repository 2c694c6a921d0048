//! # Image Sorter
//!
//! Groups visually similar images in a folder and moves each group into its
//! own subfolder.
//!
//! ## Core Philosophy
//! - **Nothing is deleted** - grouped files are only moved
//! - **Explain the rule** - every result carries the method and threshold used
//! - **Degrade openly** - missing backends are reported, never silently skipped
//!
//! ## Architecture
//! The library is split into a core engine (presentation-agnostic) and the CLI:
//! - `core` - Fingerprinting, grouping and sorting
//! - `events` - Event-driven progress reporting
//! - `error` - User-friendly error types

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{ImageSorterError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `RUST_LOG` wins
/// over `default_level` when set. Calling it twice is harmless.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
