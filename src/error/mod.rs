//! # Error Module
//!
//! User-facing error types for the image sorter.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Per-image failures are values** - extraction errors exclude one image,
//!   they never abort an analysis run

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum ImageSorterError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Fingerprint extraction error: {0}")]
    Extract(#[from] ExtractionError),

    #[error("Sorting error: {0}")]
    Sort(#[from] SortError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Report generation error: {0}")]
    Report(String),
}

/// Errors that occur while listing the source folder
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while computing a fingerprint for one image
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to decode image {path}: {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Image is empty or corrupted: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Failed to resize image: {0}")]
    ResizeFailed(String),

    #[error("Failed to open image file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} backend is unavailable: {reason}")]
    BackendUnavailable { kind: String, reason: String },

    #[error("Inference failed for {path}: {reason}")]
    InferenceFailed { path: PathBuf, reason: String },
}

impl ExtractionError {
    /// Attach a path to errors raised before the file was known
    pub fn with_path(self, path: &std::path::Path) -> Self {
        match self {
            ExtractionError::ResizeFailed(reason) => ExtractionError::DecodeError {
                path: path.to_path_buf(),
                reason,
            },
            ExtractionError::EmptyImage { .. } => ExtractionError::EmptyImage {
                path: path.to_path_buf(),
            },
            ExtractionError::InferenceFailed { reason, .. } => ExtractionError::InferenceFailed {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        }
    }
}

/// Errors that occur while moving grouped files into folders
#[derive(Error, Debug)]
pub enum SortError {
    #[error("Nothing to sort: run an analysis that produces groups first")]
    NoGroups,

    #[error("Failed to create folder {path}: {source}")]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {from} to {to}: {reason}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, ImageSorterError>;
