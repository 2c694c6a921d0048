//! Types for the organize module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Options for moving grouped files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortOptions {
    /// Root for the group folders; the analysed folder when `None`
    pub destination: Option<PathBuf>,
}

/// A group folder and what landed in it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortedFolder {
    pub group_id: Uuid,
    pub path: PathBuf,
    pub files_moved: usize,
}

/// A file that stayed where it was
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of sorting one analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortResult {
    pub folders: Vec<SortedFolder>,
    pub files_moved: usize,
    pub total_size_bytes: u64,
    pub failures: Vec<MoveFailure>,
    pub duration_ms: u64,
}

impl SortResult {
    /// Whether every file was moved
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
