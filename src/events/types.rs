//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the analysis and sort operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Folder listing events
    Scan(ScanEvent),
    /// Fingerprint extraction events
    Extract(ExtractEvent),
    /// Grouping/comparison events
    Compare(CompareEvent),
    /// File relocation events
    Sort(SortEvent),
    /// Run-level events
    Pipeline(PipelineEvent),
}

/// Events while listing the source folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Listing has started
    Started { paths: Vec<PathBuf> },
    /// An image file was found
    ImageFound { path: PathBuf },
    /// An entry could not be read, listing continues
    Error { path: PathBuf, message: String },
    /// Listing completed
    Completed { total_images: usize },
}

/// Events during fingerprint extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExtractEvent {
    /// Extraction has started
    Started { total_images: usize },
    /// Progress update
    Progress(ExtractProgress),
    /// An image could not be fingerprinted and is excluded
    Failed { path: PathBuf, message: String },
    /// Extraction completed
    Completed { extracted: usize, failed: usize },
}

/// Progress information during extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractProgress {
    /// Images processed so far (successes and failures)
    pub completed: usize,
    /// Total images to process
    pub total: usize,
    /// Image just processed
    pub current_path: PathBuf,
}

impl ExtractProgress {
    /// Fraction of the extraction phase done, in [0, 1]
    pub fn fraction(&self) -> f64 {
        fraction(self.completed, self.total)
    }
}

/// Events during grouping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompareEvent {
    /// Grouping has started
    Started { total_images: usize },
    /// Progress update after each seed
    Progress(CompareProgress),
    /// A group meeting the minimum size was formed
    GroupFound { group_id: String, image_count: usize },
    /// Grouping completed
    Completed {
        total_groups: usize,
        grouped_images: usize,
    },
}

/// Progress information during grouping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareProgress {
    /// Images assigned to a group (kept or dropped) so far
    pub images_assigned: usize,
    /// Images taking part in grouping
    pub total_images: usize,
    /// Pairwise comparisons evaluated so far
    pub comparisons_completed: usize,
    /// Groups kept so far
    pub groups_found: usize,
}

impl CompareProgress {
    /// Fraction of the comparison phase done, in [0, 1]
    pub fn fraction(&self) -> f64 {
        fraction(self.images_assigned, self.total_images)
    }
}

/// Events while moving grouped files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SortEvent {
    /// Sorting has started
    Started { total_files: usize, total_groups: usize },
    /// Progress update after each file
    Progress(SortProgress),
    /// A file could not be moved, sorting continues
    MoveFailed { path: PathBuf, message: String },
    /// Sorting completed
    Completed { files_moved: usize, failures: usize },
}

/// Progress information while sorting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortProgress {
    /// Files attempted so far
    pub processed: usize,
    /// Total files in all groups
    pub total: usize,
    /// File just attempted
    pub current_path: PathBuf,
}

impl SortProgress {
    /// Fraction of the sort done, in [0, 1]
    pub fn fraction(&self) -> f64 {
        fraction(self.processed, self.total)
    }
}

/// Run-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Analysis has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// An optional backend is missing; reported once per analyzer
    CapabilityUnavailable { kind: String, reason: String },
    /// Analysis completed
    Completed { summary: PipelineSummary },
}

/// Phases of an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Extracting,
    Comparing,
    Sorting,
}

/// Summary of an analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Images found in the folder
    pub total_images: usize,
    /// Images that could be fingerprinted
    pub analyzed_images: usize,
    /// Groups meeting the minimum size
    pub groups: usize,
    /// Images across all kept groups
    pub grouped_images: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Extracting => write!(f, "Extracting"),
            PipelinePhase::Comparing => write!(f, "Comparing"),
            PipelinePhase::Sorting => write!(f, "Sorting"),
        }
    }
}

fn fraction(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    (done as f64 / total as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Extract(ExtractEvent::Progress(ExtractProgress {
            completed: 10,
            total: 50,
            current_path: PathBuf::from("/products/a.jpg"),
        }));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Extract(ExtractEvent::Progress(p)) => assert_eq!(p.completed, 10),
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn progress_fraction_is_bounded() {
        let progress = CompareProgress {
            images_assigned: 5,
            total_images: 20,
            comparisons_completed: 40,
            groups_found: 1,
        };
        assert!((progress.fraction() - 0.25).abs() < f64::EPSILON);

        let empty = SortProgress {
            processed: 0,
            total: 0,
            current_path: PathBuf::new(),
        };
        assert_eq!(empty.fraction(), 1.0);
    }

    #[test]
    fn phase_display() {
        assert_eq!(PipelinePhase::Extracting.to_string(), "Extracting");
    }
}
