//! Moves each group's files into its own folder.
//!
//! Moves are sequential and not transactional: a failure is recorded and
//! the batch continues, leaving already-moved files where they landed.

use super::types::*;
use crate::core::pipeline::AnalysisResult;
use crate::error::SortError;
use crate::events::{null_sender, Event, EventSender, SortEvent, SortProgress};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Relocates analysed groups on disk
pub struct GroupSorter;

impl GroupSorter {
    /// Sort without events
    pub fn sort(result: AnalysisResult, options: &SortOptions) -> Result<SortResult, SortError> {
        Self::sort_with_events(result, options, &null_sender())
    }

    /// Sort with progress events.
    ///
    /// Consumes the analysis: once files move, its paths are stale.
    pub fn sort_with_events(
        result: AnalysisResult,
        options: &SortOptions,
        events: &EventSender,
    ) -> Result<SortResult, SortError> {
        if result.groups.is_empty() {
            return Err(SortError::NoGroups);
        }

        let start = Instant::now();
        let root = options.destination.clone().unwrap_or_else(|| result.source.clone());
        let total_files = result.grouped_images();

        events.send(Event::Sort(SortEvent::Started {
            total_files,
            total_groups: result.groups.len(),
        }));
        tracing::info!("Sorting {} groups into {}", result.groups.len(), root.display());

        let mut processed = 0usize;
        let mut outcome = SortResult {
            folders: Vec::new(),
            files_moved: 0,
            total_size_bytes: 0,
            failures: Vec::new(),
            duration_ms: 0,
        };

        for (index, group) in result.groups.into_iter().enumerate() {
            let name = format!("similar_group_{}_{}_images", index + 1, group.images.len());
            let folder = match create_unique_folder(&root, &name) {
                Ok(folder) => folder,
                Err(e) => {
                    let error = SortError::CreateFolder {
                        path: root.join(&name),
                        source: e,
                    };
                    tracing::warn!("{}", error);
                    for image in &group.images {
                        processed += 1;
                        record_failure(&mut outcome, events, image.path.clone(), error.to_string());
                    }
                    continue;
                }
            };

            let mut moved_here = 0;
            for image in &group.images {
                processed += 1;
                events.send(Event::Sort(SortEvent::Progress(SortProgress {
                    processed,
                    total: total_files,
                    current_path: image.path.clone(),
                })));

                let Some(file_name) = image.path.file_name() else {
                    record_failure(&mut outcome, events, image.path.clone(), "path has no file name".to_string());
                    continue;
                };
                let destination = unique_file_path(&folder.join(file_name));

                match move_file(&image.path, &destination) {
                    Ok(()) => {
                        moved_here += 1;
                        outcome.files_moved += 1;
                        outcome.total_size_bytes += image.size;
                    }
                    Err(e) => {
                        let error = SortError::MoveFailed {
                            from: image.path.clone(),
                            to: destination,
                            reason: e.to_string(),
                        };
                        tracing::warn!("{}", error);
                        record_failure(&mut outcome, events, image.path.clone(), error.to_string());
                    }
                }
            }

            outcome.folders.push(SortedFolder {
                group_id: group.id,
                path: folder,
                files_moved: moved_here,
            });
        }

        outcome.duration_ms = start.elapsed().as_millis() as u64;
        events.send(Event::Sort(SortEvent::Completed {
            files_moved: outcome.files_moved,
            failures: outcome.failures.len(),
        }));

        Ok(outcome)
    }
}

fn record_failure(outcome: &mut SortResult, events: &EventSender, path: PathBuf, reason: String) {
    events.send(Event::Sort(SortEvent::MoveFailed {
        path: path.clone(),
        message: reason.clone(),
    }));
    outcome.failures.push(MoveFailure { path, reason });
}

/// Create `root/name`, or `root/name_2`, `root/name_3`... if taken
fn create_unique_folder(root: &Path, name: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(root)?;
    let mut attempt = 1;
    loop {
        let candidate = if attempt == 1 {
            root.join(name)
        } else {
            root.join(format!("{}_{}", name, attempt))
        };
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}

/// `path` if free, else `stem_1.ext`, `stem_2.ext`...
fn unique_file_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().to_string());
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    (1..)
        .map(|n| match &extension {
            Some(ext) => parent.join(format!("{}_{}.{}", stem, n, ext)),
            None => parent.join(format!("{}_{}", stem, n)),
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    if !source.exists() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "source file not found"));
    }
    fs::rename(source, destination).or_else(|_| {
        // rename fails across filesystems; copy, verify size, then delete
        let source_size = fs::metadata(source)?.len();
        fs::copy(source, destination)?;

        let dest_size = fs::metadata(destination)?.len();
        if dest_size != source_size {
            let _ = fs::remove_file(destination);
            return Err(io::Error::other(format!(
                "copy verification failed: source {} bytes, dest {} bytes",
                source_size, dest_size
            )));
        }

        fs::remove_file(source)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::comparator::{DetectionMethod, GroupingRule};
    use crate::core::pipeline::ImageGroup;
    use crate::core::scanner::{ImageFile, ImageFormat};
    use chrono::Utc;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn file(dir: &Path, name: &str) -> ImageFile {
        let path = dir.join(name);
        fs::write(&path, name.as_bytes()).unwrap();
        ImageFile {
            path,
            size: name.len() as u64,
            format: ImageFormat::Jpeg,
        }
    }

    fn analysis(source: &Path, groups: Vec<Vec<ImageFile>>) -> AnalysisResult {
        AnalysisResult {
            source: source.to_path_buf(),
            method: DetectionMethod::ExactDuplicate,
            similarity: 0.85,
            rule: GroupingRule::ExactMatch,
            min_group_size: 2,
            total_images: groups.iter().map(|g| g.len()).sum(),
            analyzed_images: groups.iter().map(|g| g.len()).sum(),
            groups: groups
                .into_iter()
                .map(|images| ImageGroup {
                    id: Uuid::new_v4(),
                    images,
                })
                .collect(),
            ungrouped: Vec::new(),
            excluded: Vec::new(),
            scan_errors: Vec::new(),
            unavailable: Vec::new(),
            comparisons: 0,
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    #[test]
    fn no_groups_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = GroupSorter::sort(analysis(dir.path(), vec![]), &SortOptions::default());
        assert!(matches!(result, Err(SortError::NoGroups)));
    }

    #[test]
    fn moves_groups_into_numbered_folders() {
        let dir = TempDir::new().unwrap();
        let groups = vec![
            vec![file(dir.path(), "a.jpg"), file(dir.path(), "b.jpg")],
            vec![file(dir.path(), "c.jpg"), file(dir.path(), "d.jpg"), file(dir.path(), "e.jpg")],
        ];

        let result = GroupSorter::sort(analysis(dir.path(), groups), &SortOptions::default()).unwrap();

        assert!(result.is_complete());
        assert_eq!(result.files_moved, 5);
        assert!(dir.path().join("similar_group_1_2_images/a.jpg").exists());
        assert!(dir.path().join("similar_group_2_3_images/e.jpg").exists());
        assert!(!dir.path().join("a.jpg").exists());
    }

    #[test]
    fn existing_folder_gets_a_suffix() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("similar_group_1_2_images")).unwrap();
        let groups = vec![vec![file(dir.path(), "a.jpg"), file(dir.path(), "b.jpg")]];

        let result = GroupSorter::sort(analysis(dir.path(), groups), &SortOptions::default()).unwrap();

        assert_eq!(result.folders[0].path, dir.path().join("similar_group_1_2_images_2"));
        assert!(dir.path().join("similar_group_1_2_images_2/b.jpg").exists());
    }

    #[test]
    fn missing_file_is_reported_and_batch_continues() {
        let dir = TempDir::new().unwrap();
        let gone = file(dir.path(), "gone.jpg");
        fs::remove_file(&gone.path).unwrap();
        let groups = vec![vec![gone, file(dir.path(), "kept.jpg")]];

        let result = GroupSorter::sort(analysis(dir.path(), groups), &SortOptions::default()).unwrap();

        assert_eq!(result.files_moved, 1);
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].path.ends_with("gone.jpg"));
        assert!(dir.path().join("similar_group_1_2_images/kept.jpg").exists());
    }

    #[test]
    fn destination_root_can_differ() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        let groups = vec![vec![file(source.path(), "a.jpg"), file(source.path(), "b.jpg")]];
        let options = SortOptions {
            destination: Some(target.path().join("sorted")),
        };

        GroupSorter::sort(analysis(source.path(), groups), &options).unwrap();

        assert!(target.path().join("sorted/similar_group_1_2_images/a.jpg").exists());
    }

    #[test]
    fn colliding_names_are_renamed() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let groups = vec![vec![file(dir.path(), "a.jpg"), file(&sub, "a.jpg")]];

        let result = GroupSorter::sort(analysis(dir.path(), groups), &SortOptions::default()).unwrap();

        assert!(result.is_complete());
        assert!(dir.path().join("similar_group_1_2_images/a.jpg").exists());
        assert!(dir.path().join("similar_group_1_2_images/a_1.jpg").exists());
    }
}
