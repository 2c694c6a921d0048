//! Folder listing implementation using walkdir.

use super::filter::{is_hidden, ImageFilter};
use super::{ImageFile, ImageScanner, ScanResult};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Configuration for the folder scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Descend into subfolders (the sorter lists a single folder by default)
    pub recursive: bool,
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: ImageFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = ImageFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions.clone());
        }

        Self { config, filter }
    }

    fn scan_directory(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<(Vec<ImageFile>, Vec<ScanError>), ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut images = Vec::new();
        let mut errors = Vec::new();

        let mut walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if !self.config.recursive {
            walker = walker.max_depth(1);
        }

        let include_hidden = self.config.include_hidden;
        let entries = walker
            .into_iter()
            .filter_entry(move |entry| include_hidden || !is_hidden(entry.path()));

        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let error = if e.io_error().map(|io| io.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadDirectory {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        }
                    };

                    events.send(Event::Scan(ScanEvent::Error {
                        path,
                        message: error.to_string(),
                    }));
                    errors.push(error);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.filter.should_include(entry.path()) {
                continue;
            }

            match entry.metadata() {
                Ok(metadata) => {
                    let image = ImageFile {
                        path: entry.path().to_path_buf(),
                        size: metadata.len(),
                        format: self.filter.get_format(entry.path()),
                    };

                    events.send(Event::Scan(ScanEvent::ImageFound {
                        path: image.path.clone(),
                    }));
                    images.push(image);
                }
                Err(e) => {
                    let error = ScanError::ReadDirectory {
                        path: entry.path().to_path_buf(),
                        source: std::io::Error::other(e.to_string()),
                    };

                    events.send(Event::Scan(ScanEvent::Error {
                        path: entry.path().to_path_buf(),
                        message: error.to_string(),
                    }));
                    errors.push(error);
                }
            }
        }

        Ok((images, errors))
    }
}

impl ImageScanner for WalkDirScanner {
    fn scan(&self, paths: &[PathBuf]) -> Result<ScanResult, ScanError> {
        self.scan_with_events(paths, &crate::events::null_sender())
    }

    fn scan_with_events(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        events.send(Event::Scan(ScanEvent::Started {
            paths: paths.to_vec(),
        }));

        let mut all_images = Vec::new();
        let mut all_errors = Vec::new();

        for path in paths {
            match self.scan_directory(path, events) {
                Ok((images, errors)) => {
                    all_images.extend(images);
                    all_errors.extend(errors);
                }
                Err(e) => all_errors.push(e),
            }
        }

        events.send(Event::Scan(ScanEvent::Completed {
            total_images: all_images.len(),
        }));

        Ok(ScanResult {
            images: all_images,
            errors: all_errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::ImageFormat;
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        path
    }

    fn scan(dir: &TempDir, config: ScanConfig) -> ScanResult {
        WalkDirScanner::new(config)
            .scan(&[dir.path().to_path_buf()])
            .unwrap()
    }

    #[test]
    fn scan_empty_directory_returns_empty_vec() {
        let temp_dir = TempDir::new().unwrap();
        let result = scan(&temp_dir, ScanConfig::default());

        assert!(result.images.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn scan_lists_images_in_name_order() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "c.png");
        touch(temp_dir.path(), "a.jpg");
        touch(temp_dir.path(), "b.webp");

        let result = scan(&temp_dir, ScanConfig::default());
        let names: Vec<_> = result
            .images
            .iter()
            .map(|i| i.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["a.jpg", "b.webp", "c.png"]);
        assert_eq!(result.images[0].format, ImageFormat::Jpeg);
    }

    #[test]
    fn scan_excludes_non_image_files() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "photo.jpg");
        File::create(temp_dir.path().join("names.csv")).unwrap();

        let result = scan(&temp_dir, ScanConfig::default());

        assert_eq!(result.images.len(), 1);
        assert!(result.images[0].path.ends_with("photo.jpg"));
    }

    #[test]
    fn scan_is_flat_unless_recursive() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("similar_group_1_2_images");
        fs::create_dir(&subdir).unwrap();
        touch(temp_dir.path(), "root.jpg");
        touch(&subdir, "nested.jpg");

        assert_eq!(scan(&temp_dir, ScanConfig::default()).images.len(), 1);

        let recursive = ScanConfig {
            recursive: true,
            ..Default::default()
        };
        assert_eq!(scan(&temp_dir, recursive).images.len(), 2);
    }

    #[test]
    fn scan_skips_hidden_directories_when_recursive() {
        let temp_dir = TempDir::new().unwrap();
        let hidden = temp_dir.path().join(".cache");
        fs::create_dir(&hidden).unwrap();
        touch(&hidden, "thumb.jpg");
        touch(temp_dir.path(), "visible.jpg");

        let config = ScanConfig {
            recursive: true,
            ..Default::default()
        };
        let result = scan(&temp_dir, config);

        assert_eq!(result.images.len(), 1);
        assert!(result.images[0].path.ends_with("visible.jpg"));
    }

    #[test]
    fn scan_can_include_hidden_files() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "visible.jpg");
        touch(temp_dir.path(), ".hidden.jpg");

        assert_eq!(scan(&temp_dir, ScanConfig::default()).images.len(), 1);

        let config = ScanConfig {
            include_hidden: true,
            ..Default::default()
        };
        assert_eq!(scan(&temp_dir, config).images.len(), 2);
    }

    #[test]
    fn scan_nonexistent_directory_records_error() {
        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner
            .scan(&[PathBuf::from("/nonexistent/path/12345")])
            .unwrap();

        assert!(result.images.is_empty());
        assert!(!result.errors.is_empty());
    }
}
