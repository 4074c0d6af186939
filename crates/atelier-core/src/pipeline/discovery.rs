//! Finding uploadable images on disk.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::validate::UploadPolicy;

/// Discovers files whose extension the upload policy accepts.
pub struct FileDiscovery {
    policy: UploadPolicy,
}

/// Information about a discovered file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    pub fn new(policy: UploadPolicy) -> Self {
        Self { policy }
    }

    /// Discover all uploadable files at a path.
    ///
    /// A file path is returned as-is when its extension is accepted; a
    /// directory is walked recursively.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        if path.is_file() {
            if self.is_supported(path) {
                if let Ok(meta) = std::fs::metadata(path) {
                    return vec![DiscoveredFile {
                        path: path.to_path_buf(),
                        size: meta.len(),
                    }];
                }
            }
            return vec![];
        }

        let mut files: Vec<DiscoveredFile> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file() && self.is_supported(entry.path()))
            .filter_map(|entry| {
                let size = entry.metadata().ok()?.len();
                Some(DiscoveredFile {
                    path: entry.into_path(),
                    size,
                })
            })
            .collect();

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// MIME type to declare for a discovered file.
    pub fn content_type(&self, path: &Path) -> Option<&str> {
        let ext = format!(".{}", path.extension()?.to_str()?);
        self.policy.mime_for_extension(&ext)
    }

    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.policy.is_allowed_extension(&format!(".{ext}")))
    }

    /// Total size of all discovered files.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LimitsConfig, UploadConfig};

    fn discovery() -> FileDiscovery {
        FileDiscovery::new(UploadPolicy::new(
            &LimitsConfig::default(),
            &UploadConfig::default(),
        ))
    }

    #[test]
    fn test_is_supported() {
        let discovery = discovery();
        assert!(discovery.is_supported(Path::new("test.jpg")));
        assert!(discovery.is_supported(Path::new("test.JPG")));
        assert!(discovery.is_supported(Path::new("test.jpeg")));
        assert!(discovery.is_supported(Path::new("test.png")));
        assert!(!discovery.is_supported(Path::new("test.webp")));
        assert!(!discovery.is_supported(Path::new("test.gif")));
        assert!(!discovery.is_supported(Path::new("README")));
    }

    #[test]
    fn test_content_type() {
        let discovery = discovery();
        assert_eq!(discovery.content_type(Path::new("a/b.JPEG")), Some("image/jpeg"));
        assert_eq!(discovery.content_type(Path::new("b.png")), Some("image/png"));
        assert_eq!(discovery.content_type(Path::new("b.txt")), None);
    }

    #[test]
    fn test_discover_walks_directories_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.png"), [0u8; 3]).unwrap();
        std::fs::write(dir.path().join("nested/a.jpg"), [0u8; 5]).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"skip").unwrap();

        let files = discovery().discover(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].path < files[1].path);
        assert_eq!(FileDiscovery::total_size(&files), 8);

        let single = discovery().discover(&dir.path().join("b.png"));
        assert_eq!(single.len(), 1);
        assert!(discovery().discover(&dir.path().join("notes.txt")).is_empty());
    }
}
