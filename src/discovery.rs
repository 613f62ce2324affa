//! Work item discovery
//!
//! Walks the input root and collects every recognized image file as a
//! [`WorkItem`]. Entries are visited in file-name order, files of a
//! directory before its subdirectories, so the resulting sequence is stable
//! for an unchanged tree. Static partitioning relies on that order.

use crate::error::EnumerationError;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File extensions (lowercase) accepted as input images
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// One unit of work: an input file and its location relative to the root
///
/// Identity is the path; two items with equal paths are the same item.
#[derive(Debug, Clone)]
pub struct WorkItem {
    /// Full path to the input file
    path: PathBuf,

    /// Path relative to the input root (mirrored under the output root)
    relative: PathBuf,

    /// File size in bytes at discovery time (0 if unknown)
    size: u64,
}

impl WorkItem {
    /// Create a work item with unknown size
    pub fn new(path: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            relative: relative.into(),
            size: 0,
        }
    }

    /// Set the discovered file size
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn relative_path(&self) -> &Path {
        &self.relative
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl PartialEq for WorkItem {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for WorkItem {}

impl Hash for WorkItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// Check whether a path carries a recognized image extension (case-insensitive)
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Recursively enumerate image files under `root`
///
/// An unreadable root is fatal. Unreadable subdirectories are logged and
/// skipped; unreadable files are still returned and fail later in the
/// transform step.
pub fn enumerate(root: &Path) -> Result<Vec<WorkItem>, EnumerationError> {
    let metadata = fs::metadata(root).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => EnumerationError::NotFound {
            path: root.to_path_buf(),
        },
        _ => EnumerationError::RootUnreadable {
            path: root.to_path_buf(),
            reason: e.to_string(),
        },
    })?;

    if !metadata.is_dir() {
        return Err(EnumerationError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut items = Vec::new();
    visit_dir(root, root, &mut items).map_err(|e| EnumerationError::RootUnreadable {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    debug!(root = %root.display(), items = items.len(), "Enumeration complete");
    Ok(items)
}

/// Total bytes across all items
pub fn total_bytes(items: &[WorkItem]) -> u64 {
    items.iter().map(WorkItem::size).sum()
}

fn visit_dir(root: &Path, dir: &Path, items: &mut Vec<WorkItem>) -> io::Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut subdirs = Vec::new();

    for entry in entries {
        let path = entry.path();

        // Symlinked directories are not followed
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            subdirs.push(path);
            continue;
        }

        if !is_image_path(&path) {
            continue;
        }

        let relative = path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(entry.file_name()));
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);

        items.push(WorkItem::new(path, relative).with_size(size));
    }

    for subdir in subdirs {
        if let Err(e) = visit_dir(root, &subdir, items) {
            warn!(path = %subdir.display(), error = %e, "Skipping unreadable directory");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"data").unwrap();
    }

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path(Path::new("a/b.png")));
        assert!(is_image_path(Path::new("a/b.JPG")));
        assert!(is_image_path(Path::new("b.Jpeg")));
        assert!(!is_image_path(Path::new("b.gif")));
        assert!(!is_image_path(Path::new("png")));
        assert!(!is_image_path(Path::new("notes.png.txt")));
    }

    #[test]
    fn test_enumerate_filters_and_mirrors() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("b.png"));
        touch(&root.join("a.JPEG"));
        touch(&root.join("readme.txt"));
        touch(&root.join("cats/z.jpg"));
        touch(&root.join("cats/kittens/k.png"));
        touch(&root.join("dogs/d.gif"));

        let items = enumerate(root).unwrap();
        let relative: Vec<_> = items
            .iter()
            .map(|i| i.relative_path().to_path_buf())
            .collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from("a.JPEG"),
                PathBuf::from("b.png"),
                PathBuf::from("cats/z.jpg"),
                PathBuf::from("cats/kittens/k.png"),
            ]
        );
        assert_eq!(items[0].path(), root.join("a.JPEG"));
        assert_eq!(total_bytes(&items), 16);
    }

    #[test]
    fn test_enumerate_is_stable() {
        let dir = tempdir().unwrap();
        for i in 0..20 {
            touch(&dir.path().join(format!("set{}/img{}.png", i % 3, i)));
        }

        let first = enumerate(dir.path()).unwrap();
        let second = enumerate(dir.path()).unwrap();
        assert_eq!(first.len(), 20);
        assert_eq!(first, second);
    }

    #[test]
    fn test_enumerate_missing_root() {
        let dir = tempdir().unwrap();
        let err = enumerate(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, EnumerationError::NotFound { .. }));
    }

    #[test]
    fn test_enumerate_file_root() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("x.png");
        touch(&file);
        let err = enumerate(&file).unwrap_err();
        assert!(matches!(err, EnumerationError::NotADirectory { .. }));
    }

    #[test]
    fn test_item_identity_is_path() {
        let a = WorkItem::new("/in/a.png", "a.png").with_size(10);
        let b = WorkItem::new("/in/a.png", "other.png");
        assert_eq!(a, b);
        assert_ne!(a, WorkItem::new("/in/b.png", "b.png"));
    }
}
