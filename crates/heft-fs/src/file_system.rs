//! FileSystem trait for async filesystem operations.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// File metadata compatible across implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Whether the path exists.
    pub exists: bool,
    /// Whether the path is a file (false if directory or doesn't exist).
    pub is_file: bool,
    /// Whether the path is a directory.
    pub is_dir: bool,
    /// File size in bytes (0 for directories or non-existent files).
    pub size: u64,
    /// Last modification time, when the platform reports one.
    pub modified: Option<SystemTime>,
}

impl FileMetadata {
    /// Metadata of a path that does not exist.
    pub fn missing() -> Self {
        Self {
            exists: false,
            is_file: false,
            is_dir: false,
            size: 0,
            modified: None,
        }
    }
}

/// Async filesystem abstraction.
///
/// # Error Handling
///
/// Uses `std::io::Result<T>` so native errors map through unchanged and the
/// in-memory implementation constructs `io::Error`s with the matching kind.
#[async_trait::async_trait]
pub trait FileSystem: Send + Sync {
    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Read file contents as a string.
    ///
    /// # Errors
    ///
    /// Returns `io::ErrorKind::NotFound` if file doesn't exist.
    /// Returns `io::ErrorKind::InvalidData` if file is not valid UTF-8.
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Get file/directory metadata.
    ///
    /// Returns metadata even if the file doesn't exist (exists=false).
    async fn metadata(&self, path: &Path) -> io::Result<FileMetadata>;

    /// Write string contents to a file, overwriting it.
    ///
    /// Parent directories are NOT created automatically.
    async fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Atomically rename a file.
    ///
    /// Used for atomic file updates (write to .tmp, then rename).
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Remove a file.
    async fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Create a directory and all parent directories.
    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// Finds the closest `file_name` in `start`'s directory or any ancestor.
///
/// `start` may be a file; the search begins in its parent directory.
pub async fn find_upwards<F: FileSystem + ?Sized>(
    fs: &F,
    start: &Path,
    file_name: &str,
) -> io::Result<Option<PathBuf>> {
    let mut dir = if fs.metadata(start).await?.is_dir {
        Some(start)
    } else {
        start.parent()
    };

    while let Some(current) = dir {
        let candidate = current.join(file_name);
        if fs.metadata(&candidate).await?.is_file {
            return Ok(Some(candidate));
        }
        dir = current.parent();
    }

    Ok(None)
}
