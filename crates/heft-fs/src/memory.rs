//! In-memory filesystem implementation.

use crate::{FileMetadata, FileSystem};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
struct Entry {
    contents: Vec<u8>,
    modified: SystemTime,
}

/// In-memory filesystem.
///
/// Directories are implicit: a path is a directory when some file lives
/// below it. Every write bumps the modification time by one second so that
/// watchers observe a change even when the size does not move.
///
/// # Thread Safety
///
/// Uses `Arc<RwLock<HashMap>>` for interior mutability; clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: Arc<RwLock<HashMap<PathBuf, Entry>>>,
}

impl MemoryFileSystem {
    /// Create an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filesystem pre-populated with `files`.
    pub fn with_files<I, P, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<PathBuf>,
        S: Into<String>,
    {
        let fs = Self::new();
        for (path, contents) in files {
            fs.insert(path, contents);
        }
        fs
    }

    /// Insert or replace a file synchronously (used during setup).
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        let path = path.into();
        let mut files = self.files.write();
        let modified = files
            .get(&path)
            .map(|entry| entry.modified + Duration::from_secs(1))
            .unwrap_or(SystemTime::UNIX_EPOCH);
        files.insert(
            path,
            Entry {
                contents: contents.into().into_bytes(),
                modified,
            },
        );
    }

    fn is_dir(files: &HashMap<PathBuf, Entry>, path: &Path) -> bool {
        files
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }
}

#[async_trait::async_trait]
impl FileSystem for MemoryFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let files = self.files.read();
        Ok(files.contains_key(path) || Self::is_dir(&files, path))
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self
            .files
            .read()
            .get(path)
            .map(|entry| entry.contents.clone())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("File not found: {}", path.display()),
                )
            })?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    async fn metadata(&self, path: &Path) -> io::Result<FileMetadata> {
        let files = self.files.read();
        if let Some(entry) = files.get(path) {
            return Ok(FileMetadata {
                exists: true,
                is_file: true,
                is_dir: false,
                size: entry.contents.len() as u64,
                modified: Some(entry.modified),
            });
        }
        if Self::is_dir(&files, path) {
            return Ok(FileMetadata {
                exists: true,
                is_file: false,
                is_dir: true,
                size: 0,
                modified: None,
            });
        }
        Ok(FileMetadata::missing())
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.insert(path, contents);
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut files = self.files.write();
        let entry = files
            .remove(from)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Source file not found"))?;
        files.insert(to.to_path_buf(), entry);
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.files
            .write()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "File not found"))
    }

    async fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        // Directories are implicit
        Ok(())
    }
}
