//! Native filesystem implementation using std::fs + tokio.

use crate::{FileMetadata, FileSystem};
use std::io;
use std::path::Path;
use tokio::task;

/// Native filesystem implementation using std::fs + tokio.
///
/// This implementation wraps blocking std::fs calls with tokio::spawn_blocking
/// to avoid blocking the async runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFileSystem;

impl NativeFileSystem {
    pub fn new() -> Self {
        Self
    }
}

fn join_error(e: task::JoinError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

#[async_trait::async_trait]
impl FileSystem for NativeFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let path = path.to_path_buf();
        task::spawn_blocking(move || Ok(path.exists()))
            .await
            .map_err(join_error)?
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let path = path.to_path_buf();
        task::spawn_blocking(move || std::fs::read_to_string(&path))
            .await
            .map_err(join_error)?
    }

    async fn metadata(&self, path: &Path) -> io::Result<FileMetadata> {
        let path = path.to_path_buf();
        task::spawn_blocking(move || match std::fs::metadata(&path) {
            Ok(meta) => Ok(FileMetadata {
                exists: true,
                is_file: meta.is_file(),
                is_dir: meta.is_dir(),
                size: meta.len(),
                modified: meta.modified().ok(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(FileMetadata::missing()),
            Err(e) => Err(e),
        })
        .await
        .map_err(join_error)?
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let path = path.to_path_buf();
        let contents = contents.to_string();
        task::spawn_blocking(move || std::fs::write(&path, contents))
            .await
            .map_err(join_error)?
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let from = from.to_path_buf();
        let to = to.to_path_buf();
        task::spawn_blocking(move || std::fs::rename(&from, &to))
            .await
            .map_err(join_error)?
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        let path = path.to_path_buf();
        task::spawn_blocking(move || std::fs::remove_file(&path))
            .await
            .map_err(join_error)?
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let path = path.to_path_buf();
        task::spawn_blocking(move || std::fs::create_dir_all(&path))
            .await
            .map_err(join_error)?
    }
}
