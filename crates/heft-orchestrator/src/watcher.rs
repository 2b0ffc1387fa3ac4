//! Watches on dependency manifests discovered by sessions.

use crate::input::{Inbox, Input};
use heft_fs::{FileWatcher, WatchHandle};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result of [`PackageWatcherRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Created,
    AlreadyWatched,
    /// The watch could not be set up; a later registration retries.
    Failed,
}

/// At most one watch per manifest path.
///
/// Changes are posted to the orchestrator inbox as
/// [`Input::ManifestChanged`]. Watches live as long as the registry.
///
/// Paths are compared verbatim, so one manifest reached through two
/// spellings (symlinks, `..` segments) is watched twice.
pub struct PackageWatcherRegistry {
    watcher: Arc<dyn FileWatcher>,
    inbox: Inbox,
    watches: HashMap<PathBuf, WatchHandle>,
}

impl fmt::Debug for PackageWatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageWatcherRegistry")
            .field("watches", &self.watches.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl PackageWatcherRegistry {
    pub fn new(watcher: Arc<dyn FileWatcher>, inbox: Inbox) -> Self {
        Self {
            watcher,
            inbox,
            watches: HashMap::new(),
        }
    }

    pub fn register(&mut self, manifest: &Path) -> RegisterOutcome {
        if self.watches.contains_key(manifest) {
            tracing::debug!(path = %manifest.display(), "manifest already watched");
            return RegisterOutcome::AlreadyWatched;
        }

        let inbox = self.inbox.clone();
        let on_change = Arc::new(move |path: PathBuf| {
            let _ = inbox.send(Input::ManifestChanged(path));
        });

        match self.watcher.watch(manifest, on_change) {
            Ok(handle) => {
                tracing::info!(path = %manifest.display(), "watching manifest");
                self.watches.insert(manifest.to_path_buf(), handle);
                RegisterOutcome::Created
            }
            Err(e) => {
                tracing::warn!(path = %manifest.display(), error = %e, "failed to watch manifest");
                RegisterOutcome::Failed
            }
        }
    }

    pub fn is_watching(&self, manifest: &Path) -> bool {
        self.watches.contains_key(manifest)
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }
}
