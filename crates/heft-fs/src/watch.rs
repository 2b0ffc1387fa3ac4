//! File watching.

use notify::{Config, Event, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Callback invoked with the watched path on every observed change.
pub type ChangeCallback = Arc<dyn Fn(PathBuf) + Send + Sync>;

/// Keeps a watch alive. Dropping the handle stops the watch.
pub struct WatchHandle {
    guard: Option<Box<dyn Any + Send>>,
}

impl WatchHandle {
    /// Handle owning whatever keeps the watch running.
    pub fn new(guard: impl Any + Send) -> Self {
        Self {
            guard: Some(Box::new(guard)),
        }
    }

    /// Handle for watchers that have nothing to tear down.
    pub fn detached() -> Self {
        Self { guard: None }
    }
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchHandle")
            .field("active", &self.guard.is_some())
            .finish()
    }
}

/// Something that can watch a single file for changes.
pub trait FileWatcher: Send + Sync {
    /// Start watching `path`; `on_change` fires for every change.
    ///
    /// # Errors
    ///
    /// Returns an error if the watch cannot be set up.
    fn watch(&self, path: &Path, on_change: ChangeCallback) -> io::Result<WatchHandle>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Native,
    Poll(Duration),
}

/// Watches files with `notify`.
///
/// The parent directory is watched non-recursively and events are filtered
/// down to the file, so saves that replace the file through a rename are
/// still reported. Callbacks run on the notifier's thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyWatcher {
    backend: Backend,
}

impl NotifyWatcher {
    /// The platform's native notification backend.
    pub fn native() -> Self {
        Self {
            backend: Backend::Native,
        }
    }

    /// Metadata polling, for filesystems without change notifications
    /// (network mounts, some containers).
    pub fn polling(interval: Duration) -> Self {
        Self {
            backend: Backend::Poll(interval),
        }
    }

    pub fn is_polling(&self) -> bool {
        matches!(self.backend, Backend::Poll(_))
    }
}

impl Default for NotifyWatcher {
    fn default() -> Self {
        Self::native()
    }
}

fn notify_error(e: notify::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

/// Whether `event` touches the file called `name`.
fn concerns(event: &Event, name: &std::ffi::OsStr) -> bool {
    !matches!(event.kind, EventKind::Access(_))
        && event.paths.iter().any(|p| p.file_name() == Some(name))
}

impl FileWatcher for NotifyWatcher {
    fn watch(&self, path: &Path, on_change: ChangeCallback) -> io::Result<WatchHandle> {
        let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot watch {}", path.display()),
            ));
        };
        let dir = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };

        let watched = path.to_path_buf();
        let name = name.to_os_string();
        let handler = move |result: notify::Result<Event>| match result {
            Ok(event) if concerns(&event, &name) => {
                tracing::debug!(path = %watched.display(), kind = ?event.kind, "watched file changed");
                on_change(watched.clone());
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(path = %watched.display(), error = %e, "watch error");
            }
        };

        match self.backend {
            Backend::Native => {
                let mut watcher: RecommendedWatcher =
                    notify::recommended_watcher(handler).map_err(notify_error)?;
                watcher
                    .watch(dir, RecursiveMode::NonRecursive)
                    .map_err(notify_error)?;
                Ok(WatchHandle::new(watcher))
            }
            Backend::Poll(interval) => {
                let config = Config::default()
                    .with_poll_interval(interval)
                    .with_compare_contents(true);
                let mut watcher = PollWatcher::new(handler, config).map_err(notify_error)?;
                watcher
                    .watch(dir, RecursiveMode::NonRecursive)
                    .map_err(notify_error)?;
                Ok(WatchHandle::new(watcher))
            }
        }
    }
}

/// Watcher driven by hand, for tests and hosts that get change
/// notifications from elsewhere (e.g. editor file events).
///
/// [`ManualWatcher::trigger`] fires every callback registered for a path.
#[derive(Default)]
pub struct ManualWatcher {
    watches: Mutex<Vec<(PathBuf, ChangeCallback)>>,
    fail_setup: AtomicBool,
}

impl ManualWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `watch` calls fail (or succeed again).
    pub fn set_fail_setup(&self, fail: bool) {
        self.fail_setup.store(fail, Ordering::SeqCst);
    }

    /// Number of watches set up so far.
    pub fn watch_count(&self) -> usize {
        self.watches.lock().len()
    }

    /// Paths watched, in setup order.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.watches.lock().iter().map(|(p, _)| p.clone()).collect()
    }

    /// Report a change of `path`; returns how many callbacks fired.
    pub fn trigger(&self, path: &Path) -> usize {
        let callbacks: Vec<ChangeCallback> = self
            .watches
            .lock()
            .iter()
            .filter(|(watched, _)| watched == path)
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in &callbacks {
            callback(path.to_path_buf());
        }
        callbacks.len()
    }
}

impl FileWatcher for ManualWatcher {
    fn watch(&self, path: &Path, on_change: ChangeCallback) -> io::Result<WatchHandle> {
        if self.fail_setup.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("cannot watch {}", path.display()),
            ));
        }
        self.watches.lock().push((path.to_path_buf(), on_change));
        Ok(WatchHandle::detached())
    }
}
