//! Filesystem and file watching abstraction for heft.
//!
//! This crate provides a `FileSystem` trait with a native implementation
//! (using `std::fs` on the blocking pool) and an in-memory implementation
//! for tests, plus a `FileWatcher` trait used to observe dependency
//! manifests.
//!
//! # Example
//!
//! ```no_run
//! use heft_fs::{find_upwards, FileSystem, NativeFileSystem};
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> std::io::Result<()> {
//! let fs = NativeFileSystem::new();
//! let manifest = find_upwards(&fs, Path::new("/project/src/index.ts"), "package.json").await?;
//! println!("{:?}", manifest);
//! # Ok(())
//! # }
//! ```

mod file_system;
pub use file_system::{find_upwards, FileMetadata, FileSystem};

pub mod memory;
pub use memory::MemoryFileSystem;

pub mod native;
pub use native::NativeFileSystem;

pub mod watch;
pub use watch::{ChangeCallback, FileWatcher, ManualWatcher, NotifyWatcher, WatchHandle};
