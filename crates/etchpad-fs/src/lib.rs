//! Virtual project file system for etchpad.
//!
//! This crate holds a project's files behind an async API and tells
//! observers when the project changes:
//! - Ordered, name-unique file set with snapshot access
//! - Pluggable storage backends (in-memory and on-disk)
//! - Broadcast update events carrying the full new snapshot
//!
//! # Example
//!
//! ```no_run
//! use etchpad_fs::FileSystem;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fs = FileSystem::new();
//! fs.initialize().await?;
//!
//! let mut updates = fs.subscribe();
//! fs.write("main.cpp", b"int main() {}").await?;
//!
//! let update = updates.recv().await?;
//! assert!(update.project.contains("main.cpp"));
//! # Ok(())
//! # }
//! ```

mod error;
mod fs;
mod storage;

pub use error::{FsError, FsResult};
pub use fs::{FileSystem, ProjectUpdated, DEFAULT_FILE, DEFAULT_PROGRAM};
pub use storage::{DiskStorage, FsStorage, MemoryStorage, ProjectMeta};
