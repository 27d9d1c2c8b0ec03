//! Project snapshot model for etchpad.
//!
//! This crate provides the value types the rest of the workspace builds on:
//! - Content hashing, so snapshots compare without reading file data
//! - Ordered, name-unique project snapshots
//! - A pure diff between two snapshots, expressed as per-file change records
//!
//! # Example
//!
//! ```
//! use etchpad_project::{diff, FileChange, FileEntry, Project, ProjectId};
//!
//! let mut before = Project::new(ProjectId::new());
//! before.files.push(FileEntry::new("main.cpp", b"int main() {}"));
//!
//! let mut after = before.clone();
//! after.files.push(FileEntry::new("util.h", b"#pragma once"));
//!
//! let changes = diff(&before, &after);
//! assert_eq!(changes, vec![FileChange::Created { name: "util.h".into() }]);
//! ```

mod diff;
mod hash;
mod project;

pub use diff::{diff, FileChange};
pub use hash::ContentHash;
pub use project::{FileEntry, Project, ProjectId};
