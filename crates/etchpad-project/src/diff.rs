//! Snapshot comparison.

use std::collections::{HashMap, HashSet};

use crate::hash::ContentHash;
use crate::project::Project;

/// How one file differs between two project snapshots.
///
/// This is the complete set of change kinds: consumers match exhaustively,
/// and adding a variant is a compile-time event for every consumer rather
/// than a silently ignored case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// The file exists in the newer snapshot only.
    Created {
        /// Name of the created file.
        name: String,
    },
    /// The file exists in the older snapshot only.
    Deleted {
        /// Name of the deleted file.
        name: String,
    },
    /// The file exists in both snapshots with different content.
    Edited {
        /// Name of the edited file.
        name: String,
    },
}

impl FileChange {
    /// The file this change applies to.
    pub fn name(&self) -> &str {
        match self {
            Self::Created { name } | Self::Deleted { name } | Self::Edited { name } => name,
        }
    }
}

/// Compare two snapshots by file name and content identity.
///
/// Produces exactly one change per file whose presence or content differs
/// between `previous` and `current`, and nothing for unchanged files. Only
/// the two endpoints are consulted: a file deleted and recreated between the
/// snapshots comes out as a single [`FileChange::Edited`] (or no change at
/// all, if the content round-tripped).
///
/// Creates and edits are emitted in `current` file order, then deletes in
/// `previous` file order. The same pair of snapshots always yields the same
/// sequence.
pub fn diff(previous: &Project, current: &Project) -> Vec<FileChange> {
    let before: HashMap<&str, ContentHash> = previous
        .files
        .iter()
        .map(|f| (f.name.as_str(), f.hash))
        .collect();
    let after: HashSet<&str> = current.files.iter().map(|f| f.name.as_str()).collect();

    let mut changes = Vec::new();
    for file in &current.files {
        match before.get(file.name.as_str()) {
            None => changes.push(FileChange::Created {
                name: file.name.clone(),
            }),
            Some(hash) if *hash != file.hash => changes.push(FileChange::Edited {
                name: file.name.clone(),
            }),
            Some(_) => {}
        }
    }
    for file in &previous.files {
        if !after.contains(file.name.as_str()) {
            changes.push(FileChange::Deleted {
                name: file.name.clone(),
            });
        }
    }
    changes
}
