//! Project snapshot model.

use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;

/// Unique identifier for a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl ProjectId {
    /// Generate a new unique project ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One file's identity within a snapshot: its name and content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Project-relative file name, `/`-separated.
    pub name: String,
    /// Hash of the file's content at snapshot time.
    pub hash: ContentHash,
}

impl FileEntry {
    /// Create an entry for the given content.
    pub fn new(name: impl Into<String>, content: &[u8]) -> Self {
        Self {
            name: name.into(),
            hash: ContentHash::of(content),
        }
    }
}

/// A point-in-time view of a project.
///
/// Files form an ordered list and names are unique within a snapshot; a
/// file's identity is its name, never its position. The snapshot is a plain
/// value: cloning it is cheap enough to hand a copy to every observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Stable identifier, preserved across snapshots of the same project.
    pub id: ProjectId,
    /// Optional display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The files present in this snapshot.
    pub files: Vec<FileEntry>,
}

impl Project {
    /// Create an empty project snapshot.
    pub fn new(id: ProjectId) -> Self {
        Self {
            id,
            name: None,
            files: Vec::new(),
        }
    }

    /// Look up a file by name.
    pub fn file(&self, name: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Whether a file with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.file(name).is_some()
    }

    /// File names in snapshot order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.name.as_str())
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the snapshot holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// A copy of this snapshot with the file list emptied.
    ///
    /// Diffing against the result treats every current file as newly
    /// created, which is how a fresh observer bootstraps its view.
    pub fn without_files(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            files: Vec::new(),
        }
    }
}
