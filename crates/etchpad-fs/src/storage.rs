//! Storage backends for project content.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use etchpad_project::ProjectId;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;

use crate::error::{FsError, FsResult};

/// Project identity persisted alongside file content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMeta {
    /// Stable project identifier.
    pub id: ProjectId,
    /// Optional display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// When the metadata was last written.
    pub saved_at: DateTime<Utc>,
}

/// Where file content actually lives.
///
/// The [`FileSystem`](crate::FileSystem) owns the project snapshot; a
/// backend only holds named byte blobs plus one metadata record. The file
/// system validates names before they reach a backend, so implementations
/// may treat `/`-separated names as safe relative paths.
#[async_trait]
pub trait FsStorage: Send + Sync {
    /// Read a file's content.
    async fn read(&self, name: &str) -> FsResult<Vec<u8>>;

    /// Write a file's content, creating or replacing it.
    async fn write(&self, name: &str, content: &[u8]) -> FsResult<()>;

    /// Remove a file.
    async fn remove(&self, name: &str) -> FsResult<()>;

    /// Move a file to a new name.
    async fn rename(&self, from: &str, to: &str) -> FsResult<()>;

    /// All stored file names, in no particular order.
    async fn list(&self) -> FsResult<Vec<String>>;

    /// Remove every stored file, keeping metadata.
    async fn clear(&self) -> FsResult<()>;

    /// Load the persisted project metadata, if any.
    async fn load_meta(&self) -> FsResult<Option<ProjectMeta>>;

    /// Persist project metadata.
    async fn save_meta(&self, meta: &ProjectMeta) -> FsResult<()>;
}

/// In-memory storage, the default backend.
#[derive(Default)]
pub struct MemoryStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
    meta: RwLock<Option<ProjectMeta>>,
}

impl MemoryStorage {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FsStorage for MemoryStorage {
    async fn read(&self, name: &str) -> FsResult<Vec<u8>> {
        self.files
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| FsError::FileNotFound(name.to_string()))
    }

    async fn write(&self, name: &str, content: &[u8]) -> FsResult<()> {
        self.files
            .write()
            .await
            .insert(name.to_string(), content.to_vec());
        Ok(())
    }

    async fn remove(&self, name: &str) -> FsResult<()> {
        self.files
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| FsError::FileNotFound(name.to_string()))
    }

    async fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        let mut files = self.files.write().await;
        let content = files
            .remove(from)
            .ok_or_else(|| FsError::FileNotFound(from.to_string()))?;
        files.insert(to.to_string(), content);
        Ok(())
    }

    async fn list(&self) -> FsResult<Vec<String>> {
        Ok(self.files.read().await.keys().cloned().collect())
    }

    async fn clear(&self) -> FsResult<()> {
        self.files.write().await.clear();
        Ok(())
    }

    async fn load_meta(&self) -> FsResult<Option<ProjectMeta>> {
        Ok(self.meta.read().await.clone())
    }

    async fn save_meta(&self, meta: &ProjectMeta) -> FsResult<()> {
        *self.meta.write().await = Some(meta.clone());
        Ok(())
    }
}

const META_FILE: &str = "project.json";
const FILES_DIR: &str = "files";

/// Durable storage rooted at a directory on disk.
///
/// Content lives under `<root>/files/`, mirroring the project-relative
/// names; metadata is a JSON document at `<root>/project.json`.
pub struct DiskStorage {
    root: PathBuf,
    files_dir: PathBuf,
}

impl DiskStorage {
    /// Open a disk backend rooted at `root`, creating the directory layout
    /// if it does not exist yet.
    pub async fn new(root: impl Into<PathBuf>) -> FsResult<Self> {
        let root = root.into();
        let files_dir = root.join(FILES_DIR);
        fs::create_dir_all(&files_dir).await?;
        Ok(Self { root, files_dir })
    }

    fn content_path(&self, name: &str) -> PathBuf {
        let mut path = self.files_dir.clone();
        for segment in name.split('/') {
            path.push(segment);
        }
        path
    }

    fn meta_path(&self) -> PathBuf {
        self.root.join(META_FILE)
    }
}

#[async_trait]
impl FsStorage for DiskStorage {
    async fn read(&self, name: &str) -> FsResult<Vec<u8>> {
        match fs::read(self.content_path(name)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FsError::FileNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, name: &str, content: &[u8]) -> FsResult<()> {
        let path = self.content_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, content).await?;
        Ok(())
    }

    async fn remove(&self, name: &str) -> FsResult<()> {
        match fs::remove_file(self.content_path(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FsError::FileNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        let target = self.content_path(to);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        match fs::rename(self.content_path(from), target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FsError::FileNotFound(from.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> FsResult<Vec<String>> {
        let mut names = Vec::new();
        let mut pending = vec![self.files_dir.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if let Ok(rel) = path.strip_prefix(&self.files_dir) {
                    let name = rel
                        .iter()
                        .map(|part| part.to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    async fn clear(&self) -> FsResult<()> {
        fs::remove_dir_all(&self.files_dir).await?;
        fs::create_dir_all(&self.files_dir).await?;
        Ok(())
    }

    async fn load_meta(&self) -> FsResult<Option<ProjectMeta>> {
        match fs::read_to_string(self.meta_path()).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_meta(&self, meta: &ProjectMeta) -> FsResult<()> {
        let json = serde_json::to_string_pretty(meta)?;
        fs::write(self.meta_path(), json).await?;
        Ok(())
    }
}
