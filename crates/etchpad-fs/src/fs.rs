//! The virtual project file system.

use std::sync::Arc;

use chrono::Utc;
use etchpad_project::{ContentHash, FileEntry, Project, ProjectId};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::error::{FsError, FsResult};
use crate::storage::{FsStorage, MemoryStorage, ProjectMeta};

/// Capacity of the update broadcast channel.
const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Name of the file seeded into an empty project.
pub const DEFAULT_FILE: &str = "main.cpp";

/// Content seeded into an empty project.
pub const DEFAULT_PROGRAM: &[u8] =
    b"#include <iostream>\n\nint main() {\n    std::cout << \"hello, world\\n\";\n}\n";

/// Broadcast whenever the project snapshot changes.
#[derive(Debug, Clone)]
pub struct ProjectUpdated {
    /// The snapshot after the mutation.
    pub project: Project,
}

struct State {
    project: Project,
}

/// An editor project: an ordered set of named files over a storage backend.
///
/// The file system owns the current [`Project`] snapshot and delegates
/// content to its [`FsStorage`] backend. Every mutation broadcasts
/// [`ProjectUpdated`] carrying the new snapshot, whether or not the bytes
/// actually changed; observers that only care about real changes diff the
/// snapshots they receive.
pub struct FileSystem {
    storage: Arc<dyn FsStorage>,
    state: RwLock<State>,
    updates: broadcast::Sender<ProjectUpdated>,
}

impl FileSystem {
    /// Create a file system over fresh in-memory storage.
    pub fn new() -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()))
    }

    /// Create a file system over the given backend.
    ///
    /// The snapshot starts empty; call [`initialize`](Self::initialize) to
    /// load whatever the backend already holds.
    pub fn with_storage(storage: Arc<dyn FsStorage>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            storage,
            state: RwLock::new(State {
                project: Project::new(ProjectId::new()),
            }),
            updates,
        }
    }

    /// Load project state from storage, seeding a default program into an
    /// empty backend.
    ///
    /// Restores the persisted project identity when the backend has one,
    /// rebuilds the file list in name order, and broadcasts the resulting
    /// snapshot.
    pub async fn initialize(&self) -> FsResult<()> {
        let mut state = self.state.write().await;
        if let Some(meta) = self.storage.load_meta().await? {
            state.project.id = meta.id;
            state.project.name = meta.name;
        }
        let mut names = self.storage.list().await?;
        names.sort();
        if names.is_empty() {
            self.storage.write(DEFAULT_FILE, DEFAULT_PROGRAM).await?;
            self.storage
                .save_meta(&ProjectMeta {
                    id: state.project.id.clone(),
                    name: state.project.name.clone(),
                    saved_at: Utc::now(),
                })
                .await?;
            names.push(DEFAULT_FILE.to_string());
        }
        let mut files = Vec::with_capacity(names.len());
        for name in names {
            let content = self.storage.read(&name).await?;
            let hash = ContentHash::of(&content);
            files.push(FileEntry { name, hash });
        }
        debug!(files = files.len(), "project initialized");
        state.project.files = files;
        self.notify(&state.project);
        Ok(())
    }

    /// The current snapshot.
    pub async fn project(&self) -> Project {
        self.state.read().await.project.clone()
    }

    /// Read a file's content.
    pub async fn read(&self, name: &str) -> FsResult<Vec<u8>> {
        self.storage.read(name).await
    }

    /// Create or replace a file.
    pub async fn write(&self, name: &str, content: &[u8]) -> FsResult<()> {
        validate_name(name)?;
        let mut state = self.state.write().await;
        self.storage.write(name, content).await?;
        let hash = ContentHash::of(content);
        match state.project.files.iter_mut().find(|f| f.name == name) {
            Some(entry) => entry.hash = hash,
            None => state.project.files.push(FileEntry {
                name: name.to_string(),
                hash,
            }),
        }
        debug!(file = %name, "file written");
        self.notify(&state.project);
        Ok(())
    }

    /// Delete a file.
    pub async fn remove(&self, name: &str) -> FsResult<()> {
        let mut state = self.state.write().await;
        if !state.project.contains(name) {
            return Err(FsError::FileNotFound(name.to_string()));
        }
        self.storage.remove(name).await?;
        state.project.files.retain(|f| f.name != name);
        debug!(file = %name, "file removed");
        self.notify(&state.project);
        Ok(())
    }

    /// Rename a file, keeping its content.
    pub async fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        validate_name(to)?;
        let mut state = self.state.write().await;
        let hash = match state.project.file(from) {
            Some(entry) => entry.hash,
            None => return Err(FsError::FileNotFound(from.to_string())),
        };
        if state.project.contains(to) {
            return Err(FsError::FileExists(to.to_string()));
        }
        self.storage.rename(from, to).await?;
        state.project.files.retain(|f| f.name != from);
        state.project.files.push(FileEntry {
            name: to.to_string(),
            hash,
        });
        debug!(from = %from, to = %to, "file renamed");
        self.notify(&state.project);
        Ok(())
    }

    /// Replace the whole project with a new set of files in one step.
    ///
    /// Observers see a single snapshot change covering the entire swap. If
    /// the backend fails partway through, the snapshot is reconciled to the
    /// files the backend still holds and the reconciliation is broadcast
    /// before the error propagates; the project never keeps listing content
    /// that is gone.
    pub async fn replace_with_files(&self, files: Vec<(String, Vec<u8>)>) -> FsResult<()> {
        let mut entries: Vec<FileEntry> = Vec::with_capacity(files.len());
        for (name, content) in &files {
            validate_name(name)?;
            if entries.iter().any(|e| e.name == *name) {
                return Err(FsError::FileExists(name.clone()));
            }
            entries.push(FileEntry {
                name: name.clone(),
                hash: ContentHash::of(content),
            });
        }
        let mut state = self.state.write().await;
        if let Err(error) = self.storage.clear().await {
            // The old content cannot be vouched for anymore.
            state.project.files.clear();
            self.notify(&state.project);
            return Err(error);
        }
        let mut swapped: Vec<FileEntry> = Vec::with_capacity(entries.len());
        for ((name, content), entry) in files.iter().zip(entries) {
            if let Err(error) = self.storage.write(name, content).await {
                state.project.files = swapped;
                self.notify(&state.project);
                return Err(error);
            }
            swapped.push(entry);
        }
        debug!(files = swapped.len(), "project replaced");
        state.project.files = swapped;
        self.notify(&state.project);
        Ok(())
    }

    /// Set the project display name.
    pub async fn set_name(&self, name: impl Into<String>) -> FsResult<()> {
        let mut state = self.state.write().await;
        state.project.name = Some(name.into());
        self.storage
            .save_meta(&ProjectMeta {
                id: state.project.id.clone(),
                name: state.project.name.clone(),
                saved_at: Utc::now(),
            })
            .await?;
        self.notify(&state.project);
        Ok(())
    }

    /// Subscribe to snapshot updates.
    ///
    /// Each mutation delivers one [`ProjectUpdated`] carrying the snapshot
    /// it produced, in mutation order.
    pub fn subscribe(&self) -> broadcast::Receiver<ProjectUpdated> {
        self.updates.subscribe()
    }

    // Called with the state lock held so receivers observe snapshots in
    // mutation order.
    fn notify(&self, project: &Project) {
        let _ = self.updates.send(ProjectUpdated {
            project: project.clone(),
        });
    }
}

impl Default for FileSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_name(name: &str) -> FsResult<()> {
    if name.is_empty() {
        return Err(FsError::invalid_name(name, "name is empty"));
    }
    for segment in name.split('/') {
        if segment.is_empty() {
            return Err(FsError::invalid_name(name, "empty path segment"));
        }
        if segment == "." || segment == ".." {
            return Err(FsError::invalid_name(name, "relative path segment"));
        }
        if !segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
        {
            return Err(FsError::invalid_name(name, "unsupported character"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DiskStorage;
    use async_trait::async_trait;
    use tempfile::TempDir;
    use tokio::sync::broadcast::error::TryRecvError;

    struct WriteDeniedStorage {
        inner: MemoryStorage,
        denied: &'static str,
    }

    #[async_trait]
    impl FsStorage for WriteDeniedStorage {
        async fn read(&self, name: &str) -> FsResult<Vec<u8>> {
            self.inner.read(name).await
        }

        async fn write(&self, name: &str, content: &[u8]) -> FsResult<()> {
            if name == self.denied {
                return Err(FsError::storage(format!("write denied: {name}")));
            }
            self.inner.write(name, content).await
        }

        async fn remove(&self, name: &str) -> FsResult<()> {
            self.inner.remove(name).await
        }

        async fn rename(&self, from: &str, to: &str) -> FsResult<()> {
            self.inner.rename(from, to).await
        }

        async fn list(&self) -> FsResult<Vec<String>> {
            self.inner.list().await
        }

        async fn clear(&self) -> FsResult<()> {
            self.inner.clear().await
        }

        async fn load_meta(&self) -> FsResult<Option<ProjectMeta>> {
            self.inner.load_meta().await
        }

        async fn save_meta(&self, meta: &ProjectMeta) -> FsResult<()> {
            self.inner.save_meta(meta).await
        }
    }

    #[tokio::test]
    async fn test_write_creates_entry() {
        let fs = FileSystem::new();
        fs.write("main.cpp", b"int main() {}").await.unwrap();

        let project = fs.project().await;
        assert!(project.contains("main.cpp"));
        assert_eq!(fs.read("main.cpp").await.unwrap(), b"int main() {}");
    }

    #[tokio::test]
    async fn test_write_replaces_content() {
        let fs = FileSystem::new();
        fs.write("main.cpp", b"x = 1").await.unwrap();
        let before = fs.project().await.file("main.cpp").unwrap().hash;

        fs.write("main.cpp", b"x = 2").await.unwrap();
        let project = fs.project().await;
        assert_eq!(project.len(), 1);
        assert_ne!(project.file("main.cpp").unwrap().hash, before);
    }

    #[tokio::test]
    async fn test_edit_keeps_file_position() {
        let fs = FileSystem::new();
        fs.write("a.cpp", b"a").await.unwrap();
        fs.write("b.cpp", b"b").await.unwrap();
        fs.write("c.cpp", b"c").await.unwrap();

        fs.write("b.cpp", b"b2").await.unwrap();
        let project = fs.project().await;
        let names: Vec<&str> = project.file_names().collect();
        assert_eq!(names, vec!["a.cpp", "b.cpp", "c.cpp"]);
    }

    #[tokio::test]
    async fn test_remove_missing_file_fails() {
        let fs = FileSystem::new();
        let err = fs.remove("missing.cpp").await.unwrap_err();
        assert!(matches!(err, FsError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_rename_moves_content() {
        let fs = FileSystem::new();
        fs.write("old.cpp", b"content").await.unwrap();
        fs.rename("old.cpp", "new.cpp").await.unwrap();

        let project = fs.project().await;
        assert!(!project.contains("old.cpp"));
        assert!(project.contains("new.cpp"));
        assert_eq!(fs.read("new.cpp").await.unwrap(), b"content");
        assert!(matches!(
            fs.read("old.cpp").await.unwrap_err(),
            FsError::FileNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_rename_to_existing_name_fails() {
        let fs = FileSystem::new();
        fs.write("a.cpp", b"a").await.unwrap();
        fs.write("b.cpp", b"b").await.unwrap();
        let err = fs.rename("a.cpp", "b.cpp").await.unwrap_err();
        assert!(matches!(err, FsError::FileExists(_)));
    }

    #[tokio::test]
    async fn test_invalid_names_rejected() {
        let fs = FileSystem::new();
        let names = [
            "",
            "/main.cpp",
            "main.cpp/",
            "a//b.cpp",
            "..",
            "a/../b.cpp",
            "bad\\name",
            "has space.cpp",
        ];
        for name in names {
            let err = fs.write(name, b"x").await.unwrap_err();
            assert!(
                matches!(err, FsError::InvalidName { .. }),
                "{name:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_nested_names_accepted() {
        let fs = FileSystem::new();
        fs.write("include/nrf52/board.h", b"#pragma once").await.unwrap();
        assert!(fs.project().await.contains("include/nrf52/board.h"));
    }

    #[tokio::test]
    async fn test_every_mutation_broadcasts() {
        let fs = FileSystem::new();
        let mut updates = fs.subscribe();

        fs.write("main.cpp", b"same").await.unwrap();
        fs.write("main.cpp", b"same").await.unwrap();

        let first = updates.recv().await.unwrap();
        let second = updates.recv().await.unwrap();
        // Content did not change, but the update still fired.
        assert_eq!(first.project, second.project);
        assert!(matches!(updates.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_updates_carry_snapshots_in_mutation_order() {
        let fs = FileSystem::new();
        let mut updates = fs.subscribe();

        fs.write("a.cpp", b"a").await.unwrap();
        fs.write("b.cpp", b"b").await.unwrap();
        fs.remove("a.cpp").await.unwrap();

        let names = |p: &Project| p.file_names().map(String::from).collect::<Vec<_>>();
        assert_eq!(names(&updates.recv().await.unwrap().project), ["a.cpp"]);
        assert_eq!(names(&updates.recv().await.unwrap().project), ["a.cpp", "b.cpp"]);
        assert_eq!(names(&updates.recv().await.unwrap().project), ["b.cpp"]);
    }

    #[tokio::test]
    async fn test_initialize_seeds_default_program() {
        let fs = FileSystem::new();
        let mut updates = fs.subscribe();
        fs.initialize().await.unwrap();

        let project = fs.project().await;
        assert_eq!(project.len(), 1);
        assert!(project.contains(DEFAULT_FILE));
        assert_eq!(fs.read(DEFAULT_FILE).await.unwrap(), DEFAULT_PROGRAM);
        assert!(updates.recv().await.unwrap().project.contains(DEFAULT_FILE));
    }

    #[tokio::test]
    async fn test_initialize_restores_persisted_project() {
        let dir = TempDir::new().unwrap();
        let original_id = {
            let storage = Arc::new(DiskStorage::new(dir.path()).await.unwrap());
            let fs = FileSystem::with_storage(storage);
            fs.write("b.cpp", b"b").await.unwrap();
            fs.write("a.cpp", b"a").await.unwrap();
            fs.set_name("blinky").await.unwrap();
            fs.project().await.id
        };

        let storage = Arc::new(DiskStorage::new(dir.path()).await.unwrap());
        let fs = FileSystem::with_storage(storage);
        fs.initialize().await.unwrap();

        let project = fs.project().await;
        assert_eq!(project.id, original_id);
        assert_eq!(project.name.as_deref(), Some("blinky"));
        let names: Vec<&str> = project.file_names().collect();
        assert_eq!(names, vec!["a.cpp", "b.cpp"]);
    }

    #[tokio::test]
    async fn test_replace_with_files_swaps_everything() {
        let fs = FileSystem::new();
        fs.write("old1.cpp", b"1").await.unwrap();
        fs.write("old2.cpp", b"2").await.unwrap();
        let mut updates = fs.subscribe();

        fs.replace_with_files(vec![
            ("main.cpp".to_string(), b"new main".to_vec()),
            ("util.h".to_string(), b"new util".to_vec()),
        ])
        .await
        .unwrap();

        let update = updates.recv().await.unwrap();
        let names: Vec<&str> = update.project.file_names().collect();
        assert_eq!(names, vec!["main.cpp", "util.h"]);
        // The swap produced exactly one update.
        assert!(matches!(updates.try_recv(), Err(TryRecvError::Empty)));
        assert!(fs.read("old1.cpp").await.is_err());
        assert_eq!(fs.read("util.h").await.unwrap(), b"new util");
    }

    #[tokio::test]
    async fn test_replace_rejects_duplicate_names() {
        let fs = FileSystem::new();
        let err = fs
            .replace_with_files(vec![
                ("main.cpp".to_string(), b"1".to_vec()),
                ("main.cpp".to_string(), b"2".to_vec()),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::FileExists(_)));
    }

    #[tokio::test]
    async fn test_failed_replace_reconciles_the_snapshot() {
        let storage = Arc::new(WriteDeniedStorage {
            inner: MemoryStorage::new(),
            denied: "bad.cpp",
        });
        let fs = FileSystem::with_storage(storage);
        fs.write("old.cpp", b"old").await.unwrap();
        let mut updates = fs.subscribe();

        let err = fs
            .replace_with_files(vec![
                ("good.cpp".to_string(), b"good".to_vec()),
                ("bad.cpp".to_string(), b"bad".to_vec()),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::Storage(_)));

        // The snapshot lists only what the backend still holds, and the
        // reconciliation went out to observers.
        let project = fs.project().await;
        let names: Vec<&str> = project.file_names().collect();
        assert_eq!(names, vec!["good.cpp"]);
        assert!(fs.read("old.cpp").await.is_err());
        assert_eq!(fs.read("good.cpp").await.unwrap(), b"good");

        let update = updates.recv().await.unwrap();
        assert!(!update.project.contains("old.cpp"));
        assert!(matches!(updates.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_set_name_broadcasts() {
        let fs = FileSystem::new();
        let mut updates = fs.subscribe();
        fs.set_name("blinky").await.unwrap();

        let update = updates.recv().await.unwrap();
        assert_eq!(update.project.name.as_deref(), Some("blinky"));
    }
}
