//! Mirrors file system changes into a language client.

use std::sync::Arc;

use etchpad_fs::{FileSystem, ProjectUpdated};
use etchpad_project::{diff, FileChange, Project};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::{language_id, source_uri, LanguageClient};
use crate::error::{LspError, LspResult, SyncFailure};

/// Keeps a language client's documents in step with the file system.
///
/// The tracker holds a reference snapshot, the last project state it pushed
/// toward the client. Each sync cycle diffs the reference against the
/// current snapshot, commits the current snapshot as the new reference, and
/// then replays the changes: created files are opened, deleted files are
/// closed, and edited files are re-sent in full.
///
/// The reference is committed before the replay runs. A file whose replay
/// fails is therefore not picked up again by a later cycle unless the file
/// changes again; [`sync_once`](Self::sync_once) surfaces such failures to
/// the caller instead of retrying them.
pub struct FsTracker {
    client: Arc<dyn LanguageClient>,
    fs: Arc<FileSystem>,
    reference: Project,
}

impl FsTracker {
    /// Create a tracker whose client has seen none of the project yet.
    ///
    /// The reference starts as the current snapshot with its file list
    /// emptied, so the first cycle opens every existing file.
    pub async fn new(client: Arc<dyn LanguageClient>, fs: Arc<FileSystem>) -> Self {
        let reference = fs.project().await.without_files();
        Self {
            client,
            fs,
            reference,
        }
    }

    /// Run one sync cycle against the current project snapshot.
    pub async fn sync_once(&mut self) -> LspResult<()> {
        let current = self.fs.project().await;
        self.sync_to(current).await
    }

    async fn sync_to(&mut self, current: Project) -> LspResult<()> {
        let changes = diff(&self.reference, &current);
        self.reference = current;
        if changes.is_empty() {
            return Ok(());
        }
        debug!(changes = changes.len(), "replaying project changes");

        // One failed file never blocks the rest of the pass.
        let mut failures = Vec::new();
        for change in changes {
            if let Err(error) = self.replay(&change).await {
                warn!(file = %change.name(), error = %error, "document update failed");
                failures.push(SyncFailure {
                    name: change.name().to_string(),
                    error,
                });
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(LspError::Cycle { failures })
        }
    }

    async fn replay(&self, change: &FileChange) -> LspResult<()> {
        match change {
            FileChange::Created { name } => {
                let text = self.document_text(name).await?;
                self.client
                    .did_open(source_uri(name)?, language_id(name), text)
                    .await
            }
            FileChange::Deleted { name } => self.client.did_close(source_uri(name)?).await,
            FileChange::Edited { name } => {
                let text = self.document_text(name).await?;
                self.client.did_change(source_uri(name)?, text).await
            }
        }
    }

    async fn document_text(&self, name: &str) -> LspResult<String> {
        let content = self
            .fs
            .read(name)
            .await
            .map_err(|source| LspError::DocumentRead {
                name: name.to_string(),
                source,
            })?;
        Ok(String::from_utf8_lossy(&content).into_owned())
    }

    /// Start a tracker that follows file system updates until stopped.
    ///
    /// Subscribes and runs one cycle for the state the project is already
    /// in before returning, so no update can slip between the first cycle
    /// and the event loop. The spawned task then runs one cycle per update,
    /// in update order. A failed cycle is logged and the loop keeps going.
    pub async fn start(client: Arc<dyn LanguageClient>, fs: Arc<FileSystem>) -> FsTrackerHandle {
        let updates = fs.subscribe();
        let mut tracker = FsTracker::new(client, fs).await;
        if let Err(error) = tracker.sync_once().await {
            warn!(error = %error, "initial sync incomplete");
        }
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            tracker.run(updates, shutdown_rx).await;
            debug!("tracker stopped");
        });
        FsTrackerHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    async fn run(
        mut self,
        mut updates: broadcast::Receiver<ProjectUpdated>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                update = updates.recv() => match update {
                    Ok(event) => {
                        if let Err(error) = self.sync_to(event.project).await {
                            warn!(error = %error, "sync cycle incomplete");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Safe to drop intermediates: the next cycle diffs
                        // against whatever snapshot it receives.
                        debug!(skipped, "update stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    }
}

/// Handle to a running tracker task.
///
/// Dropping the handle stops the tracker without waiting for it.
pub struct FsTrackerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl FsTrackerHandle {
    /// Stop the tracker and wait for it to finish.
    ///
    /// An in-flight cycle runs to completion first. Documents the client
    /// already has open stay open; there is no close-on-teardown.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for FsTrackerHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}
