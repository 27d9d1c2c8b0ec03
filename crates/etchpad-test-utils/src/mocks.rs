//! Recording and fault-injecting doubles.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use etchpad_fs::{FsError, FsResult, FsStorage, MemoryStorage, ProjectMeta};
use etchpad_lsp::{source_uri, LanguageClient, LspError, LspResult, Uri};

/// One recorded client notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCall {
    /// `did_open` with the document's URI, language id, and full text.
    Open {
        uri: String,
        language_id: String,
        text: String,
    },
    /// `did_close` with the document's URI.
    Close { uri: String },
    /// `did_change` with the document's URI and full replacement text.
    Change { uri: String, text: String },
}

/// A language client that records every notification it receives.
///
/// Individual documents can be told to reject notifications, which is how
/// tests exercise per-file failure handling. Rejected notifications are not
/// recorded.
#[derive(Clone, Default)]
pub struct RecordingClient {
    calls: Arc<Mutex<Vec<ClientCall>>>,
    rejected: Arc<Mutex<HashSet<String>>>,
}

impl RecordingClient {
    /// Create a client that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every notification for the given file from now on.
    pub fn reject_document(&self, name: &str) {
        let uri = source_uri(name).expect("valid test file name");
        self.rejected
            .lock()
            .unwrap()
            .insert(uri.as_str().to_string());
    }

    /// Accept notifications for the given file again.
    pub fn accept_document(&self, name: &str) {
        let uri = source_uri(name).expect("valid test file name");
        self.rejected.lock().unwrap().remove(uri.as_str());
    }

    /// Everything recorded so far, in call order.
    pub fn calls(&self) -> Vec<ClientCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Wait until at least `count` calls have been recorded.
    ///
    /// Returns `false` if the count was not reached within `timeout`.
    pub async fn wait_for_calls(&self, count: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            while self.call_count() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .is_ok()
    }

    fn check(&self, uri: &Uri) -> LspResult<()> {
        if self.rejected.lock().unwrap().contains(uri.as_str()) {
            return Err(LspError::client_rejected(format!(
                "document rejected: {}",
                uri.as_str()
            )));
        }
        Ok(())
    }

    fn record(&self, call: ClientCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl LanguageClient for RecordingClient {
    async fn did_open(&self, uri: Uri, language_id: &str, text: String) -> LspResult<()> {
        self.check(&uri)?;
        self.record(ClientCall::Open {
            uri: uri.as_str().to_string(),
            language_id: language_id.to_string(),
            text,
        });
        Ok(())
    }

    async fn did_close(&self, uri: Uri) -> LspResult<()> {
        self.check(&uri)?;
        self.record(ClientCall::Close {
            uri: uri.as_str().to_string(),
        });
        Ok(())
    }

    async fn did_change(&self, uri: Uri, text: String) -> LspResult<()> {
        self.check(&uri)?;
        self.record(ClientCall::Change {
            uri: uri.as_str().to_string(),
            text,
        });
        Ok(())
    }
}

/// Storage that can be told to fail reads for particular files.
///
/// Wraps [`MemoryStorage`] and injects an error on `read` for any name in
/// the failing set; everything else passes straight through.
#[derive(Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    failing_reads: Mutex<HashSet<String>>,
}

impl FlakyStorage {
    /// Create an empty, fully healthy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail reads for `name` until healed.
    pub fn fail_reads_for(&self, name: &str) {
        self.failing_reads.lock().unwrap().insert(name.to_string());
    }

    /// Let reads for `name` succeed again.
    pub fn heal(&self, name: &str) {
        self.failing_reads.lock().unwrap().remove(name);
    }
}

#[async_trait]
impl FsStorage for FlakyStorage {
    async fn read(&self, name: &str) -> FsResult<Vec<u8>> {
        if self.failing_reads.lock().unwrap().contains(name) {
            return Err(FsError::storage(format!("injected read failure: {name}")));
        }
        self.inner.read(name).await
    }

    async fn write(&self, name: &str, content: &[u8]) -> FsResult<()> {
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
