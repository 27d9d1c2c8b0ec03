//! Language server document sync for etchpad.
//!
//! This crate keeps a language server's view of an etchpad project in step
//! with the project's file system:
//! - A client seam ([`LanguageClient`]) for whole-text document sync
//! - Deterministic document addressing (file name to `file:///src/` URI)
//! - A tracker that diffs project snapshots and replays the differences as
//!   open/close/change notifications
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  updates  ┌───────────┐  did_open/close/change  ┌─────────────┐
//! │ FileSystem │──────────▶│ FsTracker │────────────────────────▶│ Lang Server │
//! └────────────┘           └───────────┘                         └─────────────┘
//! ```
//!
//! The tracker is a one-way bridge: the client is a sink for notifications,
//! and per-file failures are collected per cycle rather than retried.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use etchpad_fs::FileSystem;
//! use etchpad_lsp::{FsTracker, LanguageClient};
//!
//! # async fn example(client: Arc<dyn LanguageClient>) -> anyhow::Result<()> {
//! let fs = Arc::new(FileSystem::new());
//! fs.initialize().await?;
//!
//! // Follow updates until stopped; existing files are opened immediately.
//! let tracker = FsTracker::start(client, fs.clone()).await;
//!
//! fs.write("main.cpp", b"int main() {}").await?;
//! // ... the client receives a did_open for file:///src/main.cpp ...
//!
//! tracker.stop().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod tracker;

pub use client::{language_id, source_uri, LanguageClient};
pub use error::{LspError, LspResult, SyncFailure};
pub use tracker::{FsTracker, FsTrackerHandle};

// Re-export useful lsp-types
pub use lsp_types::Uri;
