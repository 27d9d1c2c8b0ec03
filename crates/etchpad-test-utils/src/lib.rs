//! Testing utilities, fixtures, and mocks for etchpad.
//!
//! This crate provides the shared test infrastructure used across the
//! workspace:
//!
//! - **Mocks**: a recording [`LanguageClient`](etchpad_lsp::LanguageClient)
//!   and a fault-injecting storage backend
//! - **Fixtures**: canned file sets and pre-populated file systems
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use etchpad_test_utils::{populated_fs, RecordingClient};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let fs = populated_fs(&[("main.cpp", "int main() {}")]).await;
//!     let client = std::sync::Arc::new(RecordingClient::new());
//!     // drive the code under test, then inspect client.calls()
//! }
//! ```

pub mod fixtures;
pub mod mocks;

pub use fixtures::{populated_fs, sample_files};
pub use mocks::{ClientCall, FlakyStorage, RecordingClient};
