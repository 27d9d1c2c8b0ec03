//! The language client seam and document addressing.

use std::path::Path;

use async_trait::async_trait;
use lsp_types::Uri;

use crate::error::{LspError, LspResult};

/// URI prefix under which project files are exposed to the client.
const SOURCE_ROOT: &str = "file:///src/";

/// The document notifications a language client consumes.
///
/// Documents sync whole-text: an edit arrives as one full replacement, never
/// as a list of ranges. Implementations own the remaining protocol concerns,
/// document version numbering included. Every method may fail; the caller
/// decides what a failure means for the rest of its batch.
#[async_trait]
pub trait LanguageClient: Send + Sync {
    /// A document came into existence with the given content.
    async fn did_open(&self, uri: Uri, language_id: &str, text: String) -> LspResult<()>;

    /// A document ceased to exist.
    async fn did_close(&self, uri: Uri) -> LspResult<()>;

    /// A document's full text was replaced.
    async fn did_change(&self, uri: Uri, text: String) -> LspResult<()>;
}

/// Derive the document URI for a project file name.
///
/// The mapping is pure: the same name always yields the same URI, and
/// distinct names never collide. File names are restricted to a portable
/// charset, so the name embeds into the URI without escaping.
pub fn source_uri(name: &str) -> LspResult<Uri> {
    format!("{SOURCE_ROOT}{name}")
        .parse()
        .map_err(|e| LspError::invalid_uri(name, format!("{e}")))
}

/// Map a file name to an LSP language identifier.
pub fn language_id(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    match ext {
        "c" | "h" => "c",
        "cpp" | "hpp" | "cc" | "cxx" => "cpp",
        "rs" => "rust",
        "py" => "python",
        "ts" => "typescript",
        "js" => "javascript",
        "json" => "json",
        "md" => "markdown",
        _ => "plaintext",
    }
}
