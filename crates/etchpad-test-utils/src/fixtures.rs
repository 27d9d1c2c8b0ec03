//! Canned projects for tests.

use std::sync::Arc;

use etchpad_fs::FileSystem;

/// A tiny two-file C++ project.
pub fn sample_files() -> Vec<(String, Vec<u8>)> {
    vec![
        (
            "main.cpp".to_string(),
            b"#include \"util.h\"\n\nint main() {\n    return answer();\n}\n".to_vec(),
        ),
        (
            "util.h".to_string(),
            b"#pragma once\n\nint answer() {\n    return 42;\n}\n".to_vec(),
        ),
    ]
}

/// A file system pre-populated with the given files.
pub async fn populated_fs(files: &[(&str, &str)]) -> Arc<FileSystem> {
    let fs = Arc::new(FileSystem::new());
    for (name, content) in files {
        fs.write(name, content.as_bytes()).await.expect("test write");
    }
    fs
}
